use reqwest::Client as ReqwestClient;

use crate::config::SocialSettings;
use crate::error::ApiError;
use crate::models::account::{AuthProvider, SocialIdentity};
use crate::models::google_auth::{GoogleTokenInfo, GOOGLE_ISSUERS};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Checks audience and issuer, then maps the claims to an identity.
pub fn identity_from_token_info(
    info: GoogleTokenInfo,
    client_id: &str,
) -> Result<SocialIdentity, ApiError> {
    if info.aud != client_id {
        return Err(ApiError::Authentication(
            "Google token was issued for another client".to_string(),
        ));
    }
    if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
        return Err(ApiError::Authentication(
            "Google token has an unexpected issuer".to_string(),
        ));
    }
    let email = info
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| ApiError::Authentication("Google account has no email".to_string()))?;

    Ok(SocialIdentity {
        provider: AuthProvider::Google,
        subject: info.sub,
        email,
        first_name: info.given_name,
        last_name: info.family_name,
        display_name: info.name,
        avatar_url: info.picture,
    })
}

// Verify an ID token with Google's tokeninfo endpoint
pub async fn verify_google_token(
    http: &ReqwestClient,
    social: &SocialSettings,
    id_token: &str,
) -> Result<SocialIdentity, ApiError> {
    let client_id = social
        .google_client_id
        .as_deref()
        .ok_or_else(|| ApiError::Authentication("Google login is not configured".to_string()))?;

    let response = http
        .get(TOKENINFO_URL)
        .query(&[("id_token", id_token)])
        .send()
        .await
        .map_err(|e| {
            log::error!("Google tokeninfo request failed: {}", e);
            ApiError::Upstream("Google is unreachable".to_string())
        })?;

    if !response.status().is_success() {
        log::warn!("Google rejected ID token with status {}", response.status());
        return Err(ApiError::Authentication("Invalid Google token".to_string()));
    }

    let info = response.json::<GoogleTokenInfo>().await.map_err(|e| {
        log::warn!("Malformed tokeninfo payload: {}", e);
        ApiError::Authentication("Invalid Google token".to_string())
    })?;

    identity_from_token_info(info, client_id)
}
