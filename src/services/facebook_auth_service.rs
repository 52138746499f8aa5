use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;

use crate::config::SocialSettings;
use crate::error::ApiError;
use crate::models::account::{AuthProvider, SocialIdentity};
use crate::models::facebook_auth::{FacebookDebugToken, FacebookUserInfo};

const GRAPH_URL: &str = "https://graph.facebook.com/v18.0";

fn invalid_token() -> ApiError {
    ApiError::Authentication("Invalid Facebook token".to_string())
}

/// The token must be valid and minted for our app.
pub fn check_debug_token(debug: &FacebookDebugToken, app_id: &str) -> Result<(), ApiError> {
    if !debug.data.is_valid {
        return Err(invalid_token());
    }
    if debug.data.app_id.as_deref() != Some(app_id) {
        return Err(ApiError::Authentication(
            "Facebook token was issued for another app".to_string(),
        ));
    }
    Ok(())
}

pub fn identity_from_user_info(user: FacebookUserInfo) -> Result<SocialIdentity, ApiError> {
    let avatar_url = user.picture_url().map(str::to_string);
    let email = user
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| ApiError::Authentication("Facebook account has no email".to_string()))?;

    Ok(SocialIdentity {
        provider: AuthProvider::Facebook,
        subject: user.id,
        email,
        first_name: user.first_name,
        last_name: user.last_name,
        display_name: user.name,
        avatar_url,
    })
}

async fn graph_get<T: DeserializeOwned>(
    http: &ReqwestClient,
    path: &str,
    query: &[(&str, &str)],
) -> Result<T, ApiError> {
    let response = http
        .get(format!("{}/{}", GRAPH_URL, path))
        .query(query)
        .send()
        .await
        .map_err(|e| {
            log::error!("Facebook Graph request failed: {}", e);
            ApiError::Upstream("Facebook is unreachable".to_string())
        })?;

    if !response.status().is_success() {
        log::warn!("Facebook {} returned status {}", path, response.status());
        return Err(invalid_token());
    }

    response.json::<T>().await.map_err(|e| {
        log::warn!("Malformed Facebook {} payload: {}", path, e);
        invalid_token()
    })
}

// Validate the user access token, then fetch the profile it grants
pub async fn verify_facebook_token(
    http: &ReqwestClient,
    social: &SocialSettings,
    access_token: &str,
) -> Result<SocialIdentity, ApiError> {
    let (app_id, app_secret) = match (&social.facebook_app_id, &social.facebook_app_secret) {
        (Some(id), Some(secret)) => (id.as_str(), secret.as_str()),
        _ => {
            return Err(ApiError::Authentication(
                "Facebook login is not configured".to_string(),
            ))
        }
    };

    let app_token = format!("{}|{}", app_id, app_secret);
    let debug: FacebookDebugToken = graph_get(
        http,
        "debug_token",
        &[("input_token", access_token), ("access_token", app_token.as_str())],
    )
    .await?;
    check_debug_token(&debug, app_id)?;

    let user: FacebookUserInfo = graph_get(
        http,
        "me",
        &[
            ("fields", "id,email,name,first_name,last_name,picture.type(large)"),
            ("access_token", access_token),
        ],
    )
    .await?;

    identity_from_user_info(user)
}
