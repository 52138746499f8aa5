use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::config::AuthSettings;
use crate::error::ApiError;
use crate::middleware::auth::{Claims, TokenType};
use crate::models::account::Account;

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn claims_for(account: &Account, token_type: TokenType, ttl: Duration) -> Claims {
    let now = Utc::now();
    Claims {
        sub: account.id.clone(),
        username: account.username.clone(),
        email: account.email.clone(),
        role: account.role,
        is_verified: account.is_verified,
        is_approved: account.is_approved,
        token_type,
        jti: uuid::Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
    }
}

pub fn encode_claims(claims: &Claims, settings: &AuthSettings) -> Result<String, ApiError> {
    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token generation failed: {}", e)))
}

pub fn issue_access_token(account: &Account, settings: &AuthSettings) -> Result<String, ApiError> {
    let claims = claims_for(
        account,
        TokenType::Access,
        Duration::minutes(settings.access_ttl_minutes),
    );
    encode_claims(&claims, settings)
}

pub fn issue_token_pair(account: &Account, settings: &AuthSettings) -> Result<TokenPair, ApiError> {
    let refresh = claims_for(
        account,
        TokenType::Refresh,
        Duration::days(settings.refresh_ttl_days),
    );
    Ok(TokenPair {
        access: issue_access_token(account, settings)?,
        refresh: encode_claims(&refresh, settings)?,
    })
}

/// Verifies signature and expiry, and that the token is of the expected kind.
pub fn decode_token(
    token: &str,
    settings: &AuthSettings,
    expected: TokenType,
) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        log::debug!("Token rejected: {}", e);
        ApiError::Authentication("Token is invalid or expired".to_string())
    })?;

    if data.claims.token_type != expected {
        return Err(ApiError::Authentication(
            "Token has wrong type".to_string(),
        ));
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::UserRole;

    fn settings() -> AuthSettings {
        AuthSettings::new("test-secret")
    }

    fn account() -> Account {
        Account::new(
            "jane".into(),
            "jane@example.com".into(),
            "hash".into(),
            UserRole::Agency,
        )
    }

    #[test]
    fn access_token_carries_role_and_flags() {
        let account = account();
        let pair = issue_token_pair(&account, &settings()).unwrap();
        let claims = decode_token(&pair.access, &settings(), TokenType::Access).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.role, UserRole::Agency);
        assert_eq!(claims.username, "jane");
        assert!(!claims.is_approved);
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let pair = issue_token_pair(&account(), &settings()).unwrap();
        assert!(decode_token(&pair.refresh, &settings(), TokenType::Access).is_err());
        assert!(decode_token(&pair.access, &settings(), TokenType::Refresh).is_err());
        assert!(decode_token(&pair.refresh, &settings(), TokenType::Refresh).is_ok());
    }

    #[test]
    fn every_token_gets_its_own_id() {
        let pair = issue_token_pair(&account(), &settings()).unwrap();
        let access = decode_token(&pair.access, &settings(), TokenType::Access).unwrap();
        let refresh = decode_token(&pair.refresh, &settings(), TokenType::Refresh).unwrap();
        assert!(!refresh.jti.is_empty());
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let pair = issue_token_pair(&account(), &settings()).unwrap();
        let other = AuthSettings::new("another-secret");
        assert!(decode_token(&pair.access, &other, TokenType::Access).is_err());

        let mut expired = claims_for(&account(), TokenType::Access, Duration::minutes(5));
        expired.iat -= 7200;
        expired.exp -= 7200;
        let token = encode_claims(&expired, &settings()).unwrap();
        let err = decode_token(&token, &settings(), TokenType::Access).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }
}
