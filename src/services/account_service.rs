use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{AdminBootstrap, AuthSettings};
use crate::db::store::{Store, StoreError};
use crate::error::{ApiError, FieldErrors};
use crate::middleware::auth::TokenType;
use crate::models::account::{
    Account, AccountView, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
    UserRole,
};
use crate::models::profile::{AgencyProfile, GuideProfile, RoleProfile, TouristProfile};
use crate::services::token_service::{self, TokenPair};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: AccountView,
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
}

impl AuthResponse {
    pub fn new(account: &Account, tokens: TokenPair, message: &str) -> Self {
        Self {
            user: AccountView::from(account),
            tokens,
            message: message.to_string(),
            created: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: AccountView,
    pub profile: Option<RoleProfile>,
}

pub fn is_valid_email(email: &str) -> bool {
    let re = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    );
    re.map(|re| re.is_match(email)).unwrap_or(false)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(password: &str, settings: &AuthSettings) -> Result<String, ApiError> {
    bcrypt::hash(password, settings.password_cost)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

pub async fn register<S: Store>(
    store: &S,
    settings: &AuthSettings,
    request: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    let mut errors = request
        .validate()
        .err()
        .map(FieldErrors::from)
        .unwrap_or_default();
    if !is_valid_email(request.email.trim()) && errors.get("email").is_none() {
        errors.add("email", "enter a valid email address");
    }
    if request.password != request.password_confirm {
        errors.add("password_confirm", "passwords do not match");
    }
    if request.user_type == UserRole::Admin {
        errors.add("user_type", "admin accounts cannot be self-registered");
    }
    errors.into_result()?;

    let password_hash = hash_password(&request.password, settings)?;
    let mut account = Account::new(
        request.username.trim().to_string(),
        normalize_email(&request.email),
        password_hash,
        request.user_type,
    );
    account.first_name = Some(request.first_name.trim().to_string());
    account.last_name = Some(request.last_name.trim().to_string());
    account.phone_number = Some(request.phone_number.trim().to_string());

    store.insert_account(&account).await?;
    ensure_profile(store, &account).await?;
    log::info!("Registered {} account {}", account.role, account.username);

    let tokens = token_service::issue_token_pair(&account, settings)?;
    Ok(AuthResponse::new(&account, tokens, "User registered successfully"))
}

pub async fn login<S: Store>(
    store: &S,
    settings: &AuthSettings,
    request: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    request.validate()?;

    let invalid = || ApiError::Authentication("Invalid credentials".to_string());
    let mut account = store
        .find_account_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    if !bcrypt::verify(&request.password, &account.password).unwrap_or(false) {
        account.failed_signins += 1;
        account.touch();
        store.save_account(&account).await?;
        log::warn!(
            "Failed sign-in for {} ({} in a row)",
            account.username,
            account.failed_signins
        );
        return Err(invalid());
    }

    if !account.is_active {
        return Err(ApiError::Authentication("Account is disabled".to_string()));
    }

    account.failed_signins = 0;
    account.last_signin = Some(Utc::now());
    account.touch();
    store.save_account(&account).await?;

    let tokens = token_service::issue_token_pair(&account, settings)?;
    Ok(AuthResponse::new(&account, tokens, "Login successful"))
}

pub async fn refresh<S: Store>(
    store: &S,
    settings: &AuthSettings,
    request: RefreshRequest,
) -> Result<AccessTokenResponse, ApiError> {
    let claims = token_service::decode_token(&request.refresh, settings, TokenType::Refresh)?;
    if store.is_token_revoked(&claims.jti).await? {
        return Err(ApiError::Authentication(
            "Token has been revoked".to_string(),
        ));
    }
    let account = load_active_account(store, &claims.sub).await?;
    Ok(AccessTokenResponse {
        access: token_service::issue_access_token(&account, settings)?,
    })
}

/// Revokes a refresh token until it would have expired anyway.
pub async fn logout<S: Store>(
    store: &S,
    settings: &AuthSettings,
    request: LogoutRequest,
) -> Result<(), ApiError> {
    let token = request
        .refresh
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::validation("refresh", "Refresh token required"))?;
    let invalid = || ApiError::validation("refresh", "Invalid token");

    let claims =
        token_service::decode_token(token, settings, TokenType::Refresh).map_err(|_| invalid())?;
    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0).ok_or_else(invalid)?;
    store.revoke_token(&claims.jti, expires_at).await?;
    log::info!("{} logged out", claims.username);
    Ok(())
}

pub async fn load_account<S: Store>(store: &S, account_id: &str) -> Result<Account, ApiError> {
    store
        .get_account(account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// The token may outlive a disable; the stored flags win.
pub async fn load_active_account<S: Store>(store: &S, account_id: &str) -> Result<Account, ApiError> {
    let account = store
        .get_account(account_id)
        .await?
        .ok_or_else(|| ApiError::Authentication("User no longer exists".to_string()))?;
    if !account.is_active {
        return Err(ApiError::Authentication("Account is disabled".to_string()));
    }
    Ok(account)
}

pub async fn ensure_tourist_profile<S: Store>(
    store: &S,
    account_id: &str,
) -> Result<TouristProfile, ApiError> {
    if let Some(profile) = store.get_tourist_by_account(account_id).await? {
        return Ok(profile);
    }
    let profile = TouristProfile::new(account_id);
    match store.insert_tourist(&profile).await {
        Ok(()) => Ok(profile),
        // Another request provisioned it first.
        Err(StoreError::Duplicate(_)) => store
            .get_tourist_by_account(account_id)
            .await?
            .ok_or_else(|| ApiError::Internal("tourist profile vanished".to_string())),
        Err(err) => Err(err.into()),
    }
}

pub async fn ensure_guide_profile<S: Store>(
    store: &S,
    account: &Account,
) -> Result<GuideProfile, ApiError> {
    if let Some(profile) = store.get_guide_by_account(&account.id).await? {
        return Ok(profile);
    }
    let mut profile = GuideProfile::new(Some(&account.id));
    profile.display_name = Some(account.full_name());
    match store.insert_guide(&profile).await {
        Ok(()) => Ok(profile),
        Err(StoreError::Duplicate(_)) => store
            .get_guide_by_account(&account.id)
            .await?
            .ok_or_else(|| ApiError::Internal("guide profile vanished".to_string())),
        Err(err) => Err(err.into()),
    }
}

pub async fn ensure_agency_profile<S: Store>(
    store: &S,
    account_id: &str,
) -> Result<AgencyProfile, ApiError> {
    if let Some(profile) = store.get_agency_by_account(account_id).await? {
        return Ok(profile);
    }
    let profile = AgencyProfile::new(account_id);
    match store.insert_agency(&profile).await {
        Ok(()) => Ok(profile),
        Err(StoreError::Duplicate(_)) => store
            .get_agency_by_account(account_id)
            .await?
            .ok_or_else(|| ApiError::Internal("agency profile vanished".to_string())),
        Err(err) => Err(err.into()),
    }
}

/// Idempotent: returns the existing role profile or creates it. Admins have none.
pub async fn ensure_profile<S: Store>(
    store: &S,
    account: &Account,
) -> Result<Option<RoleProfile>, ApiError> {
    Ok(match account.role {
        UserRole::Tourist => Some(RoleProfile::Tourist(
            ensure_tourist_profile(store, &account.id).await?,
        )),
        UserRole::Guide => Some(RoleProfile::Guide(ensure_guide_profile(store, account).await?)),
        UserRole::Agency => Some(RoleProfile::Agency(
            ensure_agency_profile(store, &account.id).await?,
        )),
        UserRole::Admin => None,
    })
}

/// Reads the caller's role profile without provisioning it.
pub async fn find_profile<S: Store>(
    store: &S,
    account: &Account,
) -> Result<Option<RoleProfile>, ApiError> {
    Ok(match account.role {
        UserRole::Tourist => store
            .get_tourist_by_account(&account.id)
            .await?
            .map(RoleProfile::Tourist),
        UserRole::Guide => store
            .get_guide_by_account(&account.id)
            .await?
            .map(RoleProfile::Guide),
        UserRole::Agency => store
            .get_agency_by_account(&account.id)
            .await?
            .map(RoleProfile::Agency),
        UserRole::Admin => None,
    })
}

pub async fn profile<S: Store>(store: &S, account_id: &str) -> Result<ProfileResponse, ApiError> {
    let account = load_account(store, account_id).await?;
    let profile = find_profile(store, &account).await?;
    Ok(ProfileResponse {
        user: AccountView::from(&account),
        profile,
    })
}

/// Creates the configured admin account unless the email is already taken.
pub async fn ensure_admin<S: Store>(
    store: &S,
    bootstrap: &AdminBootstrap,
    settings: &AuthSettings,
) -> Result<(), ApiError> {
    let email = normalize_email(&bootstrap.email);
    if let Some(existing) = store.find_account_by_email(&email).await? {
        if existing.role != UserRole::Admin {
            log::warn!(
                "ADMIN_EMAIL {} belongs to a {} account; not promoting it",
                email,
                existing.role
            );
        }
        return Ok(());
    }

    let mut admin = Account::new(
        bootstrap.username.clone(),
        email,
        hash_password(&bootstrap.password, settings)?,
        UserRole::Admin,
    );
    admin.first_name = Some("Admin".to_string());
    admin.last_name = Some("User".to_string());
    store.insert_account(&admin).await?;
    log::info!("Created admin account {}", admin.username);
    Ok(())
}
