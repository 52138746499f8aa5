use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use reqwest::Client as ReqwestClient;

use crate::config::AuthSettings;
use crate::db::store::{Store, StoreError};
use crate::error::ApiError;
use crate::models::account::{Account, AuthProvider, SocialIdentity, UserRole};
use crate::services::account_service::{self, AuthResponse};
use crate::services::image_service::{ImageService, ImageUploadError};
use crate::services::token_service;

const MAX_USERNAME_LEN: usize = 150;
const CREATE_ATTEMPTS: usize = 3;

/// Lowercased display name with spaces as underscores and anything outside
/// `[a-z0-9_.-]` dropped. Falls back to the email local part, then "user".
pub fn base_username(identity: &SocialIdentity) -> String {
    let clean = |raw: &str| -> String {
        raw.trim()
            .to_lowercase()
            .replace(' ', "_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            .take(MAX_USERNAME_LEN - 10)
            .collect()
    };

    let from_name = identity.display_name.as_deref().map(clean).unwrap_or_default();
    if !from_name.is_empty() {
        return from_name;
    }
    let local_part = identity.email.split('@').next().unwrap_or_default();
    let from_email = clean(local_part);
    if !from_email.is_empty() {
        return from_email;
    }
    "user".to_string()
}

async fn unique_username<S: Store>(store: &S, base: &str) -> Result<String, ApiError> {
    if store.find_account_by_username(base).await?.is_none() {
        return Ok(base.to_string());
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{}_{}", base, suffix);
        if store.find_account_by_username(&candidate).await?.is_none() {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

fn unusable_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn link_provider(account: &mut Account, identity: &SocialIdentity) {
    match identity.provider {
        AuthProvider::Google => account.google_id = Some(identity.subject.clone()),
        AuthProvider::Facebook => account.facebook_id = Some(identity.subject.clone()),
        AuthProvider::Email => {}
    }
}

async fn provision<S: Store>(
    store: &S,
    settings: &AuthSettings,
    identity: &SocialIdentity,
    email: &str,
) -> Result<Account, ApiError> {
    let password_hash = account_service::hash_password(&unusable_password(), settings)?;
    let base = base_username(identity);

    for _ in 0..CREATE_ATTEMPTS {
        let username = unique_username(store, &base).await?;
        let mut account = Account::new(username, email.to_string(), password_hash.clone(), UserRole::Tourist);
        account.provider = identity.provider;
        account.first_name = identity.first_name.clone();
        account.last_name = identity.last_name.clone();
        account.is_verified = true;
        account.is_approved = true;
        link_provider(&mut account, identity);

        match store.insert_account(&account).await {
            Ok(()) => return Ok(account),
            // Username claimed between the lookup and the insert; try the next suffix.
            Err(StoreError::Duplicate(message))
                if message == crate::db::store::DUPLICATE_USERNAME =>
            {
                log::debug!("Username {} was taken concurrently", account.username);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(ApiError::Conflict("could not allocate a username".to_string()))
}

async fn attach_avatar<S: Store>(
    store: &S,
    images: &ImageService,
    http: &ReqwestClient,
    account: &mut Account,
    avatar_url: &str,
) {
    let prefix = format!("avatars/{}", account.id);
    let stored = match images.mirror_remote(http, avatar_url, &prefix).await {
        Ok(url) => url,
        Err(ImageUploadError::NotConfigured) => avatar_url.to_string(),
        Err(e) => {
            log::warn!("Could not store avatar for {}: {}", account.username, e);
            return;
        }
    };
    account.profile_image = Some(stored);
    if let Err(e) = store.save_account(account).await {
        log::warn!("Could not save avatar for {}: {}", account.username, e);
    }
}

/// Maps a verified social identity to an account: by provider id, then by
/// email (linking the provider), else a new verified tourist.
pub async fn sign_in<S: Store>(
    store: &S,
    settings: &AuthSettings,
    images: &ImageService,
    http: &ReqwestClient,
    identity: SocialIdentity,
) -> Result<AuthResponse, ApiError> {
    let email = account_service::normalize_email(&identity.email);

    let existing = match store
        .find_account_by_provider(identity.provider, &identity.subject)
        .await?
    {
        Some(account) => Some(account),
        None => store.find_account_by_email(&email).await?,
    };

    let (mut account, created) = match existing {
        Some(mut account) => {
            if !account.is_active {
                return Err(ApiError::Authentication("Account is disabled".to_string()));
            }
            link_provider(&mut account, &identity);
            account.is_verified = true;
            (account, false)
        }
        None => {
            let mut account = provision(store, settings, &identity, &email).await?;
            account_service::ensure_tourist_profile(store, &account.id).await?;
            if let Some(avatar_url) = identity.avatar_url.as_deref() {
                attach_avatar(store, images, http, &mut account, avatar_url).await;
            }
            log::info!(
                "Created {} account {} via {}",
                account.role,
                account.username,
                identity.provider.as_str()
            );
            (account, true)
        }
    };

    account.last_signin = Some(Utc::now());
    account.failed_signins = 0;
    account.touch();
    store.save_account(&account).await?;

    let tokens = token_service::issue_token_pair(&account, settings)?;
    let mut response = AuthResponse::new(&account, tokens, "Login successful");
    response.created = Some(created);
    Ok(response)
}
