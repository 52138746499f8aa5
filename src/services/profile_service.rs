use chrono::Utc;

use crate::db::store::Store;
use crate::error::ApiError;
use crate::models::account::{Account, UserRole};
use crate::models::profile::{
    AgencyProfile, AgencyProfileUpdate, GuideProfile, GuideProfileUpdate, TouristProfile,
    TouristProfileUpdate,
};
use crate::services::account_service;

/// Role profiles are only reachable by their own role; admins have none.
pub fn require_role(account: &Account, role: UserRole) -> Result<(), ApiError> {
    if account.role != role {
        return Err(ApiError::Permission(format!(
            "Only {} accounts have a {} profile",
            role, role
        )));
    }
    Ok(())
}

pub async fn tourist_profile<S: Store>(
    store: &S,
    account: &Account,
) -> Result<TouristProfile, ApiError> {
    require_role(account, UserRole::Tourist)?;
    account_service::ensure_tourist_profile(store, &account.id).await
}

pub async fn update_tourist_profile<S: Store>(
    store: &S,
    account: &Account,
    update: TouristProfileUpdate,
) -> Result<TouristProfile, ApiError> {
    let mut profile = tourist_profile(store, account).await?;
    update.validate(Utc::now().date_naive()).into_result()?;
    update.apply(&mut profile);
    store.save_tourist(&profile).await?;
    Ok(profile)
}

pub async fn guide_profile<S: Store>(store: &S, account: &Account) -> Result<GuideProfile, ApiError> {
    require_role(account, UserRole::Guide)?;
    account_service::ensure_guide_profile(store, account).await
}

pub async fn update_guide_profile<S: Store>(
    store: &S,
    account: &Account,
    update: GuideProfileUpdate,
) -> Result<GuideProfile, ApiError> {
    let mut profile = guide_profile(store, account).await?;
    update.validate().into_result()?;
    update.apply(&mut profile);
    store.save_guide(&profile).await?;
    Ok(profile)
}

pub async fn agency_profile<S: Store>(
    store: &S,
    account: &Account,
) -> Result<AgencyProfile, ApiError> {
    require_role(account, UserRole::Agency)?;
    account_service::ensure_agency_profile(store, &account.id).await
}

pub async fn update_agency_profile<S: Store>(
    store: &S,
    account: &Account,
    update: AgencyProfileUpdate,
) -> Result<AgencyProfile, ApiError> {
    let mut profile = agency_profile(store, account).await?;
    update.validate().into_result()?;
    update.apply(&mut profile);
    store.save_agency(&profile).await?;
    Ok(profile)
}
