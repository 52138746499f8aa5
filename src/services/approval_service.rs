use serde::{Deserialize, Serialize};

use crate::db::store::Store;
use crate::error::ApiError;
use crate::models::account::{Account, AccountFilter, AccountView, UserRole};
use crate::models::profile::AgencyProfile;

#[derive(Debug, Deserialize)]
pub struct AgencyDecision {
    pub agency_id: String,
}

#[derive(Debug, Serialize)]
pub struct PendingAgency {
    pub user: AccountView,
    pub profile: Option<AgencyProfile>,
}

/// `agency_id` may name the agency profile or its account.
async fn agency_account<S: Store>(store: &S, agency_id: &str) -> Result<Account, ApiError> {
    let account_id = match store.get_agency(agency_id).await? {
        Some(profile) => profile.account_id,
        None => agency_id.to_string(),
    };
    store
        .get_account(&account_id)
        .await?
        .filter(|account| account.role == UserRole::Agency)
        .ok_or_else(|| ApiError::NotFound("Agency not found".to_string()))
}

/// Active agency accounts waiting for review.
pub async fn pending_agencies<S: Store>(store: &S) -> Result<Vec<PendingAgency>, ApiError> {
    let filter = AccountFilter {
        role: Some(UserRole::Agency),
        is_approved: Some(false),
        is_active: Some(true),
    };
    let mut pending = Vec::new();
    for account in store.list_accounts(&filter).await? {
        let profile = store.get_agency_by_account(&account.id).await?;
        pending.push(PendingAgency {
            user: AccountView::from(&account),
            profile,
        });
    }
    Ok(pending)
}

/// Idempotent. Also reactivates a previously rejected agency.
pub async fn approve_agency<S: Store>(store: &S, agency_id: &str) -> Result<Account, ApiError> {
    let mut account = agency_account(store, agency_id).await?;
    if account.is_approved && account.is_verified && account.is_active {
        return Ok(account);
    }
    account.is_approved = true;
    account.is_verified = true;
    account.is_active = true;
    account.touch();
    store.save_account(&account).await?;
    log::info!("Agency {} approved", account.username);
    Ok(account)
}

/// Soft-disables the agency and clears its approval so a later reactivation
/// goes through review again.
pub async fn reject_agency<S: Store>(store: &S, agency_id: &str) -> Result<Account, ApiError> {
    let mut account = agency_account(store, agency_id).await?;
    account.is_active = false;
    account.is_approved = false;
    account.touch();
    store.save_account(&account).await?;
    log::info!("Agency {} rejected", account.username);
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    async fn agency(store: &MemoryStore) -> (Account, AgencyProfile) {
        let account = Account::new("a".into(), "a@example.com".into(), "h".into(), UserRole::Agency);
        store.insert_account(&account).await.unwrap();
        let profile = AgencyProfile::new(&account.id);
        store.insert_agency(&profile).await.unwrap();
        (account, profile)
    }

    #[actix_rt::test]
    async fn approve_twice_equals_approve_once() {
        let store = MemoryStore::new();
        let (account, profile) = agency(&store).await;
        assert_eq!(pending_agencies(&store).await.unwrap().len(), 1);

        approve_agency(&store, &profile.id).await.unwrap();
        let once = store.get_account(&account.id).await.unwrap().unwrap();
        approve_agency(&store, &profile.id).await.unwrap();
        let twice = store.get_account(&account.id).await.unwrap().unwrap();

        assert!(once.is_approved && once.is_verified);
        assert_eq!(once.updated_at, twice.updated_at);
        assert!(pending_agencies(&store).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn reject_disables_and_clears_approval() {
        let store = MemoryStore::new();
        let (account, _) = agency(&store).await;
        approve_agency(&store, &account.id).await.unwrap();
        reject_agency(&store, &account.id).await.unwrap();
        let stored = store.get_account(&account.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(!stored.is_approved);
        // Rejected agencies are not listed as pending.
        assert!(pending_agencies(&store).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn non_agency_ids_are_not_found() {
        let store = MemoryStore::new();
        let tourist = Account::new("t".into(), "t@example.com".into(), "h".into(), UserRole::Tourist);
        store.insert_account(&tourist).await.unwrap();
        assert!(matches!(
            approve_agency(&store, &tourist.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(approve_agency(&store, "missing").await.is_err());
    }
}
