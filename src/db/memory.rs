use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::db::store::{
    Store, StoreError, StoreResult, DUPLICATE_EMAIL, DUPLICATE_PROFILE, DUPLICATE_RATING,
    DUPLICATE_RECORD, DUPLICATE_SOCIAL_ID, DUPLICATE_USERNAME,
};
use crate::models::{
    account::{Account, AccountFilter, AuthProvider},
    bookings::{Booking, BookingFilter},
    catalog::{AgencyQuery, GuideQuery, Page, PackageQuery},
    package::Package,
    profile::{AgencyProfile, GuideProfile, TouristProfile},
    rating::{Rating, RatingFilter},
};

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    tourists: HashMap<String, TouristProfile>,
    guides: HashMap<String, GuideProfile>,
    agencies: HashMap<String, AgencyProfile>,
    packages: HashMap<String, Package>,
    bookings: HashMap<String, Booking>,
    ratings: HashMap<String, Rating>,
    revoked_tokens: HashMap<String, DateTime<Utc>>,
}

/// Process-local store with the same constraints as the MongoDB backend.
/// Backs the test suite and `STORE=memory`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    failing: std::sync::Mutex<std::collections::HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(not(test))]
    fn injected_failure(&self, _operation: &'static str) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Makes every later call of `operation` (a `save_*` method name) fail
    /// with a database error.
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(operation);
        }
    }

    pub fn recover(&self, operation: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(operation);
        }
    }

    fn injected_failure(&self, operation: &'static str) -> StoreResult<()> {
        match self.failing.lock() {
            Ok(failing) if failing.contains(operation) => {
                Err(StoreError::Database(format!("{} is unavailable", operation)))
            }
            _ => Ok(()),
        }
    }
}

fn account_conflict(accounts: &HashMap<String, Account>, candidate: &Account) -> Option<&'static str> {
    accounts
        .values()
        .filter(|existing| existing.id != candidate.id)
        .find_map(|existing| {
            if existing.email == candidate.email {
                Some(DUPLICATE_EMAIL)
            } else if existing.username == candidate.username {
                Some(DUPLICATE_USERNAME)
            } else if candidate.google_id.is_some() && existing.google_id == candidate.google_id
                || candidate.facebook_id.is_some() && existing.facebook_id == candidate.facebook_id
            {
                Some(DUPLICATE_SOCIAL_ID)
            } else {
                None
            }
        })
}

fn insert_new<T: Clone>(table: &mut HashMap<String, T>, id: &str, record: &T) -> StoreResult<()> {
    if table.contains_key(id) {
        return Err(StoreError::Duplicate(DUPLICATE_RECORD.to_string()));
    }
    table.insert(id.to_string(), record.clone());
    Ok(())
}

fn replace_existing<T: Clone>(
    table: &mut HashMap<String, T>,
    id: &str,
    record: &T,
    what: &str,
) -> StoreResult<()> {
    match table.get_mut(id) {
        Some(slot) => {
            *slot = record.clone();
            Ok(())
        }
        None => Err(StoreError::NotFound(what.to_string())),
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(message) = account_conflict(&tables.accounts, account) {
            return Err(StoreError::Duplicate(message.to_string()));
        }
        insert_new(&mut tables.accounts, &account.id, account)
    }

    async fn get_account(&self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_account_by_provider(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|account| {
                let linked = match provider {
                    AuthProvider::Google => account.google_id.as_deref(),
                    AuthProvider::Facebook => account.facebook_id.as_deref(),
                    AuthProvider::Email => None,
                };
                linked == Some(subject)
            })
            .cloned())
    }

    async fn save_account(&self, account: &Account) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(message) = account_conflict(&tables.accounts, account) {
            return Err(StoreError::Duplicate(message.to_string()));
        }
        replace_existing(&mut tables.accounts, &account.id, account, "account")
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> StoreResult<Vec<Account>> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables
            .accounts
            .values()
            .filter(|account| filter.matches(account))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn insert_tourist(&self, profile: &TouristProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .tourists
            .values()
            .any(|p| p.id != profile.id && p.account_id == profile.account_id);
        if taken {
            return Err(StoreError::Duplicate(DUPLICATE_PROFILE.to_string()));
        }
        insert_new(&mut tables.tourists, &profile.id, profile)
    }

    async fn get_tourist(&self, id: &str) -> StoreResult<Option<TouristProfile>> {
        Ok(self.tables.read().await.tourists.get(id).cloned())
    }

    async fn get_tourist_by_account(
        &self,
        account_id: &str,
    ) -> StoreResult<Option<TouristProfile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tourists
            .values()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    async fn save_tourist(&self, profile: &TouristProfile) -> StoreResult<()> {
        self.injected_failure("save_tourist")?;
        let mut tables = self.tables.write().await;
        replace_existing(&mut tables.tourists, &profile.id, profile, "tourist profile")
    }

    async fn insert_guide(&self, profile: &GuideProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(account_id) = &profile.account_id {
            let taken = tables
                .guides
                .values()
                .any(|p| p.id != profile.id && p.account_id.as_ref() == Some(account_id));
            if taken {
                return Err(StoreError::Duplicate(DUPLICATE_PROFILE.to_string()));
            }
        }
        insert_new(&mut tables.guides, &profile.id, profile)
    }

    async fn get_guide(&self, id: &str) -> StoreResult<Option<GuideProfile>> {
        Ok(self.tables.read().await.guides.get(id).cloned())
    }

    async fn get_guide_by_account(&self, account_id: &str) -> StoreResult<Option<GuideProfile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .guides
            .values()
            .find(|p| p.account_id.as_deref() == Some(account_id))
            .cloned())
    }

    async fn save_guide(&self, profile: &GuideProfile) -> StoreResult<()> {
        self.injected_failure("save_guide")?;
        let mut tables = self.tables.write().await;
        replace_existing(&mut tables.guides, &profile.id, profile, "guide")
    }

    async fn list_guides(&self, query: &GuideQuery) -> StoreResult<Page<GuideProfile>> {
        let tables = self.tables.read().await;
        let mut guides: Vec<GuideProfile> = tables
            .guides
            .values()
            .filter(|guide| query.matches(guide))
            .cloned()
            .collect();
        guides.sort_by(|a, b| query.compare(a, b));
        Ok(Page::from_sorted(guides, query.pagination))
    }

    async fn insert_agency(&self, profile: &AgencyProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .agencies
            .values()
            .any(|p| p.id != profile.id && p.account_id == profile.account_id);
        if taken {
            return Err(StoreError::Duplicate(DUPLICATE_PROFILE.to_string()));
        }
        insert_new(&mut tables.agencies, &profile.id, profile)
    }

    async fn get_agency(&self, id: &str) -> StoreResult<Option<AgencyProfile>> {
        Ok(self.tables.read().await.agencies.get(id).cloned())
    }

    async fn get_agency_by_account(
        &self,
        account_id: &str,
    ) -> StoreResult<Option<AgencyProfile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .agencies
            .values()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    async fn save_agency(&self, profile: &AgencyProfile) -> StoreResult<()> {
        self.injected_failure("save_agency")?;
        let mut tables = self.tables.write().await;
        replace_existing(&mut tables.agencies, &profile.id, profile, "agency")
    }

    async fn list_agencies(&self, query: &AgencyQuery) -> StoreResult<Page<AgencyProfile>> {
        let tables = self.tables.read().await;
        let mut agencies: Vec<AgencyProfile> = tables
            .agencies
            .values()
            .filter(|agency| query.matches(agency))
            .cloned()
            .collect();
        agencies.sort_by(|a, b| query.compare(a, b));
        Ok(Page::from_sorted(agencies, query.pagination))
    }

    async fn find_agencies_by_accounts(
        &self,
        account_ids: &[String],
    ) -> StoreResult<Vec<AgencyProfile>> {
        let tables = self.tables.read().await;
        Ok(tables
            .agencies
            .values()
            .filter(|agency| account_ids.contains(&agency.account_id))
            .cloned()
            .collect())
    }

    async fn insert_package(&self, package: &Package) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        insert_new(&mut tables.packages, &package.id, package)
    }

    async fn get_package(&self, id: &str) -> StoreResult<Option<Package>> {
        Ok(self.tables.read().await.packages.get(id).cloned())
    }

    async fn save_package(&self, package: &Package) -> StoreResult<()> {
        self.injected_failure("save_package")?;
        let mut tables = self.tables.write().await;
        replace_existing(&mut tables.packages, &package.id, package, "package")
    }

    async fn delete_package(&self, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.packages.remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound("package".to_string())),
        }
    }

    async fn list_packages(&self, query: &PackageQuery) -> StoreResult<Page<Package>> {
        let tables = self.tables.read().await;
        let mut packages: Vec<Package> = tables
            .packages
            .values()
            .filter(|package| query.matches(package))
            .cloned()
            .collect();
        packages.sort_by(|a, b| query.compare(a, b));
        Ok(Page::from_sorted(packages, query.pagination))
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        insert_new(&mut tables.bookings, &booking.id, booking)
    }

    async fn get_booking(&self, id: &str) -> StoreResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(id).cloned())
    }

    async fn save_booking(&self, booking: &Booking) -> StoreResult<()> {
        self.injected_failure("save_booking")?;
        let mut tables = self.tables.write().await;
        replace_existing(&mut tables.bookings, &booking.id, booking, "booking")
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bookings)
    }

    async fn insert_rating(&self, rating: &Rating) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .ratings
            .values()
            .any(|existing| existing.tourist_id == rating.tourist_id && existing.target == rating.target);
        if taken {
            return Err(StoreError::Duplicate(DUPLICATE_RATING.to_string()));
        }
        insert_new(&mut tables.ratings, &rating.id, rating)
    }

    async fn list_ratings(&self, filter: &RatingFilter) -> StoreResult<Vec<Rating>> {
        let tables = self.tables.read().await;
        let mut ratings: Vec<Rating> = tables
            .ratings
            .values()
            .filter(|rating| filter.matches(rating))
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(ratings)
    }

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        tables.revoked_tokens.retain(|_, expiry| *expiry > now);
        tables.revoked_tokens.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.revoked_tokens.contains_key(jti))
    }
}
