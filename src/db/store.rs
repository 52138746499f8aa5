use chrono::{DateTime, Utc};

use crate::models::{
    account::{Account, AccountFilter, AuthProvider},
    bookings::{Booking, BookingFilter},
    catalog::{AgencyQuery, GuideQuery, Page, PackageQuery},
    package::Package,
    profile::{AgencyProfile, GuideProfile, TouristProfile},
    rating::{Rating, RatingFilter},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A unique constraint rejected the write.
    #[error("{0}")]
    Duplicate(String),

    #[error("{0} not found")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence seam shared by the MongoDB backend and the in-memory one.
///
/// `save_*` replaces the whole record and fails with `NotFound` when it does
/// not exist. Unique constraints: account email, username and provider ids;
/// one profile per account; one rating per (tourist, target).
#[allow(async_fn_in_trait)]
pub trait Store: Send + Sync + 'static {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_account(&self, account: &Account) -> StoreResult<()>;
    async fn get_account(&self, id: &str) -> StoreResult<Option<Account>>;
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;
    async fn find_account_by_provider(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> StoreResult<Option<Account>>;
    async fn save_account(&self, account: &Account) -> StoreResult<()>;
    async fn list_accounts(&self, filter: &AccountFilter) -> StoreResult<Vec<Account>>;

    async fn insert_tourist(&self, profile: &TouristProfile) -> StoreResult<()>;
    async fn get_tourist(&self, id: &str) -> StoreResult<Option<TouristProfile>>;
    async fn get_tourist_by_account(&self, account_id: &str)
        -> StoreResult<Option<TouristProfile>>;
    async fn save_tourist(&self, profile: &TouristProfile) -> StoreResult<()>;

    async fn insert_guide(&self, profile: &GuideProfile) -> StoreResult<()>;
    async fn get_guide(&self, id: &str) -> StoreResult<Option<GuideProfile>>;
    async fn get_guide_by_account(&self, account_id: &str) -> StoreResult<Option<GuideProfile>>;
    async fn save_guide(&self, profile: &GuideProfile) -> StoreResult<()>;
    async fn list_guides(&self, query: &GuideQuery) -> StoreResult<Page<GuideProfile>>;

    async fn insert_agency(&self, profile: &AgencyProfile) -> StoreResult<()>;
    async fn get_agency(&self, id: &str) -> StoreResult<Option<AgencyProfile>>;
    async fn get_agency_by_account(&self, account_id: &str)
        -> StoreResult<Option<AgencyProfile>>;
    async fn save_agency(&self, profile: &AgencyProfile) -> StoreResult<()>;
    async fn list_agencies(&self, query: &AgencyQuery) -> StoreResult<Page<AgencyProfile>>;
    async fn find_agencies_by_accounts(
        &self,
        account_ids: &[String],
    ) -> StoreResult<Vec<AgencyProfile>>;

    async fn insert_package(&self, package: &Package) -> StoreResult<()>;
    async fn get_package(&self, id: &str) -> StoreResult<Option<Package>>;
    async fn save_package(&self, package: &Package) -> StoreResult<()>;
    async fn delete_package(&self, id: &str) -> StoreResult<()>;
    async fn list_packages(&self, query: &PackageQuery) -> StoreResult<Page<Package>>;

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;
    async fn get_booking(&self, id: &str) -> StoreResult<Option<Booking>>;
    async fn save_booking(&self, booking: &Booking) -> StoreResult<()>;
    /// Newest first.
    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;

    async fn insert_rating(&self, rating: &Rating) -> StoreResult<()>;
    /// Newest first.
    async fn list_ratings(&self, filter: &RatingFilter) -> StoreResult<Vec<Rating>>;

    /// Remembers a revoked token id until `expires_at`. Revoking twice is fine.
    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;
    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool>;
}

pub const DUPLICATE_EMAIL: &str = "an account with this email already exists";
pub const DUPLICATE_USERNAME: &str = "this username is already taken";
pub const DUPLICATE_SOCIAL_ID: &str = "this social account is already linked";
pub const DUPLICATE_PROFILE: &str = "a profile already exists for this account";
pub const DUPLICATE_RATING: &str = "you have already rated this target";
pub const DUPLICATE_RECORD: &str = "record already exists";
