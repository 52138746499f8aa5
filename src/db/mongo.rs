use std::time::Duration;

use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteError, WriteFailure},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, Database, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::store::{
    Store, StoreError, StoreResult, DUPLICATE_EMAIL, DUPLICATE_PROFILE, DUPLICATE_RATING,
    DUPLICATE_RECORD, DUPLICATE_SOCIAL_ID, DUPLICATE_USERNAME,
};
use crate::models::{
    account::{Account, AccountFilter, AuthProvider},
    bookings::{Booking, BookingFilter},
    catalog::{AgencyQuery, GuideQuery, Page, PackageQuery, Pagination},
    package::Package,
    profile::{AgencyProfile, GuideProfile, TouristProfile},
    rating::{Rating, RatingFilter},
    target::Target,
};

const DUPLICATE_KEY: i32 = 11000;

pub async fn create_mongo_client(uri: &str) -> mongodb::error::Result<Client> {
    log::info!("Connecting to MongoDB");

    let mut client_options = ClientOptions::parse(uri).await?;
    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    // Stable API, MongoDB 5.0+
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    match client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
    {
        Ok(_) => log::info!("Connected to MongoDB and verified with ping"),
        Err(e) => log::warn!("Connected to MongoDB but ping failed: {}", e),
    }

    Ok(client)
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if let ErrorKind::Write(WriteFailure::WriteError(WriteError { code, message, .. })) =
            err.kind.as_ref()
        {
            if *code == DUPLICATE_KEY {
                return StoreError::Duplicate(duplicate_message(message).to_string());
            }
        }
        StoreError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// The server names the violated index in the error message.
fn duplicate_message(server_message: &str) -> &'static str {
    const INDEX_MESSAGES: [(&str, &str); 6] = [
        ("email_unique", DUPLICATE_EMAIL),
        ("username_unique", DUPLICATE_USERNAME),
        ("google_id_unique", DUPLICATE_SOCIAL_ID),
        ("facebook_id_unique", DUPLICATE_SOCIAL_ID),
        ("account_unique", DUPLICATE_PROFILE),
        ("rating_unique", DUPLICATE_RATING),
    ];
    INDEX_MESSAGES
        .iter()
        .find(|(index, _)| server_message.contains(index))
        .map(|(_, message)| *message)
        .unwrap_or(DUPLICATE_RECORD)
}

fn unique_index(keys: Document, name: &str, sparse: bool) -> IndexModel {
    let options = IndexOptions::builder()
        .unique(true)
        .sparse(sparse)
        .name(name.to_string())
        .build();
    IndexModel::builder().keys(keys).options(options).build()
}

fn target_condition(target: &Target) -> Document {
    doc! { "target.kind": target.kind().as_str(), "target.id": target.id() }
}

/// Production store: one collection per record type in a single database.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(client: &Client, database_name: &str) -> Self {
        Self {
            db: client.database(database_name),
        }
    }

    fn accounts(&self) -> Collection<Account> {
        self.db.collection("accounts")
    }

    fn tourists(&self) -> Collection<TouristProfile> {
        self.db.collection("tourists")
    }

    fn guides(&self) -> Collection<GuideProfile> {
        self.db.collection("guides")
    }

    fn agencies(&self) -> Collection<AgencyProfile> {
        self.db.collection("agencies")
    }

    fn packages(&self) -> Collection<Package> {
        self.db.collection("packages")
    }

    fn bookings(&self) -> Collection<Booking> {
        self.db.collection("bookings")
    }

    fn ratings(&self) -> Collection<Rating> {
        self.db.collection("ratings")
    }

    fn revoked_tokens(&self) -> Collection<Document> {
        self.db.collection("revoked_tokens")
    }

    /// Creates the unique indexes the store relies on. Safe to run on every start.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        self.accounts()
            .create_indexes([
                unique_index(doc! { "email": 1 }, "email_unique", false),
                unique_index(doc! { "username": 1 }, "username_unique", false),
                unique_index(doc! { "google_id": 1 }, "google_id_unique", true),
                unique_index(doc! { "facebook_id": 1 }, "facebook_id_unique", true),
            ])
            .await?;
        self.tourists()
            .create_index(unique_index(doc! { "account_id": 1 }, "account_unique", false))
            .await?;
        self.guides()
            .create_index(unique_index(doc! { "account_id": 1 }, "account_unique", true))
            .await?;
        self.agencies()
            .create_index(unique_index(doc! { "account_id": 1 }, "account_unique", false))
            .await?;
        self.ratings()
            .create_index(unique_index(
                doc! { "tourist_id": 1, "target.kind": 1, "target.id": 1 },
                "rating_unique",
                false,
            ))
            .await?;
        // Entries are dropped by the server once the token would have expired.
        let expiry = IndexOptions::builder()
            .expire_after(Duration::ZERO)
            .name("revoked_expiry".to_string())
            .build();
        self.revoked_tokens()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "expires_at": 1 })
                    .options(expiry)
                    .build(),
            )
            .await?;
        log::info!("MongoDB indexes are in place");
        Ok(())
    }

    async fn replace<T>(&self, collection: Collection<T>, id: &str, record: &T, what: &str) -> StoreResult<()>
    where
        T: Serialize + Send + Sync,
    {
        let result = collection.replace_one(doc! { "_id": id }, record).await?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound(what.to_string()));
        }
        Ok(())
    }

    async fn page<T>(
        &self,
        collection: Collection<T>,
        filter: Document,
        sort: Document,
        pagination: Pagination,
    ) -> StoreResult<Page<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let count = collection.count_documents(filter.clone()).await?;
        let results: Vec<T> = collection
            .find(filter)
            .sort(sort)
            .skip(pagination.offset())
            .limit(pagination.page_size as i64)
            .await?
            .try_collect()
            .await?;
        Ok(Page {
            count,
            page: pagination.page,
            page_size: pagination.page_size,
            results,
        })
    }

    async fn all<T>(&self, collection: Collection<T>, filter: Document, sort: Document) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        Ok(collection.find(filter).sort(sort).await?.try_collect().await?)
    }
}

impl Store for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_account(&self, account: &Account) -> StoreResult<()> {
        self.accounts().insert_one(account).await?;
        Ok(())
    }

    async fn get_account(&self, id: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts().find_one(doc! { "_id": id }).await?)
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts().find_one(doc! { "email": email }).await?)
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts().find_one(doc! { "username": username }).await?)
    }

    async fn find_account_by_provider(
        &self,
        provider: AuthProvider,
        subject: &str,
    ) -> StoreResult<Option<Account>> {
        let field = match provider {
            AuthProvider::Google => "google_id",
            AuthProvider::Facebook => "facebook_id",
            AuthProvider::Email => return Ok(None),
        };
        let mut filter = Document::new();
        filter.insert(field, subject);
        Ok(self.accounts().find_one(filter).await?)
    }

    async fn save_account(&self, account: &Account) -> StoreResult<()> {
        self.replace(self.accounts(), &account.id, account, "account").await
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> StoreResult<Vec<Account>> {
        let mut query = Document::new();
        if let Some(role) = filter.role {
            query.insert("role", role.as_str());
        }
        if let Some(approved) = filter.is_approved {
            query.insert("is_approved", approved);
        }
        if let Some(active) = filter.is_active {
            query.insert("is_active", active);
        }
        self.all(self.accounts(), query, doc! { "created_at": 1, "_id": 1 })
            .await
    }

    async fn insert_tourist(&self, profile: &TouristProfile) -> StoreResult<()> {
        self.tourists().insert_one(profile).await?;
        Ok(())
    }

    async fn get_tourist(&self, id: &str) -> StoreResult<Option<TouristProfile>> {
        Ok(self.tourists().find_one(doc! { "_id": id }).await?)
    }

    async fn get_tourist_by_account(
        &self,
        account_id: &str,
    ) -> StoreResult<Option<TouristProfile>> {
        Ok(self
            .tourists()
            .find_one(doc! { "account_id": account_id })
            .await?)
    }

    async fn save_tourist(&self, profile: &TouristProfile) -> StoreResult<()> {
        self.replace(self.tourists(), &profile.id, profile, "tourist profile")
            .await
    }

    async fn insert_guide(&self, profile: &GuideProfile) -> StoreResult<()> {
        self.guides().insert_one(profile).await?;
        Ok(())
    }

    async fn get_guide(&self, id: &str) -> StoreResult<Option<GuideProfile>> {
        Ok(self.guides().find_one(doc! { "_id": id }).await?)
    }

    async fn get_guide_by_account(&self, account_id: &str) -> StoreResult<Option<GuideProfile>> {
        Ok(self
            .guides()
            .find_one(doc! { "account_id": account_id })
            .await?)
    }

    async fn save_guide(&self, profile: &GuideProfile) -> StoreResult<()> {
        self.replace(self.guides(), &profile.id, profile, "guide").await
    }

    async fn list_guides(&self, query: &GuideQuery) -> StoreResult<Page<GuideProfile>> {
        self.page(
            self.guides(),
            query.to_filter(),
            query.sort.to_document(),
            query.pagination,
        )
        .await
    }

    async fn insert_agency(&self, profile: &AgencyProfile) -> StoreResult<()> {
        self.agencies().insert_one(profile).await?;
        Ok(())
    }

    async fn get_agency(&self, id: &str) -> StoreResult<Option<AgencyProfile>> {
        Ok(self.agencies().find_one(doc! { "_id": id }).await?)
    }

    async fn get_agency_by_account(
        &self,
        account_id: &str,
    ) -> StoreResult<Option<AgencyProfile>> {
        Ok(self
            .agencies()
            .find_one(doc! { "account_id": account_id })
            .await?)
    }

    async fn save_agency(&self, profile: &AgencyProfile) -> StoreResult<()> {
        self.replace(self.agencies(), &profile.id, profile, "agency").await
    }

    async fn list_agencies(&self, query: &AgencyQuery) -> StoreResult<Page<AgencyProfile>> {
        self.page(
            self.agencies(),
            query.to_filter(),
            query.sort.to_document(),
            query.pagination,
        )
        .await
    }

    async fn find_agencies_by_accounts(
        &self,
        account_ids: &[String],
    ) -> StoreResult<Vec<AgencyProfile>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Bson> = account_ids.iter().cloned().map(Bson::String).collect();
        self.all(
            self.agencies(),
            doc! { "account_id": { "$in": ids } },
            doc! { "_id": 1 },
        )
        .await
    }

    async fn insert_package(&self, package: &Package) -> StoreResult<()> {
        self.packages().insert_one(package).await?;
        Ok(())
    }

    async fn get_package(&self, id: &str) -> StoreResult<Option<Package>> {
        Ok(self.packages().find_one(doc! { "_id": id }).await?)
    }

    async fn save_package(&self, package: &Package) -> StoreResult<()> {
        self.replace(self.packages(), &package.id, package, "package")
            .await
    }

    async fn delete_package(&self, id: &str) -> StoreResult<()> {
        let result = self.packages().delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound("package".to_string()));
        }
        Ok(())
    }

    async fn list_packages(&self, query: &PackageQuery) -> StoreResult<Page<Package>> {
        self.page(
            self.packages(),
            query.to_filter(),
            query.sort.to_document(),
            query.pagination,
        )
        .await
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        self.bookings().insert_one(booking).await?;
        Ok(())
    }

    async fn get_booking(&self, id: &str) -> StoreResult<Option<Booking>> {
        Ok(self.bookings().find_one(doc! { "_id": id }).await?)
    }

    async fn save_booking(&self, booking: &Booking) -> StoreResult<()> {
        self.replace(self.bookings(), &booking.id, booking, "booking")
            .await
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let mut conditions = Vec::new();
        if let Some(tourist_id) = &filter.tourist_id {
            conditions.push(doc! { "tourist_id": tourist_id.as_str() });
        }
        if let Some(targets) = &filter.targets {
            if targets.is_empty() {
                return Ok(Vec::new());
            }
            let any_target: Vec<Document> = targets.iter().map(target_condition).collect();
            conditions.push(doc! { "$or": any_target });
        }
        if let Some(status) = filter.status {
            conditions.push(doc! { "status": status.as_str() });
        }
        let query = if conditions.is_empty() {
            Document::new()
        } else {
            doc! { "$and": conditions }
        };
        self.all(self.bookings(), query, doc! { "created_at": -1, "_id": 1 })
            .await
    }

    async fn insert_rating(&self, rating: &Rating) -> StoreResult<()> {
        self.ratings().insert_one(rating).await?;
        Ok(())
    }

    async fn list_ratings(&self, filter: &RatingFilter) -> StoreResult<Vec<Rating>> {
        let mut query = Document::new();
        if let Some(tourist_id) = &filter.tourist_id {
            query.insert("tourist_id", tourist_id.as_str());
        }
        if let Some(target) = &filter.target {
            for (key, value) in target_condition(target) {
                query.insert(key, value);
            }
        }
        self.all(self.ratings(), query, doc! { "created_at": -1, "_id": 1 })
            .await
    }

    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let expires_at = bson::DateTime::from_millis(expires_at.timestamp_millis());
        self.revoked_tokens()
            .update_one(
                doc! { "_id": jti },
                doc! { "$set": { "expires_at": expires_at } },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        Ok(self
            .revoked_tokens()
            .find_one(doc! { "_id": jti })
            .await?
            .is_some())
    }
}
