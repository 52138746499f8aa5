use serde::Serialize;

use crate::db::store::Store;
use crate::error::ApiError;
use crate::models::account::{AccountFilter, UserRole};
use crate::models::catalog::{
    AgencyParams, AgencyQuery, GuideParams, GuideQuery, Page, PackageParams, PackageQuery,
    Pagination,
};
use crate::models::package::Package;
use crate::models::profile::{AgencyProfile, GuideProfile};
use crate::models::rating::{Rating, RatingFilter};
use crate::models::target::Target;

const HOMEPAGE_ITEMS: u64 = 6;

#[derive(Debug, Serialize)]
pub struct HomepageContent {
    pub packages: Vec<Package>,
    pub guides: Vec<GuideProfile>,
    pub agencies: Vec<AgencyProfile>,
}

/// Accounts of agencies that are approved and active.
async fn visible_agency_accounts<S: Store>(store: &S) -> Result<Vec<String>, ApiError> {
    let filter = AccountFilter {
        role: Some(UserRole::Agency),
        is_approved: Some(true),
        is_active: Some(true),
    };
    Ok(store
        .list_accounts(&filter)
        .await?
        .into_iter()
        .map(|account| account.id)
        .collect())
}

async fn visible_agency_ids<S: Store>(store: &S) -> Result<Vec<String>, ApiError> {
    let accounts = visible_agency_accounts(store).await?;
    Ok(store
        .find_agencies_by_accounts(&accounts)
        .await?
        .into_iter()
        .map(|agency| agency.id)
        .collect())
}

async fn inactive_guide_accounts<S: Store>(store: &S) -> Result<Vec<String>, ApiError> {
    let filter = AccountFilter {
        role: Some(UserRole::Guide),
        is_approved: None,
        is_active: Some(false),
    };
    Ok(store
        .list_accounts(&filter)
        .await?
        .into_iter()
        .map(|account| account.id)
        .collect())
}

pub async fn list_packages<S: Store>(
    store: &S,
    mut query: PackageQuery,
) -> Result<Page<Package>, ApiError> {
    query.active_only = true;
    query.agency_ids = Some(visible_agency_ids(store).await?);
    Ok(store.list_packages(&query).await?)
}

pub async fn search_packages<S: Store>(
    store: &S,
    params: PackageParams,
) -> Result<Page<Package>, ApiError> {
    list_packages(store, PackageQuery::from_params(params)?).await
}

pub async fn list_guides<S: Store>(
    store: &S,
    mut query: GuideQuery,
) -> Result<Page<GuideProfile>, ApiError> {
    query.excluded_accounts = inactive_guide_accounts(store).await?;
    Ok(store.list_guides(&query).await?)
}

pub async fn search_guides<S: Store>(
    store: &S,
    params: GuideParams,
) -> Result<Page<GuideProfile>, ApiError> {
    list_guides(store, GuideQuery::from_params(params)?).await
}

pub async fn list_agencies<S: Store>(
    store: &S,
    mut query: AgencyQuery,
) -> Result<Page<AgencyProfile>, ApiError> {
    query.account_ids = Some(visible_agency_accounts(store).await?);
    Ok(store.list_agencies(&query).await?)
}

pub async fn search_agencies<S: Store>(
    store: &S,
    params: AgencyParams,
) -> Result<Page<AgencyProfile>, ApiError> {
    list_agencies(store, AgencyQuery::from_params(params)?).await
}

async fn agency_is_visible<S: Store>(store: &S, agency: &AgencyProfile) -> Result<bool, ApiError> {
    Ok(store
        .get_account(&agency.account_id)
        .await?
        .map_or(false, |account| account.is_approved && account.is_active))
}

pub async fn visible_agency<S: Store>(store: &S, id: &str) -> Result<AgencyProfile, ApiError> {
    let not_found = || ApiError::NotFound("Agency not found".to_string());
    let agency = store.get_agency(id).await?.ok_or_else(not_found)?;
    if !agency_is_visible(store, &agency).await? {
        return Err(not_found());
    }
    Ok(agency)
}

pub async fn visible_package<S: Store>(store: &S, id: &str) -> Result<Package, ApiError> {
    let not_found = || ApiError::NotFound("Package not found".to_string());
    let package = store
        .get_package(id)
        .await?
        .filter(|package| package.is_active)
        .ok_or_else(not_found)?;
    let agency = store
        .get_agency(&package.agency_id)
        .await?
        .ok_or_else(not_found)?;
    if !agency_is_visible(store, &agency).await? {
        return Err(not_found());
    }
    Ok(package)
}

pub async fn visible_guide<S: Store>(store: &S, id: &str) -> Result<GuideProfile, ApiError> {
    let not_found = || ApiError::NotFound("Guide not found".to_string());
    let guide = store.get_guide(id).await?.ok_or_else(not_found)?;
    if let Some(account_id) = &guide.account_id {
        let active = store
            .get_account(account_id)
            .await?
            .map_or(false, |account| account.is_active);
        if !active {
            return Err(not_found());
        }
    }
    Ok(guide)
}

/// Fails with `NotFound` unless the target is visible in the catalog.
pub async fn ensure_visible<S: Store>(store: &S, target: &Target) -> Result<(), ApiError> {
    match target {
        Target::Package(id) => visible_package(store, id).await.map(|_| ()),
        Target::Guide(id) => visible_guide(store, id).await.map(|_| ()),
        Target::Agency(id) => visible_agency(store, id).await.map(|_| ()),
    }
}

/// Ratings of a visible target, newest first.
pub async fn target_ratings<S: Store>(store: &S, target: Target) -> Result<Vec<Rating>, ApiError> {
    ensure_visible(store, &target).await?;
    let filter = RatingFilter {
        tourist_id: None,
        target: Some(target),
    };
    Ok(store.list_ratings(&filter).await?)
}

pub async fn agency_guides<S: Store>(
    store: &S,
    agency_id: &str,
) -> Result<Page<GuideProfile>, ApiError> {
    let agency = visible_agency(store, agency_id).await?;
    list_guides(store, GuideQuery::with_ids(agency.managed_guides)).await
}

pub async fn agency_packages<S: Store>(
    store: &S,
    agency_id: &str,
    params: PackageParams,
) -> Result<Page<Package>, ApiError> {
    let agency = visible_agency(store, agency_id).await?;
    let mut query = PackageQuery::from_params(params)?;
    query.agency_id = Some(agency.id);
    list_packages(store, query).await
}

/// Top rated packages, guides and agencies.
pub async fn homepage<S: Store>(store: &S) -> Result<HomepageContent, ApiError> {
    let first = Pagination::first(HOMEPAGE_ITEMS);

    let mut packages = PackageQuery::from_params(PackageParams::default())?;
    packages.pagination = first;
    let mut guides = GuideQuery::from_params(GuideParams::default())?;
    guides.pagination = first;
    let mut agencies = AgencyQuery::from_params(AgencyParams::default())?;
    agencies.pagination = first;

    Ok(HomepageContent {
        packages: list_packages(store, packages).await?.results,
        guides: list_guides(store, guides).await?.results,
        agencies: list_agencies(store, agencies).await?.results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::account::Account;
    use crate::models::package::PackageType;
    use rust_decimal_macros::dec;

    async fn agency(store: &MemoryStore, name: &str, approved: bool) -> AgencyProfile {
        let mut account = Account::new(
            name.into(),
            format!("{}@example.com", name),
            "hash".into(),
            UserRole::Agency,
        );
        account.is_approved = approved;
        store.insert_account(&account).await.unwrap();
        let profile = AgencyProfile::new(&account.id);
        store.insert_agency(&profile).await.unwrap();
        profile
    }

    async fn package(store: &MemoryStore, agency_id: &str, name: &str, rating: f64) -> Package {
        let package = Package {
            id: uuid::Uuid::new_v4().to_string(),
            agency_id: agency_id.into(),
            name: name.into(),
            description: "Trek".into(),
            package_type: PackageType::Adventure,
            duration_days: 3,
            price: dec!(100.00),
            max_people: 10,
            included_services: vec![],
            excluded_services: vec![],
            destinations: vec!["Pokhara".into()],
            itinerary: vec![],
            images: vec![],
            is_active: true,
            average_rating: rating,
            total_bookings: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        store.insert_package(&package).await.unwrap();
        package
    }

    #[actix_rt::test]
    async fn unapproved_agency_packages_are_hidden() {
        let store = MemoryStore::new();
        let approved = agency(&store, "open", true).await;
        let pending = agency(&store, "pending", false).await;
        let visible = package(&store, &approved.id, "Annapurna", 4.0).await;
        let hidden = package(&store, &pending.id, "Everest", 5.0).await;

        let page = search_packages(&store, PackageParams::default()).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].id, visible.id);
        assert!(matches!(
            visible_package(&store, &hidden.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(visible_agency(&store, &pending.id).await.is_err());
    }

    #[actix_rt::test]
    async fn inactive_packages_are_hidden() {
        let store = MemoryStore::new();
        let approved = agency(&store, "open", true).await;
        let mut retired = package(&store, &approved.id, "Old trail", 3.0).await;
        retired.is_active = false;
        store.save_package(&retired).await.unwrap();

        assert_eq!(search_packages(&store, PackageParams::default()).await.unwrap().count, 0);
        assert!(visible_package(&store, &retired.id).await.is_err());
    }

    #[actix_rt::test]
    async fn guides_of_disabled_accounts_are_hidden() {
        let store = MemoryStore::new();
        let standalone = GuideProfile::new(None);
        store.insert_guide(&standalone).await.unwrap();

        let mut account = Account::new("g".into(), "g@example.com".into(), "h".into(), UserRole::Guide);
        account.is_active = false;
        store.insert_account(&account).await.unwrap();
        let linked = GuideProfile::new(Some(&account.id));
        store.insert_guide(&linked).await.unwrap();

        let page = search_guides(&store, GuideParams::default()).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].id, standalone.id);
        assert!(visible_guide(&store, &linked.id).await.is_err());
    }

    #[actix_rt::test]
    async fn homepage_is_capped_and_sorted_by_rating() {
        let store = MemoryStore::new();
        let approved = agency(&store, "open", true).await;
        for i in 0..8 {
            package(&store, &approved.id, &format!("p{}", i), i as f64 / 2.0).await;
        }
        let content = homepage(&store).await.unwrap();
        assert_eq!(content.packages.len(), 6);
        assert_eq!(content.packages[0].average_rating, 3.5);
        assert_eq!(content.agencies.len(), 1);
    }
}
