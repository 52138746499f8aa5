use crate::db::store::Store;
use crate::error::ApiError;
use crate::models::account::Account;
use crate::models::package::Package;
use crate::models::profile::{AgencyProfile, GuideProfile};
use crate::models::rating::{self, Rating, RatingFilter, RatingRequest};
use crate::models::target::Target;
use crate::services::{account_service, catalog_service};

/// An entity that caches the mean of its ratings.
pub trait RateTarget {
    fn average_rating(&self) -> f64;
    fn set_average_rating(&mut self, average: f64);
}

impl RateTarget for Package {
    fn average_rating(&self) -> f64 {
        self.average_rating
    }

    fn set_average_rating(&mut self, average: f64) {
        self.average_rating = average;
    }
}

impl RateTarget for GuideProfile {
    fn average_rating(&self) -> f64 {
        self.average_rating
    }

    fn set_average_rating(&mut self, average: f64) {
        self.average_rating = average;
    }
}

impl RateTarget for AgencyProfile {
    fn average_rating(&self) -> f64 {
        self.average_rating
    }

    fn set_average_rating(&mut self, average: f64) {
        self.average_rating = average;
    }
}

/// Returns true when the cached value changed.
fn apply_average(entity: &mut impl RateTarget, average: f64) -> bool {
    if (entity.average_rating() - average).abs() < f64::EPSILON {
        return false;
    }
    entity.set_average_rating(average);
    true
}

/// Recomputes the mean of every rating of `target` and caches it.
pub async fn refresh_average<S: Store>(store: &S, target: &Target) -> Result<f64, ApiError> {
    let ratings = store
        .list_ratings(&RatingFilter {
            tourist_id: None,
            target: Some(target.clone()),
        })
        .await?;
    let average = rating::average(ratings.iter().map(|r| r.rating));

    match target {
        Target::Package(id) => {
            if let Some(mut package) = store.get_package(id).await? {
                if apply_average(&mut package, average) {
                    store.save_package(&package).await?;
                }
            }
        }
        Target::Guide(id) => {
            if let Some(mut guide) = store.get_guide(id).await? {
                if apply_average(&mut guide, average) {
                    store.save_guide(&guide).await?;
                }
            }
        }
        Target::Agency(id) => {
            if let Some(mut agency) = store.get_agency(id).await? {
                if apply_average(&mut agency, average) {
                    store.save_agency(&agency).await?;
                }
            }
        }
    }
    Ok(average)
}

pub fn require_customer(account: &Account) -> Result<(), ApiError> {
    if !account.can_book_services() {
        return Err(ApiError::Permission(
            "Only active, approved tourists can book or rate".to_string(),
        ));
    }
    Ok(())
}

/// One rating per (tourist, target); a repeat fails with `Conflict`. A failed
/// average refresh is logged and does not fail the request.
pub async fn create_rating<S: Store>(
    store: &S,
    account: &Account,
    request: RatingRequest,
) -> Result<Rating, ApiError> {
    require_customer(account)?;
    let target = request.target.resolve(request.rating_type)?;
    request.validate_stars().into_result()?;
    catalog_service::ensure_visible(store, &target).await?;

    let tourist = account_service::ensure_tourist_profile(store, &account.id).await?;
    // Range checked above.
    let stars = request.rating.clamp(rating::MIN_STARS, rating::MAX_STARS) as u8;
    let rating = Rating::new(&tourist.id, target, stars, request.review);
    store.insert_rating(&rating).await?;

    // The rating is stored at this point. The cached average is derived from
    // all ratings and is recomputed by the next successful refresh.
    match refresh_average(store, &rating.target).await {
        Ok(average) => log::info!(
            "{} rated {} with {} stars (average now {:.2})",
            account.username,
            rating.target,
            rating.rating,
            average
        ),
        Err(err) => log::warn!(
            "{} rated {} but refreshing its average failed: {}",
            account.username,
            rating.target,
            err
        ),
    }
    Ok(rating)
}

pub async fn tourist_ratings<S: Store>(store: &S, account: &Account) -> Result<Vec<Rating>, ApiError> {
    require_customer(account)?;
    let tourist = account_service::ensure_tourist_profile(store, &account.id).await?;
    Ok(store
        .list_ratings(&RatingFilter {
            tourist_id: Some(tourist.id),
            target: None,
        })
        .await?)
}
