use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::store::Store;
use crate::error::{ApiError, FieldErrors};
use crate::models::account::{Account, UserRole};
use crate::models::bookings::{Booking, BookingFilter, BookingStatus};
use crate::models::catalog::{GuideQuery, Page, PackageParams, PackageQuery};
use crate::models::package::{Package, PackageInput, PackageUpdate};
use crate::models::profile::{AgencyProfile, GuideProfile, GuideProfileUpdate};
use crate::models::target::Target;
use crate::services::image_service::{self, ImageData, ImageService, ImageUploadError};
use crate::services::{account_service, booking_service};

/// Who may run an agency's catalog.
pub trait ManagesCatalog {
    fn ensure_can_manage(&self) -> Result<(), ApiError>;
}

impl ManagesCatalog for Account {
    fn ensure_can_manage(&self) -> Result<(), ApiError> {
        if self.role != UserRole::Agency {
            return Err(ApiError::Permission(
                "Only agency accounts can manage a catalog".to_string(),
            ));
        }
        if !self.can_manage_services() {
            return Err(ApiError::Permission(
                "Agency account must be active and approved".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn manager<S: Store>(store: &S, account: &Account) -> Result<AgencyProfile, ApiError> {
    account.ensure_can_manage()?;
    account_service::ensure_agency_profile(store, &account.id).await
}

// Packages

pub async fn own_packages<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    params: PackageParams,
) -> Result<Page<Package>, ApiError> {
    let query = PackageQuery::owned_page(&agency.id, params)?;
    Ok(store.list_packages(&query).await?)
}

/// Another agency's package reads as missing.
pub async fn own_package<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    package_id: &str,
) -> Result<Package, ApiError> {
    store
        .get_package(package_id)
        .await?
        .filter(|package| package.agency_id == agency.id)
        .ok_or_else(|| ApiError::NotFound("Package not found".to_string()))
}

pub async fn create_package<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    input: PackageInput,
) -> Result<Package, ApiError> {
    input.validate().into_result()?;
    let package = input.into_package(&agency.id);
    store.insert_package(&package).await?;
    log::info!("Agency {} created package {}", agency.id, package.id);
    Ok(package)
}

pub async fn update_package<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    package_id: &str,
    update: PackageUpdate,
) -> Result<Package, ApiError> {
    let mut package = own_package(store, agency, package_id).await?;
    update.validate(&package).into_result()?;
    update.apply(&mut package);
    store.save_package(&package).await?;
    Ok(package)
}

pub async fn delete_package<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    package_id: &str,
) -> Result<(), ApiError> {
    let package = own_package(store, agency, package_id).await?;
    store.delete_package(&package.id).await?;
    log::info!("Agency {} deleted package {}", agency.id, package.id);
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct PackageImages {
    pub images: Vec<ImageData>,
}

#[derive(Debug, Serialize)]
pub struct ImageUploadOutcome {
    pub images: Vec<String>,
    pub uploaded: usize,
    pub failed: usize,
}

/// Uploads what it can; undecodable or failed images are logged and skipped.
pub async fn upload_package_images<S: Store>(
    store: &S,
    images: &ImageService,
    agency: &AgencyProfile,
    package_id: &str,
    request: PackageImages,
) -> Result<ImageUploadOutcome, ApiError> {
    let mut package = own_package(store, agency, package_id).await?;
    if request.images.is_empty() {
        return Err(ApiError::validation("images", "at least one image is required"));
    }
    if !images.is_enabled() {
        return Err(ApiError::Upstream(ImageUploadError::NotConfigured.to_string()));
    }

    let mut failed = 0;
    let mut decoded = Vec::with_capacity(request.images.len());
    for image in &request.images {
        match image_service::decode_image(image) {
            Ok(bytes) => decoded.push(bytes),
            Err(e) => {
                log::warn!("Skipping image {}: {}", image.file_name, e);
                failed += 1;
            }
        }
    }

    let prefix = format!("packages/{}", package.id);
    let mut uploaded = 0;
    for result in images.upload_images(decoded, &prefix).await {
        match result {
            Ok(url) => {
                package.images.push(url);
                uploaded += 1;
            }
            Err(_) => failed += 1,
        }
    }

    if uploaded > 0 {
        package.updated_at = chrono::Utc::now();
        store.save_package(&package).await?;
    }
    Ok(ImageUploadOutcome {
        images: package.images,
        uploaded,
        failed,
    })
}

// Guides

pub async fn managed_guides<S: Store>(
    store: &S,
    agency: &AgencyProfile,
) -> Result<Page<GuideProfile>, ApiError> {
    Ok(store
        .list_guides(&GuideQuery::with_ids(agency.managed_guides.clone()))
        .await?)
}

/// Either links an existing guide by id or creates a standalone listing.
#[derive(Debug, Default, Deserialize)]
pub struct AddGuide {
    pub guide_id: Option<String>,
    #[serde(flatten)]
    pub profile: GuideProfileUpdate,
}

pub async fn add_guide<S: Store>(
    store: &S,
    agency: &mut AgencyProfile,
    request: AddGuide,
) -> Result<GuideProfile, ApiError> {
    let guide = match request.guide_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => store
            .get_guide(&id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Guide not found".to_string()))?,
        None => {
            let mut errors = request.profile.validate();
            if request
                .profile
                .display_name
                .as_deref()
                .map_or(true, |name| name.trim().is_empty())
            {
                errors.add("display_name", "required for a new guide listing");
            }
            errors.into_result()?;

            let mut guide = GuideProfile::new(None);
            request.profile.apply(&mut guide);
            store.insert_guide(&guide).await?;
            guide
        }
    };

    if !agency.managed_guides.contains(&guide.id) {
        agency.managed_guides.push(guide.id.clone());
        store.save_agency(agency).await?;
        log::info!("Agency {} now manages guide {}", agency.id, guide.id);
    }
    Ok(guide)
}

pub async fn remove_guide<S: Store>(
    store: &S,
    agency: &mut AgencyProfile,
    guide_id: &str,
) -> Result<(), ApiError> {
    let before = agency.managed_guides.len();
    agency.managed_guides.retain(|id| id != guide_id);
    if agency.managed_guides.len() == before {
        return Err(ApiError::NotFound(
            "Guide is not managed by this agency".to_string(),
        ));
    }
    store.save_agency(agency).await?;
    Ok(())
}

// Bookings

/// The agency itself, its packages and its managed guides.
pub async fn booking_targets<S: Store>(
    store: &S,
    agency: &AgencyProfile,
) -> Result<Vec<Target>, ApiError> {
    let mut targets = vec![Target::Agency(agency.id.clone())];
    let mut query = PackageQuery::owned_by(&agency.id);
    loop {
        let page = store.list_packages(&query).await?;
        let fetched = page.results.len() as u64;
        targets.extend(page.results.into_iter().map(|package| Target::Package(package.id)));
        if fetched == 0 || query.pagination.page * query.pagination.page_size >= page.count {
            break;
        }
        query.pagination.page += 1;
    }
    targets.extend(agency.managed_guides.iter().cloned().map(Target::Guide));
    Ok(targets)
}

#[derive(Debug, Default, Deserialize)]
pub struct AgencyBookingParams {
    pub status: Option<BookingStatus>,
}

pub async fn agency_bookings<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    params: AgencyBookingParams,
) -> Result<Vec<Booking>, ApiError> {
    let filter = BookingFilter {
        tourist_id: None,
        targets: Some(booking_targets(store, agency).await?),
        status: params.status,
    };
    Ok(store.list_bookings(&filter).await?)
}

pub async fn agency_booking<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    booking_id: &str,
) -> Result<Booking, ApiError> {
    let targets = booking_targets(store, agency).await?;
    store
        .get_booking(booking_id)
        .await?
        .filter(|booking| targets.contains(&booking.target))
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))
}

pub async fn update_booking_status<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    booking_id: &str,
    next: BookingStatus,
) -> Result<Booking, ApiError> {
    let booking = agency_booking(store, agency, booking_id).await?;
    booking_service::transition(store, agency, booking, next).await
}

pub async fn quote_booking<S: Store>(
    store: &S,
    agency: &AgencyProfile,
    booking_id: &str,
    total: Decimal,
) -> Result<Booking, ApiError> {
    let booking = agency_booking(store, agency, booking_id).await?;
    if booking.target != Target::Agency(agency.id.clone()) {
        return Err(ApiError::Validation(FieldErrors::single(
            "total_price",
            "only bookings of the agency itself are quoted",
        )));
    }
    booking_service::quote(store, booking, total).await
}
