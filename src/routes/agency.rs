use actix_web::{web, HttpResponse};

use crate::db::Store;
use crate::error::ApiError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::middleware::role_auth::RequireRole;
use crate::models::account::UserRole;
use crate::models::bookings::{BookingQuote, BookingStatusUpdate};
use crate::models::catalog::PackageParams;
use crate::models::package::{PackageInput, PackageUpdate};
use crate::models::profile::AgencyProfile;
use crate::services::agency_service::{self, AddGuide, AgencyBookingParams, PackageImages};
use crate::services::account_service;
use crate::services::image_service::ImageService;

async fn caller_agency<S: Store>(
    store: &S,
    user: &AuthenticatedUser,
) -> Result<AgencyProfile, ApiError> {
    let account = account_service::load_active_account(store, &user.account_id).await?;
    agency_service::manager(store, &account).await
}

pub async fn list_packages<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    params: web::Query<PackageParams>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let packages =
        agency_service::own_packages(store.get_ref(), &agency, params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(packages))
}

pub async fn create_package<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    input: web::Json<PackageInput>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let package =
        agency_service::create_package(store.get_ref(), &agency, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(package))
}

pub async fn get_package<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let package = agency_service::own_package(store.get_ref(), &agency, &path).await?;
    Ok(HttpResponse::Ok().json(package))
}

pub async fn update_package<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<PackageUpdate>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let package =
        agency_service::update_package(store.get_ref(), &agency, &path, input.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(package))
}

pub async fn delete_package<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    agency_service::delete_package(store.get_ref(), &agency, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn upload_package_images<S: Store>(
    store: web::Data<S>,
    images: web::Data<ImageService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<PackageImages>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let outcome = agency_service::upload_package_images(
        store.get_ref(),
        &images,
        &agency,
        &path,
        input.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub async fn list_guides<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let guides = agency_service::managed_guides(store.get_ref(), &agency).await?;
    Ok(HttpResponse::Ok().json(guides))
}

pub async fn add_guide<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    input: web::Json<AddGuide>,
) -> Result<HttpResponse, ApiError> {
    let mut agency = caller_agency(store.get_ref(), &user).await?;
    let guide = agency_service::add_guide(store.get_ref(), &mut agency, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(guide))
}

pub async fn remove_guide<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let mut agency = caller_agency(store.get_ref(), &user).await?;
    agency_service::remove_guide(store.get_ref(), &mut agency, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn list_bookings<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    params: web::Query<AgencyBookingParams>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let bookings =
        agency_service::agency_bookings(store.get_ref(), &agency, params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn update_booking_status<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<BookingStatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let booking =
        agency_service::update_booking_status(store.get_ref(), &agency, &path, input.status)
            .await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn quote_booking<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<BookingQuote>,
) -> Result<HttpResponse, ApiError> {
    let agency = caller_agency(store.get_ref(), &user).await?;
    let booking =
        agency_service::quote_booking(store.get_ref(), &agency, &path, input.total_price).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/agency/manage")
            .wrap(RequireRole::new(UserRole::Agency))
            .wrap(AuthMiddleware)
            .service(
                web::resource("/packages")
                    .route(web::get().to(list_packages::<S>))
                    .route(web::post().to(create_package::<S>)),
            )
            .service(
                web::resource("/packages/{id}")
                    .route(web::get().to(get_package::<S>))
                    .route(web::put().to(update_package::<S>))
                    .route(web::delete().to(delete_package::<S>)),
            )
            .route(
                "/packages/{id}/images",
                web::post().to(upload_package_images::<S>),
            )
            .service(
                web::resource("/guides")
                    .route(web::get().to(list_guides::<S>))
                    .route(web::post().to(add_guide::<S>)),
            )
            .route("/guides/{id}", web::delete().to(remove_guide::<S>))
            .route("/bookings", web::get().to(list_bookings::<S>))
            .route(
                "/bookings/{id}/status",
                web::put().to(update_booking_status::<S>),
            )
            .route("/bookings/{id}/quote", web::put().to(quote_booking::<S>)),
    );
}
