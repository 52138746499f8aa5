use actix_web::{web, HttpResponse};

use crate::db::Store;
use crate::error::ApiError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::middleware::role_auth::RequireRole;
use crate::models::account::UserRole;
use crate::models::bookings::BookingRequest;
use crate::models::rating::RatingRequest;
use crate::services::{account_service, booking_service, rating_service};

pub async fn list_bookings<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let bookings = booking_service::tourist_bookings(store.get_ref(), &account).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn create_booking<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    input: web::Json<BookingRequest>,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let booking =
        booking_service::create_booking(store.get_ref(), &account, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(booking))
}

pub async fn get_booking<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let booking = booking_service::tourist_booking(store.get_ref(), &account, &path).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn cancel_booking<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let booking = booking_service::cancel_booking(store.get_ref(), &account, &path).await?;
    Ok(HttpResponse::Ok().json(booking))
}

pub async fn list_ratings<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let ratings = rating_service::tourist_ratings(store.get_ref(), &account).await?;
    Ok(HttpResponse::Ok().json(ratings))
}

pub async fn create_rating<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    input: web::Json<RatingRequest>,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let rating =
        rating_service::create_rating(store.get_ref(), &account, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(rating))
}

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tourist")
            .wrap(RequireRole::new(UserRole::Tourist))
            .wrap(AuthMiddleware)
            .service(
                web::resource("/bookings")
                    .route(web::get().to(list_bookings::<S>))
                    .route(web::post().to(create_booking::<S>)),
            )
            .route("/bookings/{id}", web::get().to(get_booking::<S>))
            .route("/bookings/{id}/cancel", web::post().to(cancel_booking::<S>))
            .service(
                web::resource("/ratings")
                    .route(web::get().to(list_ratings::<S>))
                    .route(web::post().to(create_rating::<S>)),
            ),
    );
}
