use actix_web::{web, HttpResponse};

use crate::db::Store;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::profile::{AgencyProfileUpdate, GuideProfileUpdate, TouristProfileUpdate};
use crate::services::{account_service, profile_service};

pub async fn get_tourist<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let profile = profile_service::tourist_profile(store.get_ref(), &account).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_tourist<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    input: web::Json<TouristProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let profile =
        profile_service::update_tourist_profile(store.get_ref(), &account, input.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn get_guide<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let profile = profile_service::guide_profile(store.get_ref(), &account).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_guide<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    input: web::Json<GuideProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let profile =
        profile_service::update_guide_profile(store.get_ref(), &account, input.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn get_agency<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let profile = profile_service::agency_profile(store.get_ref(), &account).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_agency<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
    input: web::Json<AgencyProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let account = account_service::load_active_account(store.get_ref(), &user.account_id).await?;
    let profile =
        profile_service::update_agency_profile(store.get_ref(), &account, input.into_inner())
            .await?;
    Ok(HttpResponse::Ok().json(profile))
}
