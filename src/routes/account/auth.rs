use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::Settings;
use crate::db::Store;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::account::{LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest};
use crate::services::account_service;

pub async fn register<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    input: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let response =
        account_service::register(store.get_ref(), &settings.auth, input.into_inner()).await?;
    Ok(HttpResponse::Created().json(response))
}

pub async fn login<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    input: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let response =
        account_service::login(store.get_ref(), &settings.auth, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn refresh<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    input: web::Json<RefreshRequest>,
) -> Result<HttpResponse, ApiError> {
    let response =
        account_service::refresh(store.get_ref(), &settings.auth, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn logout<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    input: web::Json<LogoutRequest>,
) -> Result<HttpResponse, ApiError> {
    account_service::logout(store.get_ref(), &settings.auth, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Logout successful" })))
}

pub async fn profile<S: Store>(
    store: web::Data<S>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let response = account_service::profile(store.get_ref(), &user.account_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
