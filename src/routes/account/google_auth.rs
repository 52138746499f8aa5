use actix_web::{web, HttpResponse};
use reqwest::Client as ReqwestClient;

use crate::config::Settings;
use crate::db::Store;
use crate::error::ApiError;
use crate::models::google_auth::GoogleLoginRequest;
use crate::services::image_service::ImageService;
use crate::services::{google_auth_service, social_auth_service};

// Sign in with a Google ID token obtained by the client
pub async fn google_login<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    images: web::Data<ImageService>,
    http: web::Data<ReqwestClient>,
    input: web::Json<GoogleLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if input.token.trim().is_empty() {
        return Err(ApiError::validation("token", "this field is required"));
    }

    let identity =
        google_auth_service::verify_google_token(&http, &settings.social, &input.token).await?;
    let response =
        social_auth_service::sign_in(store.get_ref(), &settings.auth, &images, &http, identity)
            .await?;
    Ok(HttpResponse::Ok().json(response))
}
