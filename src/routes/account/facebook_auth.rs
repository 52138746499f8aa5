use actix_web::{web, HttpResponse};
use reqwest::Client as ReqwestClient;

use crate::config::Settings;
use crate::db::Store;
use crate::error::ApiError;
use crate::models::facebook_auth::FacebookLoginRequest;
use crate::services::image_service::ImageService;
use crate::services::{facebook_auth_service, social_auth_service};

// Sign in with a Facebook user access token
pub async fn facebook_login<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    images: web::Data<ImageService>,
    http: web::Data<ReqwestClient>,
    input: web::Json<FacebookLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if input.access_token.trim().is_empty() {
        return Err(ApiError::validation("access_token", "this field is required"));
    }

    let identity =
        facebook_auth_service::verify_facebook_token(&http, &settings.social, &input.access_token)
            .await?;
    let response =
        social_auth_service::sign_in(store.get_ref(), &settings.auth, &images, &http, identity)
            .await?;
    Ok(HttpResponse::Ok().json(response))
}
