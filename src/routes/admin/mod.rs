use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::db::Store;
use crate::error::ApiError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::account::{AccountView, UserRole};
use crate::services::approval_service::{self, AgencyDecision};

pub async fn pending_agencies<S: Store>(store: web::Data<S>) -> Result<HttpResponse, ApiError> {
    let pending = approval_service::pending_agencies(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(pending))
}

pub async fn approve_agency<S: Store>(
    store: web::Data<S>,
    input: web::Json<AgencyDecision>,
) -> Result<HttpResponse, ApiError> {
    let account = approval_service::approve_agency(store.get_ref(), &input.agency_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Agency approved successfully",
        "user": AccountView::from(&account),
    })))
}

pub async fn reject_agency<S: Store>(
    store: web::Data<S>,
    input: web::Json<AgencyDecision>,
) -> Result<HttpResponse, ApiError> {
    let account = approval_service::reject_agency(store.get_ref(), &input.agency_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Agency rejected",
        "user": AccountView::from(&account),
    })))
}

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(RequireRole::new(UserRole::Admin))
            .wrap(AuthMiddleware)
            .route("/pending_agencies", web::get().to(pending_agencies::<S>))
            .route("/approve_agency", web::post().to(approve_agency::<S>))
            .route("/reject_agency", web::post().to(reject_agency::<S>)),
    );
}
