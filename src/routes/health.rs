use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::config::Settings;
use crate::db::Store;
use crate::services::image_service::ImageService;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    services: BTreeMap<&'static str, ServiceStatus>,
    version: &'static str,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: &'static str,
    details: Option<String>,
}

impl ServiceStatus {
    fn ok(details: impl Into<String>) -> Self {
        Self {
            status: "ok",
            details: Some(details.into()),
        }
    }

    fn disabled(details: impl Into<String>) -> Self {
        Self {
            status: "disabled",
            details: Some(details.into()),
        }
    }
}

/// Store reachability plus which optional integrations are configured. Only
/// a store failure degrades the overall status.
pub async fn health_check<S: Store>(
    store: web::Data<S>,
    settings: web::Data<Settings>,
    images: web::Data<ImageService>,
) -> HttpResponse {
    let mut services = BTreeMap::new();

    let database = match store.ping().await {
        Ok(()) => ServiceStatus::ok("store reachable"),
        Err(e) => {
            log::error!("Health check failed to reach the store: {}", e);
            ServiceStatus {
                status: "error",
                details: Some(e.to_string()),
            }
        }
    };
    let healthy = database.status == "ok";
    services.insert("database", database);

    services.insert(
        "google_auth",
        if settings.social.google_client_id.is_some() {
            ServiceStatus::ok("client id configured")
        } else {
            ServiceStatus::disabled("GOOGLE_CLIENT_ID not set")
        },
    );
    services.insert(
        "facebook_auth",
        match (
            &settings.social.facebook_app_id,
            &settings.social.facebook_app_secret,
        ) {
            (Some(_), Some(_)) => ServiceStatus::ok("app credentials configured"),
            _ => ServiceStatus::disabled("FACEBOOK_APP_ID or FACEBOOK_APP_SECRET not set"),
        },
    );
    services.insert(
        "cloud_storage",
        if images.is_enabled() {
            ServiceStatus::ok("image bucket configured")
        } else {
            ServiceStatus::disabled("IMAGE_BUCKET not set")
        },
    );

    let health = HealthStatus {
        status: if healthy { "ok" } else { "degraded" },
        services,
        version: env!("CARGO_PKG_VERSION"),
    };
    if healthy {
        HttpResponse::Ok().json(health)
    } else {
        HttpResponse::ServiceUnavailable().json(health)
    }
}
