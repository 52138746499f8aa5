use actix_web::{error, web, HttpRequest};

use crate::db::Store;
use crate::error::ApiError;

pub mod account;
pub mod admin;
pub mod agency;
pub mod catalog;
pub mod health;
pub mod tourist;

/// Malformed bodies surface as field-less validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _: &HttpRequest| {
        log::debug!("Rejected JSON body: {}", err);
        ApiError::validation("body", err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, _: &HttpRequest| {
        ApiError::validation("query", err.to_string()).into()
    })
}

/// Registers the whole API. The app must provide `Data<S>`, `Data<Settings>`,
/// `Data<ImageService>` and `Data<reqwest::Client>`.
pub fn configure<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/health", web::get().to(health::health_check::<S>))
        .service(
            web::scope("/api")
                .configure(account::config::<S>)
                .configure(catalog::config::<S>)
                .configure(tourist::config::<S>)
                .configure(agency::config::<S>)
                .configure(admin::config::<S>),
        );
}
