use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::Settings;
use crate::db::Store;
use crate::services::account_service;
use crate::services::image_service::ImageService;

fn cors(frontend_url: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_url)
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Bootstraps the admin account, then serves the API on `store` until shutdown.
pub async fn run<S: Store>(settings: Settings, store: S) -> std::io::Result<()> {
    if let Some(bootstrap) = &settings.admin_bootstrap {
        if let Err(e) = account_service::ensure_admin(&store, bootstrap, &settings.auth).await {
            log::error!("Admin bootstrap failed: {}", e);
        }
    }

    let images = web::Data::new(ImageService::from_settings(&settings.images).await);
    let http = web::Data::new(reqwest::Client::new());
    let store = web::Data::new(store);
    let bind = (settings.host.clone(), settings.port);
    let settings = web::Data::new(settings);

    log::info!("Starting HTTP server on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&settings.frontend_url))
            .wrap(Logger::default())
            .app_data(settings.clone())
            .app_data(store.clone())
            .app_data(images.clone())
            .app_data(http.clone())
            .configure(routes::configure::<S>)
    })
    .bind(bind)?
    .run()
    .await
}
