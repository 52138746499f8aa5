use std::io;

use env_logger::Env;

use tourguide_api::config::{Settings, StoreBackend};
use tourguide_api::db::{mongo, MemoryStore, MongoStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    match settings.store {
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on shutdown");
            tourguide_api::run(settings, MemoryStore::new()).await
        }
        StoreBackend::Mongo => {
            let uri = settings.mongodb_uri.clone().unwrap_or_default();
            let client = mongo::create_mongo_client(&uri)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            let store = MongoStore::new(&client, &settings.database_name);
            store
                .ensure_indexes()
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            tourguide_api::run(settings, store).await
        }
    }
}
