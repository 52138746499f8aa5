use std::env;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE_NAME: &str = "guide_marketplace";
const DEV_JWT_SECRET: &str = "development-only-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    /// bcrypt work factor for stored passwords.
    pub password_cost: u32,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SocialSettings {
    pub google_client_id: Option<String>,
    pub facebook_app_id: Option<String>,
    pub facebook_app_secret: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageSettings {
    pub bucket: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub database_name: String,
    pub frontend_url: String,
    pub auth: AuthSettings,
    pub social: SocialSettings,
    pub images: ImageSettings,
    pub admin_bootstrap: Option<AdminBootstrap>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            store: StoreBackend::Memory,
            mongodb_uri: None,
            database_name: DATABASE_NAME.to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            auth: AuthSettings::new(DEV_JWT_SECRET),
            social: SocialSettings::default(),
            images: ImageSettings::default(),
            admin_bootstrap: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| HOST.to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw.clone()))?,
            Err(_) => PORT,
        };

        let mongodb_uri = non_empty("MONGODB_URI");
        let store = match env::var("STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("mongo") | Err(_) => StoreBackend::Mongo,
            Ok(other) => return Err(ConfigError::Invalid("STORE", other.to_string())),
        };
        if store == StoreBackend::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }

        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if cfg!(debug_assertions) => {
                log::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };
        let mut auth = AuthSettings::new(jwt_secret);
        if let Some(raw) = non_empty("ACCESS_TOKEN_TTL_MINUTES") {
            auth.access_ttl_minutes = parse_positive("ACCESS_TOKEN_TTL_MINUTES", &raw)?;
        }
        if let Some(raw) = non_empty("REFRESH_TOKEN_TTL_DAYS") {
            auth.refresh_ttl_days = parse_positive("REFRESH_TOKEN_TTL_DAYS", &raw)?;
        }
        if let Some(raw) = non_empty("BCRYPT_COST") {
            auth.password_cost = match raw.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => return Err(ConfigError::Invalid("BCRYPT_COST", raw)),
            };
        }

        let admin_bootstrap = match (
            non_empty("ADMIN_EMAIL"),
            non_empty("ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                username: non_empty("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            store,
            mongodb_uri,
            database_name: non_empty("DATABASE_NAME").unwrap_or_else(|| DATABASE_NAME.to_string()),
            frontend_url: non_empty("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            auth,
            social: SocialSettings {
                google_client_id: non_empty("GOOGLE_CLIENT_ID"),
                facebook_app_id: non_empty("FACEBOOK_APP_ID"),
                facebook_app_secret: non_empty("FACEBOOK_APP_SECRET"),
            },
            images: ImageSettings {
                bucket: non_empty("IMAGE_BUCKET"),
            },
            admin_bootstrap,
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_positive(key: &'static str, raw: &str) -> Result<i64, ConfigError> {
    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid(key, raw.to_string())),
    }
}
