#![allow(dead_code)]

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use tourguide_api::config::{AdminBootstrap, Settings};
use tourguide_api::db::MemoryStore;
use tourguide_api::routes;
use tourguide_api::services::account_service;
use tourguide_api::services::image_service::ImageService;

pub const PASSWORD: &str = "testpassword123";
pub const ADMIN_EMAIL: &str = "admin@example.com";

pub struct TestApp {
    pub settings: Settings,
    pub store: web::Data<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let mut settings = Settings::default();
        settings.auth.password_cost = 4;
        Self {
            settings,
            store: web::Data::new(MemoryStore::new()),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.settings.clone()))
            .app_data(self.store.clone())
            .app_data(web::Data::new(ImageService::disabled()))
            .app_data(web::Data::new(reqwest::Client::new()))
            .configure(routes::configure::<MemoryStore>)
    }

    /// Creates the bootstrap admin straight in the store.
    pub async fn create_admin(&self) {
        let bootstrap = AdminBootstrap {
            email: ADMIN_EMAIL.to_string(),
            username: "admin".to_string(),
            password: PASSWORD.to_string(),
        };
        account_service::ensure_admin(self.store.get_ref(), &bootstrap, &self.settings.auth)
            .await
            .expect("admin bootstrap");
    }
}

pub fn register_body(username: &str, user_type: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": PASSWORD,
        "password_confirm": PASSWORD,
        "first_name": "Test",
        "last_name": "User",
        "phone_number": "5551234567",
        "user_type": user_type,
    })
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Registers `username` with the given role and returns the auth response body.
pub async fn register<S>(app: &S, username: &str, user_type: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(register_body(username, user_type))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "registering {}", username);
    test::read_body_json(resp).await
}

pub async fn login<S>(app: &S, email: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "logging in {}", email);
    let body: Value = test::read_body_json(resp).await;
    body["access"].as_str().expect("access token").to_string()
}

pub async fn access_token<S>(app: &S, username: &str, user_type: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let body = register(app, username, user_type).await;
    body["access"].as_str().expect("access token").to_string()
}

/// Registers an agency, approves it through the admin API and returns the
/// agency's access token.
pub async fn approved_agency<S>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let body = register(app, username, "agency").await;
    let account_id = body["user"]["id"].as_str().expect("account id").to_string();
    let admin = login(app, ADMIN_EMAIL).await;

    let req = test::TestRequest::post()
        .uri("/api/admin/approve_agency")
        .insert_header(bearer(&admin))
        .set_json(json!({ "agency_id": account_id }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200);

    body["access"].as_str().expect("access token").to_string()
}

pub async fn create_package<S>(app: &S, agency_token: &str, price: f64) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/agency/manage/packages")
        .insert_header(bearer(agency_token))
        .set_json(json!({
            "name": "Valley Trek",
            "description": "Five days through the valley",
            "package_type": "adventure",
            "duration_days": 5,
            "price": price,
            "max_people": 10,
            "destinations": ["Valley"],
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}
