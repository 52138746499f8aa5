use std::future::{ready, Ready};

use actix_web::{dev::Payload, Error, FromRequest, HttpMessage, HttpRequest};

use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::models::account::UserRole;

/// The caller behind a request that passed `AuthMiddleware`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account_id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<Claims>().map(|claims| AuthenticatedUser {
            account_id: claims.sub.clone(),
            username: claims.username.clone(),
            email: claims.email.clone(),
            role: claims.role,
        });
        ready(user.ok_or_else(|| {
            ApiError::Authentication("User not authenticated".to_string()).into()
        }))
    }
}
