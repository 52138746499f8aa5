use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::models::account::UserRole;

/// Admits callers whose token carries `role`. Admins always pass.
/// Must sit inside `AuthMiddleware`.
pub struct RequireRole {
    role: UserRole,
}

impl RequireRole {
    pub fn new(role: UserRole) -> Self {
        RequireRole { role }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            role: self.role,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    role: UserRole,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let role = req.extensions().get::<Claims>().map(|claims| claims.role);

        let denial = match role {
            Some(role) if role == UserRole::Admin || role == self.role => None,
            Some(role) => {
                log::debug!("Role {} denied access to {}", role, req.path());
                Some(ApiError::Permission(
                    "You do not have permission to perform this action".to_string(),
                ))
            }
            None => Some(ApiError::Authentication("User not authenticated".to_string())),
        };

        match denial {
            None => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Some(err) => {
                let response = req.error_response(err).map_into_right_body();
                Box::pin(ready(Ok(response)))
            }
        }
    }
}
