use actix_web::web;

use crate::db::Store;
use crate::middleware::auth::AuthMiddleware;

pub mod auth;
pub mod facebook_auth;
pub mod google_auth;
pub mod profile;

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register::<S>))
            .route("/login", web::post().to(auth::login::<S>))
            .route("/refresh", web::post().to(auth::refresh::<S>))
            .route("/logout", web::post().to(auth::logout::<S>))
            .route("/google_login", web::post().to(google_auth::google_login::<S>))
            .route(
                "/facebook_login",
                web::post().to(facebook_auth::facebook_login::<S>),
            )
            .service(
                web::resource("/profile")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::profile::<S>)),
            ),
    )
    .service(
        web::scope("/profile")
            .wrap(AuthMiddleware)
            .service(
                web::resource("/tourist")
                    .route(web::get().to(profile::get_tourist::<S>))
                    .route(web::put().to(profile::update_tourist::<S>)),
            )
            .service(
                web::resource("/guide")
                    .route(web::get().to(profile::get_guide::<S>))
                    .route(web::put().to(profile::update_guide::<S>)),
            )
            .service(
                web::resource("/agency")
                    .route(web::get().to(profile::get_agency::<S>))
                    .route(web::put().to(profile::update_agency::<S>)),
            ),
    );
}
