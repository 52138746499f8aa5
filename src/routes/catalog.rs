use actix_web::{web, HttpResponse};

use crate::db::Store;
use crate::error::ApiError;
use crate::models::catalog::{AgencyParams, GuideParams, PackageParams};
use crate::models::target::Target;
use crate::services::catalog_service;

pub async fn list_packages<S: Store>(
    store: web::Data<S>,
    params: web::Query<PackageParams>,
) -> Result<HttpResponse, ApiError> {
    let page = catalog_service::search_packages(store.get_ref(), params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_package<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let package = catalog_service::visible_package(store.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(package))
}

pub async fn package_ratings<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let ratings =
        catalog_service::target_ratings(store.get_ref(), Target::Package(path.into_inner()))
            .await?;
    Ok(HttpResponse::Ok().json(ratings))
}

pub async fn list_guides<S: Store>(
    store: web::Data<S>,
    params: web::Query<GuideParams>,
) -> Result<HttpResponse, ApiError> {
    let page = catalog_service::search_guides(store.get_ref(), params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_guide<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let guide = catalog_service::visible_guide(store.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(guide))
}

pub async fn guide_ratings<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let ratings =
        catalog_service::target_ratings(store.get_ref(), Target::Guide(path.into_inner())).await?;
    Ok(HttpResponse::Ok().json(ratings))
}

pub async fn list_agencies<S: Store>(
    store: web::Data<S>,
    params: web::Query<AgencyParams>,
) -> Result<HttpResponse, ApiError> {
    let page = catalog_service::search_agencies(store.get_ref(), params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_agency<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let agency = catalog_service::visible_agency(store.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(agency))
}

pub async fn agency_ratings<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let ratings =
        catalog_service::target_ratings(store.get_ref(), Target::Agency(path.into_inner()))
            .await?;
    Ok(HttpResponse::Ok().json(ratings))
}

pub async fn agency_guides<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let guides = catalog_service::agency_guides(store.get_ref(), &path).await?;
    Ok(HttpResponse::Ok().json(guides))
}

pub async fn agency_packages<S: Store>(
    store: web::Data<S>,
    path: web::Path<String>,
    params: web::Query<PackageParams>,
) -> Result<HttpResponse, ApiError> {
    let packages =
        catalog_service::agency_packages(store.get_ref(), &path, params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(packages))
}

pub async fn homepage<S: Store>(store: web::Data<S>) -> Result<HttpResponse, ApiError> {
    let content = catalog_service::homepage(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(content))
}

pub fn config<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/packages")
            .route("", web::get().to(list_packages::<S>))
            .route("/{id}", web::get().to(get_package::<S>))
            .route("/{id}/ratings", web::get().to(package_ratings::<S>)),
    )
    .service(
        web::scope("/guides")
            .route("", web::get().to(list_guides::<S>))
            .route("/{id}", web::get().to(get_guide::<S>))
            .route("/{id}/ratings", web::get().to(guide_ratings::<S>)),
    )
    .service(
        web::scope("/agencies")
            .route("", web::get().to(list_agencies::<S>))
            .route("/{id}", web::get().to(get_agency::<S>))
            .route("/{id}/ratings", web::get().to(agency_ratings::<S>))
            .route("/{id}/guides", web::get().to(agency_guides::<S>))
            .route("/{id}/packages", web::get().to(agency_packages::<S>)),
    )
    .route("/homepage/content", web::get().to(homepage::<S>));
}
