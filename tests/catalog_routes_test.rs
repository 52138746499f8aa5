mod common;

use actix_web::test;
use serde_json::{json, Value};

use common::{access_token, approved_agency, bearer, create_package, login, register, TestApp, ADMIN_EMAIL};

#[actix_rt::test]
async fn test_unapproved_agency_is_hidden_from_catalog() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "hidden_tours", "agency").await;
    let agency_token = body["access"].as_str().unwrap().to_string();
    let account_id = body["user"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/profile/agency")
        .insert_header(bearer(&agency_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let profile: Value = test::read_body_json(resp).await;
    let agency_uri = format!("/api/agencies/{}", profile["_id"].as_str().unwrap());

    let req = test::TestRequest::get().uri("/api/agencies").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["count"], 0);

    let req = test::TestRequest::get().uri(&agency_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let admin = login(&app, ADMIN_EMAIL).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/approve_agency")
        .insert_header(bearer(&admin))
        .set_json(json!({ "agency_id": account_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri(&agency_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn test_rejected_agency_packages_disappear() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "fading_tours").await;
    let package = create_package(&app, &agency, 120.0).await;
    let package_uri = format!("/api/packages/{}", package["_id"].as_str().unwrap());

    let req = test::TestRequest::get().uri("/api/packages").to_request();
    let resp = test::call_service(&app, req).await;
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["name"], "Valley Trek");

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(&agency))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let me: Value = test::read_body_json(resp).await;

    let admin = login(&app, ADMIN_EMAIL).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/reject_agency")
        .insert_header(bearer(&admin))
        .set_json(json!({ "agency_id": me["user"]["id"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/api/packages").to_request();
    let resp = test::call_service(&app, req).await;
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["count"], 0);

    let req = test::TestRequest::get().uri(&package_uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_package_search_and_bad_query() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "search_tours").await;
    create_package(&app, &agency, 90.0).await;

    let req = test::TestRequest::get()
        .uri("/api/packages?search=valley")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/packages?search=desert")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["count"], 0);

    let req = test::TestRequest::get()
        .uri("/api/packages?page_size=0")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_rating_updates_average_and_rejects_duplicates() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "rated_tours").await;
    let package = create_package(&app, &agency, 75.0).await;
    let package_id = package["_id"].as_str().unwrap().to_string();

    let first = access_token(&app, "critic_one", "tourist").await;
    let second = access_token(&app, "critic_two", "tourist").await;

    for (token, stars) in [(&first, 5), (&second, 4)] {
        let req = test::TestRequest::post()
            .uri("/api/tourist/ratings")
            .insert_header(bearer(token))
            .set_json(json!({
                "rating_type": "package",
                "package": package_id,
                "rating": stars,
                "review": "Great views",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
    }

    let req = test::TestRequest::post()
        .uri("/api/tourist/ratings")
        .insert_header(bearer(&first))
        .set_json(json!({
            "rating_type": "package",
            "package": package_id,
            "rating": 1,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}", package_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let package: Value = test::read_body_json(resp).await;
    assert_eq!(package["average_rating"], 4.5);

    let req = test::TestRequest::get()
        .uri(&format!("/api/packages/{}/ratings", package_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let ratings: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(ratings.len(), 2);
}

#[actix_rt::test]
async fn test_rating_out_of_range_is_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let guide = access_token(&app, "rated_guide", "guide").await;
    let req = test::TestRequest::get()
        .uri("/api/profile/guide")
        .insert_header(bearer(&guide))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let profile: Value = test::read_body_json(resp).await;

    let tourist = access_token(&app, "harsh", "tourist").await;
    let req = test::TestRequest::post()
        .uri("/api/tourist/ratings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "rating_type": "guide",
            "guide": profile["_id"],
            "rating": 6,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"]["rating"].is_array());
}

#[actix_rt::test]
async fn test_agency_guides_and_homepage() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "guided_tours").await;
    create_package(&app, &agency, 200.0).await;

    let req = test::TestRequest::post()
        .uri("/api/agency/manage/guides")
        .insert_header(bearer(&agency))
        .set_json(json!({
            "display_name": "Pemba",
            "languages": ["en"],
            "daily_rate": 40.0,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let guide: Value = test::read_body_json(resp).await;
    assert_eq!(guide["display_name"], "Pemba");

    let req = test::TestRequest::get()
        .uri("/api/profile/agency")
        .insert_header(bearer(&agency))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let profile: Value = test::read_body_json(resp).await;
    let agency_id = profile["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/agencies/{}/guides", agency_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let guides: Value = test::read_body_json(resp).await;
    assert_eq!(guides["count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/homepage/content")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let home: Value = test::read_body_json(resp).await;
    assert_eq!(home["packages"].as_array().unwrap().len(), 1);
    assert_eq!(home["agencies"].as_array().unwrap().len(), 1);
    assert_eq!(home["guides"].as_array().unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_huge_page_number_is_a_validation_error() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/packages?page=18446744073709551615")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"]["page"].is_array());

    let req = test::TestRequest::get()
        .uri("/api/guides?page=18446744073709551615&page_size=100")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_agency_lists_own_packages_page_by_page() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "paged_tours").await;
    create_package(&app, &agency, 50.0).await;
    create_package(&app, &agency, 70.0).await;

    let req = test::TestRequest::get()
        .uri("/api/agency/manage/packages?page_size=1&page=2")
        .insert_header(bearer(&agency))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["page"], 2);
    assert_eq!(page["results"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/agency/manage/packages?ordering=price")
        .insert_header(bearer(&agency))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["results"][0]["price"], 50.0);
}
