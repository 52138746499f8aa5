mod common;

use actix_web::test;
use serde_json::{json, Value};

use common::{access_token, approved_agency, bearer, create_package, register, TestApp};

#[actix_rt::test]
async fn test_package_booking_is_priced_per_person() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "valley_tours").await;
    let package = create_package(&app, &agency, 100.0).await;
    let tourist = access_token(&app, "hiker", "tourist").await;

    let req = test::TestRequest::post()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "booking_type": "package",
            "package": package["_id"],
            "start_date": "2030-05-01",
            "end_date": "2030-05-05",
            "number_of_people": 2,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let booking: Value = test::read_body_json(resp).await;
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["total_price"], 200.0);
    assert_eq!(booking["price_status"], "computed");
    assert_eq!(booking["target"]["kind"], "package");
}

#[actix_rt::test]
async fn test_guide_booking_uses_daily_rate_and_days() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let guide = access_token(&app, "sherpa", "guide").await;
    let req = test::TestRequest::put()
        .uri("/api/profile/guide")
        .insert_header(bearer(&guide))
        .set_json(json!({ "daily_rate": 50.0, "languages": ["en", "ne"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let profile: Value = test::read_body_json(resp).await;

    let tourist = access_token(&app, "walker", "tourist").await;
    let req = test::TestRequest::post()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "booking_type": "guide",
            "guide": profile["_id"],
            "start_date": "2030-06-01",
            "end_date": "2030-06-03",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let booking: Value = test::read_body_json(resp).await;
    assert_eq!(booking["total_price"], 150.0);
    assert_eq!(booking["number_of_people"], 1);
}

#[actix_rt::test]
async fn test_booking_requires_exactly_one_matching_target() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let tourist = access_token(&app, "confused", "tourist").await;
    let req = test::TestRequest::post()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "booking_type": "package",
            "guide": "some-guide",
            "start_date": "2030-06-01",
            "end_date": "2030-06-03",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"]["target"].is_array());
    assert!(body["details"]["package"].is_array());
}

#[actix_rt::test]
async fn test_booking_rejects_reversed_dates() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "calendar_tours").await;
    let package = create_package(&app, &agency, 80.0).await;
    let tourist = access_token(&app, "timetraveler", "tourist").await;

    let req = test::TestRequest::post()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "booking_type": "package",
            "package": package["_id"],
            "start_date": "2030-06-03",
            "end_date": "2030-06-01",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_only_tourists_can_book() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let guide = access_token(&app, "moonlighter", "guide").await;
    let req = test::TestRequest::get()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&guide))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
async fn test_agency_booking_is_quoted_before_confirmation() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "custom_trips").await;
    let req = test::TestRequest::get()
        .uri("/api/profile/agency")
        .insert_header(bearer(&agency))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let agency_profile: Value = test::read_body_json(resp).await;

    let tourist = access_token(&app, "planner", "tourist").await;
    let req = test::TestRequest::post()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "booking_type": "agency",
            "agency": agency_profile["_id"],
            "start_date": "2030-07-01",
            "end_date": "2030-07-10",
            "number_of_people": 4,
            "special_requests": "Vegetarian meals",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let booking: Value = test::read_body_json(resp).await;
    assert_eq!(booking["total_price"], 0.0);
    assert_eq!(booking["price_status"], "awaiting_quote");
    let booking_id = booking["_id"].as_str().unwrap().to_string();

    let status_uri = format!("/api/agency/manage/bookings/{}/status", booking_id);
    let req = test::TestRequest::put()
        .uri(&status_uri)
        .insert_header(bearer(&agency))
        .set_json(json!({ "status": "confirmed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::put()
        .uri(&format!("/api/agency/manage/bookings/{}/quote", booking_id))
        .insert_header(bearer(&agency))
        .set_json(json!({ "total_price": 1200.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let quoted: Value = test::read_body_json(resp).await;
    assert_eq!(quoted["price_status"], "quoted");
    assert_eq!(quoted["total_price"], 1200.0);

    for next in ["confirmed", "in_progress", "completed"] {
        let req = test::TestRequest::put()
            .uri(&status_uri)
            .insert_header(bearer(&agency))
            .set_json(json!({ "status": next }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200, "moving to {}", next);
    }

    let req = test::TestRequest::get()
        .uri("/api/profile/agency")
        .insert_header(bearer(&agency))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let agency_profile: Value = test::read_body_json(resp).await;
    assert_eq!(agency_profile["total_bookings"], 1);
    assert_eq!(agency_profile["total_revenue"], 1200.0);

    let req = test::TestRequest::get()
        .uri("/api/profile/tourist")
        .insert_header(bearer(&tourist))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let tourist_profile: Value = test::read_body_json(resp).await;
    assert_eq!(tourist_profile["total_bookings"], 1);
    assert_eq!(tourist_profile["total_spent"], 1200.0);
}

#[actix_rt::test]
async fn test_tourist_can_cancel_pending_booking_once() {
    let test_app = TestApp::new();
    test_app.create_admin().await;
    let app = test::init_service(test_app.create_app()).await;

    let agency = approved_agency(&app, "refund_tours").await;
    let package = create_package(&app, &agency, 60.0).await;
    let tourist = access_token(&app, "waverer", "tourist").await;

    let req = test::TestRequest::post()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "booking_type": "package",
            "package": package["_id"],
            "start_date": "2030-08-01",
            "end_date": "2030-08-02",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let booking: Value = test::read_body_json(resp).await;
    let cancel_uri = format!("/api/tourist/bookings/{}/cancel", booking["_id"].as_str().unwrap());

    let req = test::TestRequest::post()
        .uri(&cancel_uri)
        .insert_header(bearer(&tourist))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let cancelled: Value = test::read_body_json(resp).await;
    assert_eq!(cancelled["status"], "cancelled");

    let req = test::TestRequest::post()
        .uri(&cancel_uri)
        .insert_header(bearer(&tourist))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Another tourist cannot see it.
    let other = access_token(&app, "snoop", "tourist").await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/tourist/bookings/{}", booking["_id"].as_str().unwrap()))
        .insert_header(bearer(&other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn test_unapproved_agency_cannot_manage_packages() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let body = register(&app, "eager_agency", "agency").await;
    let token = body["access"].as_str().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/agency/manage/packages")
        .insert_header(bearer(token))
        .set_json(json!({
            "name": "Too Soon",
            "description": "Not approved yet",
            "package_type": "city",
            "duration_days": 1,
            "price": 10.0,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
async fn test_oversized_party_and_rates_are_rejected() {
    let test_app = TestApp::new();
    let app = test::init_service(test_app.create_app()).await;

    let guide = access_token(&app, "pricey", "guide").await;
    let req = test::TestRequest::put()
        .uri("/api/profile/guide")
        .insert_header(bearer(&guide))
        .set_json(json!({ "daily_rate": 1e21 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::put()
        .uri("/api/profile/guide")
        .insert_header(bearer(&guide))
        .set_json(json!({ "daily_rate": 100.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let profile: Value = test::read_body_json(resp).await;

    let tourist = access_token(&app, "crowd", "tourist").await;
    let req = test::TestRequest::post()
        .uri("/api/tourist/bookings")
        .insert_header(bearer(&tourist))
        .set_json(json!({
            "booking_type": "guide",
            "guide": profile["_id"],
            "start_date": "2030-06-01",
            "end_date": "2030-06-03",
            "number_of_people": 4000000000u32,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["details"]["number_of_people"].is_array());
}
