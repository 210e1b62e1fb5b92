use actix_web::{test, web, App};
use serde_json::{json, Value};

use eco_transit::server::{configure, AppState};
use eco_transit::store::{seed, Store};

fn seeded_state() -> web::Data<AppState> {
    let store = Store::open_in_memory().unwrap();
    seed::seed_demo(&mut store.lock()).unwrap();
    web::Data::new(AppState::new(store))
}

#[actix_web::test]
async fn health_check_answers_plain_text() {
    let app = test::init_service(App::new().app_data(seeded_state()).configure(configure)).await;
    let req = test::TestRequest::get().uri("/").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, web::Bytes::from_static(b"Eco transit API is running"));
}

#[actix_web::test]
async fn stations_list_docked_vehicles() {
    let app = test::init_service(App::new().app_data(seeded_state()).configure(configure)).await;
    let req = test::TestRequest::get()
        .uri("/api/data/stations-with-vehicles")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let stations = body["stations"].as_array().unwrap();
    assert_eq!(stations.len(), 3);
    let central = &stations[0];
    assert_eq!(central["name"], "Central Plaza");
    assert_eq!(central["availableVehicles"], 2);
    assert_eq!(central["location"]["lat"], 4.6097);

    let bike = &central["vehicles"][0];
    assert_eq!(bike["type"], "bike");
    assert_eq!(bike["tireStatus"], "good");
    assert_eq!(bike["stationId"], 1);
}

#[actix_web::test]
async fn routes_carry_their_stop_sequence() {
    let app = test::init_service(App::new().app_data(seeded_state()).configure(configure)).await;
    let req = test::TestRequest::get()
        .uri("/api/data/public-transport-routes")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let routes = body["routes"].as_array().unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0]["name"], "Line 1");
    assert_eq!(routes[0]["type"], "bus");
    assert_eq!(routes[0]["estimatedArrival"], "5 min");
    assert_eq!(routes[0]["fullRoute"].as_array().unwrap().len(), 6);
    assert_eq!(routes[1]["estimatedArrival"], "N/A");
}

#[actix_web::test]
async fn register_then_login() {
    let app = test::init_service(App::new().app_data(seeded_state()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({
            "firstName": "Marta",
            "lastName": "Gil",
            "email": "marta@example.com",
            "password": "secret"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["type"], "traveler");
    assert!(body["user"].get("password").is_none());

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "marta@example.com", "password": "secret" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["firstName"], "Marta");
}

#[actix_web::test]
async fn account_errors() {
    let app = test::init_service(App::new().app_data(seeded_state()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({
            "firstName": "Ana",
            "lastName": "Rivera",
            "email": "ana@example.com",
            "password": "again"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 409);

    let req = test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(json!({ "email": "new@example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "email": "ana@example.com", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");
}
