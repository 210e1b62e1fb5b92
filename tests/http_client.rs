use actix_web::{web, App, HttpServer};

use eco_transit::api::StartRentalBody;
use eco_transit::client::{ClientError, HttpTripApi, TripApi};
use eco_transit::server::{configure, AppState};
use eco_transit::store::{seed, Store};
use eco_transit::trips::CurrentTrip;

#[actix_rt::test]
async fn http_client_round_trips_through_the_server() {
    let store = Store::open_in_memory().unwrap();
    seed::seed_demo(&mut store.lock()).unwrap();
    let state = web::Data::new(AppState::new(store));

    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    let api = HttpTripApi::new(&format!("http://{}/api", addr)).unwrap();

    let err = api.login("ana@example.com", "nope").await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Rejected {
            status: 400,
            message: "Invalid credentials".to_string()
        }
    );
    let user = api.login("ana@example.com", "demo123").await.unwrap();

    let routes = api.routes().await.unwrap();
    assert_eq!(routes[0].full_route.len(), 6);

    let trip = api
        .start_vehicle_trip(StartRentalBody {
            user_id: Some(user.id),
            vehicle_id: Some(5),
            start_station: Some("University Campus".to_string()),
            planned_destination: Some("Central Plaza".to_string()),
        })
        .await
        .unwrap();
    match api.current_trip(user.id).await.unwrap() {
        Some(CurrentTrip::Vehicle(current)) => assert_eq!(current.id, trip.id),
        other => panic!("expected the rental to be current, got {:?}", other),
    }
    assert!(api.rides(user.id).await.unwrap().is_empty());

    handle.stop(true).await;
}
