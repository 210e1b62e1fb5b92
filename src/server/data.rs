use std::time::Instant;

use actix_web::{get, web, HttpResponse};

use crate::api::{RoutesPayload, StationsPayload};
use crate::data;
use crate::server::AppState;
use crate::trips::TripError;

#[get("/stations-with-vehicles")]
async fn stations_with_vehicles(state: web::Data<AppState>) -> Result<HttpResponse, TripError> {
    let start = Instant::now();
    let stations = data::stations_with_vehicles(&state.store.lock())?;
    log::debug!(
        "Loaded {} stations in {}ms",
        stations.len(),
        start.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(StationsPayload { stations }))
}

#[get("/public-transport-routes")]
async fn public_transport_routes(state: web::Data<AppState>) -> Result<HttpResponse, TripError> {
    let start = Instant::now();
    let routes = data::public_transport_routes(&state.store.lock())?;
    log::debug!(
        "Loaded {} routes in {}ms",
        routes.len(),
        start.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(RoutesPayload { routes }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(stations_with_vehicles)
        .service(public_transport_routes);
}
