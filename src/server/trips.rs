use actix_web::{get, post, put, web, HttpResponse};
use chrono::Utc;

use crate::api::{
    AdvanceRideBody, CurrentTripPayload, EndRentalBody, EndRideBody, StartRentalBody,
    StartRideBody, TripEnvelope, TripList,
};
use crate::server::AppState;
use crate::trips::{self, TripError};

#[post("/vehicles")]
async fn start_vehicle_trip(
    data: web::Data<AppState>,
    body: web::Json<StartRentalBody>,
) -> Result<HttpResponse, TripError> {
    let cmd = body.into_inner().validate()?;
    let trip = trips::start_rental(&mut data.store.lock(), &cmd, Utc::now())?;
    log::info!(
        "User {} rented vehicle {} (trip {})",
        trip.user_id,
        trip.vehicle_id,
        trip.id
    );
    Ok(HttpResponse::Created().json(TripEnvelope {
        message: "Vehicle trip started successfully".to_string(),
        trip,
    }))
}

#[put("/vehicles/{trip_id}")]
async fn end_vehicle_trip(
    trip_id: web::Path<i64>,
    data: web::Data<AppState>,
    body: web::Json<EndRentalBody>,
) -> Result<HttpResponse, TripError> {
    let cmd = body.into_inner().validate()?;
    let trip = trips::end_rental(&mut data.store.lock(), trip_id.into_inner(), &cmd, Utc::now())?;
    log::info!(
        "Vehicle trip {} ended at {} with cost {:?}",
        trip.id,
        cmd.end_station,
        trip.cost
    );
    Ok(HttpResponse::Ok().json(TripEnvelope {
        message: "Vehicle trip ended successfully".to_string(),
        trip,
    }))
}

#[get("/vehicles/user/{user_id}")]
async fn user_vehicle_trips(
    user_id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, TripError> {
    let trips = trips::user_vehicle_trips(&data.store.lock(), user_id.into_inner())?;
    Ok(HttpResponse::Ok().json(TripList { trips }))
}

#[post("/public-transport")]
async fn start_ride(
    data: web::Data<AppState>,
    body: web::Json<StartRideBody>,
) -> Result<HttpResponse, TripError> {
    let cmd = body.into_inner().validate()?;
    let trip = trips::start_ride(
        &mut data.store.lock(),
        &cmd,
        Utc::now(),
        &mut rand::thread_rng(),
    )?;
    log::info!(
        "User {} boarded {} on {} (trip {})",
        trip.user_id,
        trip.collective_vehicle_id,
        trip.route_name,
        trip.id
    );
    Ok(HttpResponse::Created().json(TripEnvelope {
        message: "Public transport trip started successfully".to_string(),
        trip,
    }))
}

#[put("/public-transport/{trip_id}")]
async fn end_ride(
    trip_id: web::Path<i64>,
    data: web::Data<AppState>,
    body: web::Json<EndRideBody>,
) -> Result<HttpResponse, TripError> {
    let cmd = body.into_inner().validate()?;
    let trip = trips::end_ride(&mut data.store.lock(), trip_id.into_inner(), &cmd, Utc::now())?;
    log::info!("Public transport trip {} ended with status {}", trip.id, trip.status);
    Ok(HttpResponse::Ok().json(TripEnvelope {
        message: "Public transport trip ended successfully".to_string(),
        trip,
    }))
}

#[put("/public-transport/{trip_id}/advance")]
async fn advance_ride(
    trip_id: web::Path<i64>,
    data: web::Data<AppState>,
    body: web::Json<AdvanceRideBody>,
) -> Result<HttpResponse, TripError> {
    let index = body.into_inner().validate()?;
    let trip = trips::advance_ride_stop(&mut data.store.lock(), trip_id.into_inner(), index)?;
    log::debug!(
        "Ride {} is at stop {} of {}",
        trip.id,
        trip.current_station_index,
        trip.full_route.len()
    );
    Ok(HttpResponse::Ok().json(TripEnvelope {
        message: "Station updated successfully".to_string(),
        trip,
    }))
}

#[get("/public-transport/user/{user_id}")]
async fn user_rides(
    user_id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, TripError> {
    let trips = trips::user_rides(&data.store.lock(), user_id.into_inner())?;
    Ok(HttpResponse::Ok().json(TripList { trips }))
}

#[get("/current-trip/user/{user_id}")]
async fn current_trip(
    user_id: web::Path<i64>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, TripError> {
    let current = trips::current_trip(&data.store.lock(), user_id.into_inner())?;
    Ok(HttpResponse::Ok().json(CurrentTripPayload::from_current(current)?))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(start_vehicle_trip)
        .service(end_vehicle_trip)
        .service(user_vehicle_trips)
        .service(start_ride)
        .service(end_ride)
        .service(advance_ride)
        .service(user_rides)
        .service(current_trip);
}
