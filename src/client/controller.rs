//! Client-side trip state.
//!
//! [`TripController`] is an actor that caches the transport data and the signed-in user's
//! trips, forwards trip commands to a [`TripApi`], and drives the ride simulator on a
//! fixed tick while a public-transport ride is in progress.
//!
//! Commands are handled atomically: while one is waiting on the API, no other message
//! and no simulator tick touches the cache. Background calls issued by the simulator are
//! tracked in [`SyncStatus`]; they belong to the actor and are dropped when it stops.

use std::future::Future;
use std::time::Duration;

use actix::prelude::*;
use chrono::Utc;

use crate::api::{EndRentalBody, EndRideBody, StartRentalBody, StartRideBody};
use crate::data::{RouteView, StationView, VehicleView};
use crate::store::TripStatus;
use crate::trips::billing::round2;
use crate::trips::{CurrentTrip, PublicTransportTrip, VehicleTrip};
use crate::users::User;

use super::api::TripApi;
use super::error::ClientError;
use super::simulator::{self, RideStep, AUTO_COMPLETION_RATING};

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Root of the HTTP API, e.g. `http://127.0.0.1:5000/api`
    pub base_url: String,
    /// Interval between two simulated stops
    pub tick: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            tick: Duration::from_secs(3),
        }
    }
}

/// Bookkeeping of the calls the simulator issues in the background.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub last_failure: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonImpact {
    /// Kilograms of CO2 saved over every trip of both kinds
    pub saved_kg: f64,
    pub saved_g: f64,
}

/// Copy of the controller's cache at one point in time.
#[derive(Debug, Clone)]
pub struct TripSnapshot {
    pub user: User,
    pub stations: Vec<StationView>,
    pub routes: Vec<RouteView>,
    pub vehicle_trip: Option<VehicleTrip>,
    pub ride: Option<PublicTransportTrip>,
    pub vehicle_history: Vec<VehicleTrip>,
    pub ride_history: Vec<PublicTransportTrip>,
    pub sync: SyncStatus,
    /// Whether the ride simulator timer is armed
    pub ticking: bool,
}

impl TripSnapshot {
    pub fn carbon_impact(&self) -> CarbonImpact {
        let rentals: f64 = self
            .vehicle_history
            .iter()
            .filter_map(|t| t.carbon_saved)
            .sum();
        let rides: f64 = self.ride_history.iter().filter_map(|t| t.carbon_saved).sum();
        let saved_kg = round2(rentals + rides);
        CarbonImpact {
            saved_kg,
            saved_g: round2(saved_kg * 1000.0),
        }
    }

    /// Routes whose stop sequence passes through the station, matched by name.
    pub fn routes_for_station(&self, station_id: i64) -> Vec<&RouteView> {
        match self.stations.iter().find(|s| s.id == station_id) {
            Some(station) => self
                .routes
                .iter()
                .filter(|r| r.full_route.contains(&station.name))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn vehicle_by_id(&self, vehicle_id: i64) -> Option<&VehicleView> {
        find_vehicle(&self.stations, vehicle_id)
    }
}

fn find_vehicle(stations: &[StationView], vehicle_id: i64) -> Option<&VehicleView> {
    stations
        .iter()
        .flat_map(|s| s.vehicles.iter())
        .find(|v| v.id == vehicle_id)
}

struct TransportData {
    stations: Vec<StationView>,
    routes: Vec<RouteView>,
}

struct UserTrips {
    vehicle_history: Vec<VehicleTrip>,
    ride_history: Vec<PublicTransportTrip>,
    current: Option<CurrentTrip>,
}

async fn fetch_transport<A: TripApi>(api: A) -> Result<TransportData, ClientError> {
    let (stations, routes) = futures::try_join!(api.stations(), api.routes())?;
    Ok(TransportData { stations, routes })
}

async fn fetch_trips<A: TripApi>(api: A, user_id: i64) -> Result<UserTrips, ClientError> {
    let (vehicle_history, ride_history, current) = futures::try_join!(
        api.vehicle_trips(user_id),
        api.rides(user_id),
        api.current_trip(user_id)
    )?;
    Ok(UserTrips {
        vehicle_history,
        ride_history,
        current,
    })
}

async fn fetch_all<A: TripApi>(
    api: A,
    user_id: i64,
) -> (
    Result<TransportData, ClientError>,
    Result<UserTrips, ClientError>,
) {
    futures::join!(fetch_transport(api.clone()), fetch_trips(api, user_id))
}

pub struct TripController<A: TripApi> {
    user: User,
    api: A,
    config: ControllerConfig,
    stations: Vec<StationView>,
    routes: Vec<RouteView>,
    vehicle_trip: Option<VehicleTrip>,
    ride: Option<PublicTransportTrip>,
    vehicle_history: Vec<VehicleTrip>,
    ride_history: Vec<PublicTransportTrip>,
    ticker: Option<SpawnHandle>,
    /// Ride completed locally whose end call has not returned yet
    finishing: Option<i64>,
    sync: SyncStatus,
}

type Reply<A, T> = AtomicResponse<TripController<A>, Result<T, ClientError>>;

fn reject<A: TripApi, T: 'static>(err: ClientError) -> Reply<A, T> {
    log::warn!("Trip command rejected: {}", err);
    AtomicResponse::new(Box::pin(actix::fut::ready(Err(err))))
}

impl<A: TripApi> TripController<A> {
    pub fn new(user: User, api: A, config: ControllerConfig) -> Self {
        TripController {
            user,
            api,
            config,
            stations: Vec::new(),
            routes: Vec::new(),
            vehicle_trip: None,
            ride: None,
            vehicle_history: Vec::new(),
            ride_history: Vec::new(),
            ticker: None,
            finishing: None,
            sync: SyncStatus::default(),
        }
    }

    fn snapshot(&self) -> TripSnapshot {
        TripSnapshot {
            user: self.user.clone(),
            stations: self.stations.clone(),
            routes: self.routes.clone(),
            vehicle_trip: self.vehicle_trip.clone(),
            ride: self.ride.clone(),
            vehicle_history: self.vehicle_history.clone(),
            ride_history: self.ride_history.clone(),
            sync: self.sync.clone(),
            ticking: self.ticker.is_some(),
        }
    }

    fn apply_transport(&mut self, data: TransportData) {
        log::debug!(
            "Loaded {} stations and {} routes",
            data.stations.len(),
            data.routes.len()
        );
        self.stations = data.stations;
        self.routes = data.routes;
    }

    fn apply_trips(&mut self, trips: UserTrips, ctx: &mut Context<Self>) {
        self.vehicle_history = trips.vehicle_history;
        self.ride_history = trips.ride_history;
        match trips.current {
            Some(CurrentTrip::Vehicle(trip)) => {
                self.vehicle_trip = Some(trip);
                self.set_ride(None, ctx);
            }
            Some(CurrentTrip::PublicTransport(mut ride)) => {
                self.vehicle_trip = None;
                // The server still reports it in progress until the end call lands
                if self.finishing != Some(ride.id) {
                    // An advance still in flight leaves the server copy a stop behind
                    if let Some(local) = self.ride.as_ref().filter(|r| r.id == ride.id) {
                        ride.current_station_index =
                            ride.current_station_index.max(local.current_station_index);
                    }
                    self.set_ride(Some(ride), ctx);
                }
            }
            None => {
                self.vehicle_trip = None;
                if self.finishing.is_none() {
                    self.set_ride(None, ctx);
                }
            }
        }
    }

    /// Replace the cached ride. The simulator timer is re-armed only for a ride in
    /// progress, so at most one timer is ever live.
    fn set_ride(&mut self, ride: Option<PublicTransportTrip>, ctx: &mut Context<Self>) {
        self.stop_ticker(ctx);
        let in_progress = ride
            .as_ref()
            .map_or(false, |r| r.status == TripStatus::InProgress);
        self.ride = ride;
        if in_progress {
            self.ticker = Some(ctx.run_interval(self.config.tick, |act, ctx| act.tick(ctx)));
        }
    }

    fn stop_ticker(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.ticker.take() {
            ctx.cancel_future(handle);
        }
    }

    fn tick(&mut self, ctx: &mut Context<Self>) {
        let step = match &self.ride {
            Some(ride) => simulator::next_step(ride),
            None => RideStep::Idle,
        };
        match step {
            RideStep::Idle => self.stop_ticker(ctx),
            RideStep::Advance(next) => {
                let Some(ride) = self.ride.as_mut() else {
                    return;
                };
                ride.current_station_index = next;
                let trip_id = ride.id;
                log::debug!("Ride {} reached stop {}", trip_id, next);

                let api = self.api.clone();
                self.spawn_sync(
                    ctx,
                    "advance ride",
                    async move { api.advance_ride(trip_id, next).await },
                    |_, _, _| {},
                );
            }
            RideStep::Arrive { destination_index } => {
                let Some(ride) = self.ride.as_mut() else {
                    return;
                };
                simulator::complete_locally(ride, destination_index, Utc::now());
                let trip_id = ride.id;
                let body = EndRideBody {
                    actual_destination: Some(ride.planned_destination.clone()),
                    status: Some(TripStatus::Completed),
                    rating: Some(AUTO_COMPLETION_RATING),
                };
                log::info!("Ride {} arrived at {}", trip_id, ride.planned_destination);
                self.stop_ticker(ctx);
                self.finishing = Some(trip_id);

                let api = self.api.clone();
                self.spawn_sync(
                    ctx,
                    "complete ride",
                    async move { api.end_ride(trip_id, body).await },
                    move |act, res, ctx| {
                        act.finishing = None;
                        if res.is_ok() {
                            if act.ride.as_ref().map(|r| r.id) == Some(trip_id) {
                                act.set_ride(None, ctx);
                            }
                            act.refresh_trips(ctx);
                        }
                    },
                );
            }
        }
    }

    /// Run `fut` in the background, recording its outcome in [`SyncStatus`] before
    /// handing the result to `done`.
    fn spawn_sync<T, F, D>(&mut self, ctx: &mut Context<Self>, what: &'static str, fut: F, done: D)
    where
        T: 'static,
        F: Future<Output = Result<T, ClientError>> + 'static,
        D: FnOnce(&mut Self, Result<T, ClientError>, &mut Context<Self>) + 'static,
    {
        self.sync.in_flight += 1;
        ctx.spawn(fut.into_actor(self).map(move |res, act, ctx| {
            act.sync.in_flight -= 1;
            match &res {
                Ok(_) => act.sync.succeeded += 1,
                Err(e) => {
                    log::error!("Background {} failed: {}", what, e);
                    act.sync.failed += 1;
                    act.sync.last_failure = Some(format!("{}: {}", what, e));
                }
            }
            done(act, res, ctx);
        }));
    }

    fn refresh_trips(&mut self, ctx: &mut Context<Self>) {
        let api = self.api.clone();
        self.spawn_sync(
            ctx,
            "trip refresh",
            fetch_trips(api, self.user.id),
            |act, res, ctx| {
                if let Ok(trips) = res {
                    act.apply_trips(trips, ctx);
                }
            },
        );
    }

    fn refresh_transport(&mut self, ctx: &mut Context<Self>) {
        let api = self.api.clone();
        self.spawn_sync(ctx, "transport refresh", fetch_transport(api), |act, res, _| {
            if let Ok(data) = res {
                act.apply_transport(data);
            }
        });
    }

    fn load_all(&self) -> impl ActorFuture<Self, Output = Result<(), ClientError>> {
        fetch_all(self.api.clone(), self.user.id)
            .into_actor(self)
            .map(|(transport, trips), act, ctx| {
                match transport {
                    Ok(data) => act.apply_transport(data),
                    Err(e) => log::error!("Failed to load transport data: {}", e),
                }
                match trips {
                    Ok(trips) => {
                        act.apply_trips(trips, ctx);
                        Ok(())
                    }
                    Err(e) => {
                        log::error!("Failed to load trips of user {}: {}", act.user.id, e);
                        Err(e)
                    }
                }
            })
    }
}

impl<A: TripApi> Actor for TripController<A> {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        log::info!("Trip controller started for user {}", self.user.id);
        // Commands queue up behind the initial load
        ctx.wait(self.load_all().map(|_, _, _| ()));
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        log::info!("Trip controller stopped for user {}", self.user.id);
    }
}

#[derive(Message)]
#[rtype(result = "Result<VehicleTrip, ClientError>")]
pub struct StartVehicleTrip {
    pub vehicle_id: i64,
    pub start_station: String,
    pub planned_destination: String,
}

#[derive(Message)]
#[rtype(result = "Result<VehicleTrip, ClientError>")]
pub struct EndVehicleTrip {
    pub end_station: String,
    pub rating: u8,
}

/// Board a route at `start_station`. The stop sequence and starting index are taken
/// from the cached route.
#[derive(Message)]
#[rtype(result = "Result<PublicTransportTrip, ClientError>")]
pub struct StartPublicTransportTrip {
    pub route_id: i64,
    pub start_station: String,
    pub destination: String,
}

#[derive(Message)]
#[rtype(result = "Result<PublicTransportTrip, ClientError>")]
pub struct GetOffPublicTransport {
    pub station_name: String,
    pub rating: u8,
}

/// Reload transport data and the user's trips.
#[derive(Message)]
#[rtype(result = "Result<(), ClientError>")]
pub struct Refresh;

#[derive(Message)]
#[rtype(result = "TripSnapshot")]
pub struct GetSnapshot;

#[derive(Message)]
#[rtype(result = "()")]
pub struct SignOut;

impl<A: TripApi> Handler<StartVehicleTrip> for TripController<A> {
    type Result = Reply<A, VehicleTrip>;

    fn handle(&mut self, msg: StartVehicleTrip, _ctx: &mut Self::Context) -> Self::Result {
        if find_vehicle(&self.stations, msg.vehicle_id).is_none() {
            return reject(ClientError::UnknownVehicle(msg.vehicle_id));
        }
        let api = self.api.clone();
        let body = StartRentalBody {
            user_id: Some(self.user.id),
            vehicle_id: Some(msg.vehicle_id),
            start_station: Some(msg.start_station),
            planned_destination: Some(msg.planned_destination),
        };
        AtomicResponse::new(Box::pin(
            async move { api.start_vehicle_trip(body).await }
                .into_actor(self)
                .map(|res, act, ctx| match res {
                    Ok(trip) => {
                        log::info!("Started vehicle trip {}", trip.id);
                        act.vehicle_trip = Some(trip.clone());
                        act.refresh_transport(ctx);
                        Ok(trip)
                    }
                    Err(e) => {
                        log::error!("Failed to start vehicle trip: {}", e);
                        Err(e)
                    }
                }),
        ))
    }
}

impl<A: TripApi> Handler<EndVehicleTrip> for TripController<A> {
    type Result = Reply<A, VehicleTrip>;

    fn handle(&mut self, msg: EndVehicleTrip, _ctx: &mut Self::Context) -> Self::Result {
        let Some(trip_id) = self.vehicle_trip.as_ref().map(|t| t.id) else {
            return reject(ClientError::NoActiveTrip);
        };
        let api = self.api.clone();
        let body = EndRentalBody {
            end_station: Some(msg.end_station.clone()),
            actual_destination: Some(msg.end_station),
            rating: Some(msg.rating),
            status: Some(TripStatus::Completed),
        };
        AtomicResponse::new(Box::pin(
            async move { api.end_vehicle_trip(trip_id, body).await }
                .into_actor(self)
                .map(move |res, act, ctx| match res {
                    Ok(trip) => {
                        log::info!("Ended vehicle trip {} with cost {:?}", trip.id, trip.cost);
                        act.vehicle_trip = None;
                        act.refresh_trips(ctx);
                        act.refresh_transport(ctx);
                        Ok(trip)
                    }
                    Err(e) => {
                        log::error!("Failed to end vehicle trip {}: {}", trip_id, e);
                        Err(e)
                    }
                }),
        ))
    }
}

impl<A: TripApi> Handler<StartPublicTransportTrip> for TripController<A> {
    type Result = Reply<A, PublicTransportTrip>;

    fn handle(&mut self, msg: StartPublicTransportTrip, _ctx: &mut Self::Context) -> Self::Result {
        let Some(route) = self.routes.iter().find(|r| r.id == msg.route_id) else {
            return reject(ClientError::UnknownRoute(msg.route_id));
        };
        let Some(start_index) = route.full_route.iter().position(|s| *s == msg.start_station)
        else {
            return reject(ClientError::StopNotOnRoute {
                route_id: msg.route_id,
                stop: msg.start_station,
            });
        };
        if !route.full_route.contains(&msg.destination) {
            return reject(ClientError::StopNotOnRoute {
                route_id: msg.route_id,
                stop: msg.destination,
            });
        }

        let api = self.api.clone();
        let body = StartRideBody {
            user_id: Some(self.user.id),
            route_id: Some(msg.route_id),
            start_station: Some(msg.start_station),
            planned_destination: Some(msg.destination),
            full_route: Some(route.full_route.clone()),
            current_station_index: Some(start_index),
        };
        AtomicResponse::new(Box::pin(
            async move { api.start_ride(body).await }
                .into_actor(self)
                .map(|res, act, ctx| match res {
                    Ok(ride) => {
                        log::info!(
                            "Boarded {} on collective vehicle {} (ride {})",
                            ride.route_name,
                            ride.collective_vehicle_id,
                            ride.id
                        );
                        act.set_ride(Some(ride.clone()), ctx);
                        Ok(ride)
                    }
                    Err(e) => {
                        log::error!("Failed to start public transport trip: {}", e);
                        Err(e)
                    }
                }),
        ))
    }
}

impl<A: TripApi> Handler<GetOffPublicTransport> for TripController<A> {
    type Result = Reply<A, PublicTransportTrip>;

    fn handle(&mut self, msg: GetOffPublicTransport, _ctx: &mut Self::Context) -> Self::Result {
        let trip_id = match &self.ride {
            Some(ride) if ride.status == TripStatus::InProgress => ride.id,
            _ => return reject(ClientError::NoActiveTrip),
        };
        let api = self.api.clone();
        let body = EndRideBody {
            actual_destination: Some(msg.station_name),
            status: Some(TripStatus::Completed),
            rating: Some(msg.rating),
        };
        AtomicResponse::new(Box::pin(
            async move { api.end_ride(trip_id, body).await }
                .into_actor(self)
                .map(move |res, act, ctx| match res {
                    Ok(ride) => {
                        log::info!("Got off ride {} with cost {:?}", ride.id, ride.cost);
                        act.set_ride(None, ctx);
                        act.refresh_trips(ctx);
                        Ok(ride)
                    }
                    Err(e) => {
                        log::error!("Failed to end ride {}: {}", trip_id, e);
                        Err(e)
                    }
                }),
        ))
    }
}

impl<A: TripApi> Handler<Refresh> for TripController<A> {
    type Result = Reply<A, ()>;

    fn handle(&mut self, _msg: Refresh, _ctx: &mut Self::Context) -> Self::Result {
        AtomicResponse::new(Box::pin(self.load_all()))
    }
}

impl<A: TripApi> Handler<GetSnapshot> for TripController<A> {
    type Result = MessageResult<GetSnapshot>;

    fn handle(&mut self, _msg: GetSnapshot, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.snapshot())
    }
}

impl<A: TripApi> Handler<SignOut> for TripController<A> {
    type Result = ();

    fn handle(&mut self, _msg: SignOut, ctx: &mut Self::Context) {
        log::info!("User {} signed out", self.user.id);
        self.stop_ticker(ctx);
        ctx.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Location;
    use crate::store::{TransportType, UserType, VehicleKind, VehicleStatus};
    use approx::assert_relative_eq;

    fn snapshot() -> TripSnapshot {
        let vehicle = VehicleView {
            id: 4,
            kind: Some(VehicleKind::Scooter {
                battery_level: Some(40.0),
            }),
            status: VehicleStatus::Available,
            station_id: 2,
            price_per_minute: 0.25,
            carbon_factor: 0.08,
        };
        TripSnapshot {
            user: User {
                id: 1,
                first_name: "Ana".to_string(),
                last_name: "Rivera".to_string(),
                email: "ana@example.com".to_string(),
                user_type: UserType::Traveler,
            },
            stations: vec![
                StationView {
                    id: 1,
                    name: "Central Plaza".to_string(),
                    location: Location { lat: 0.0, lng: 0.0 },
                    capacity: 10,
                    available_vehicles: 0,
                    vehicles: Vec::new(),
                },
                StationView {
                    id: 2,
                    name: "North Terminal".to_string(),
                    location: Location { lat: 0.0, lng: 0.0 },
                    capacity: 5,
                    available_vehicles: 1,
                    vehicles: vec![vehicle],
                },
            ],
            routes: vec![RouteView {
                id: 2,
                name: "Tram A".to_string(),
                transport_type: TransportType::Tram,
                color: "#16a34a".to_string(),
                estimated_arrival: "N/A".to_string(),
                destinations: Vec::new(),
                full_route: vec!["North Terminal".to_string(), "City Hall".to_string()],
            }],
            vehicle_trip: None,
            ride: None,
            vehicle_history: Vec::new(),
            ride_history: Vec::new(),
            sync: SyncStatus::default(),
            ticking: false,
        }
    }

    #[test]
    fn routes_are_matched_by_station_name() {
        let snapshot = snapshot();
        assert!(snapshot.routes_for_station(1).is_empty());
        assert_eq!(snapshot.routes_for_station(2).len(), 1);
        assert!(snapshot.routes_for_station(99).is_empty());
    }

    #[test]
    fn vehicles_are_found_across_stations() {
        let snapshot = snapshot();
        assert_eq!(snapshot.vehicle_by_id(4).map(|v| v.station_id), Some(2));
        assert!(snapshot.vehicle_by_id(5).is_none());
    }

    #[test]
    fn carbon_impact_without_trips_is_zero() {
        let impact = snapshot().carbon_impact();
        assert_relative_eq!(impact.saved_kg, 0.0);
        assert_relative_eq!(impact.saved_g, 0.0);
    }
}
