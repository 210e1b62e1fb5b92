use crate::api::{EndRentalBody, EndRideBody, StartRentalBody, StartRideBody};
use crate::data::{RouteView, StationView};
use crate::trips::{CurrentTrip, PublicTransportTrip, VehicleTrip};
use crate::users::User;

use super::error::ClientError;

/// Remote operations the trip controller relies on.
///
/// Implementations are cloned into every request future, so they should be cheap handles
/// (an HTTP client, a shared store).
#[allow(async_fn_in_trait)]
pub trait TripApi: Clone + Unpin + 'static {
    async fn login(&self, email: &str, password: &str) -> Result<User, ClientError>;

    async fn stations(&self) -> Result<Vec<StationView>, ClientError>;

    async fn routes(&self) -> Result<Vec<RouteView>, ClientError>;

    async fn start_vehicle_trip(&self, body: StartRentalBody) -> Result<VehicleTrip, ClientError>;

    async fn end_vehicle_trip(
        &self,
        trip_id: i64,
        body: EndRentalBody,
    ) -> Result<VehicleTrip, ClientError>;

    async fn vehicle_trips(&self, user_id: i64) -> Result<Vec<VehicleTrip>, ClientError>;

    async fn start_ride(&self, body: StartRideBody) -> Result<PublicTransportTrip, ClientError>;

    async fn end_ride(
        &self,
        trip_id: i64,
        body: EndRideBody,
    ) -> Result<PublicTransportTrip, ClientError>;

    async fn advance_ride(
        &self,
        trip_id: i64,
        station_index: usize,
    ) -> Result<PublicTransportTrip, ClientError>;

    async fn rides(&self, user_id: i64) -> Result<Vec<PublicTransportTrip>, ClientError>;

    async fn current_trip(&self, user_id: i64) -> Result<Option<CurrentTrip>, ClientError>;
}
