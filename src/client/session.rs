use actix::{Actor, Addr};

use crate::trips::{PublicTransportTrip, VehicleTrip};

use super::api::TripApi;
use super::controller::{
    ControllerConfig, EndVehicleTrip, GetOffPublicTransport, GetSnapshot, Refresh, SignOut,
    StartPublicTransportTrip, StartVehicleTrip, TripController, TripSnapshot,
};
use super::error::ClientError;

/// A signed-in user's handle on their trip controller.
///
/// The controller lives as long as the session: signing out stops it, and with it the
/// ride simulator and any background call still in flight.
pub struct TripSession<A: TripApi> {
    addr: Addr<TripController<A>>,
}

impl<A: TripApi> TripSession<A> {
    pub async fn sign_in(
        api: A,
        email: &str,
        password: &str,
        config: ControllerConfig,
    ) -> Result<TripSession<A>, ClientError> {
        let user = api.login(email, password).await?;
        log::info!("Signed in as user {} ({})", user.id, user.email);
        let addr = TripController::new(user, api, config).start();
        Ok(TripSession { addr })
    }

    pub async fn start_vehicle_trip(
        &self,
        vehicle_id: i64,
        start_station: &str,
        planned_destination: &str,
    ) -> Result<VehicleTrip, ClientError> {
        self.addr
            .send(StartVehicleTrip {
                vehicle_id,
                start_station: start_station.to_string(),
                planned_destination: planned_destination.to_string(),
            })
            .await?
    }

    pub async fn end_vehicle_trip(
        &self,
        end_station: &str,
        rating: u8,
    ) -> Result<VehicleTrip, ClientError> {
        self.addr
            .send(EndVehicleTrip {
                end_station: end_station.to_string(),
                rating,
            })
            .await?
    }

    pub async fn start_public_transport_trip(
        &self,
        route_id: i64,
        start_station: &str,
        destination: &str,
    ) -> Result<PublicTransportTrip, ClientError> {
        self.addr
            .send(StartPublicTransportTrip {
                route_id,
                start_station: start_station.to_string(),
                destination: destination.to_string(),
            })
            .await?
    }

    pub async fn get_off_public_transport(
        &self,
        station_name: &str,
        rating: u8,
    ) -> Result<PublicTransportTrip, ClientError> {
        self.addr
            .send(GetOffPublicTransport {
                station_name: station_name.to_string(),
                rating,
            })
            .await?
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.addr.send(Refresh).await?
    }

    pub async fn snapshot(&self) -> Result<TripSnapshot, ClientError> {
        Ok(self.addr.send(GetSnapshot).await?)
    }

    pub async fn sign_out(self) -> Result<(), ClientError> {
        Ok(self.addr.send(SignOut).await?)
    }
}
