use awc::{Client, SendClientRequest};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::{
    AdvanceRideBody, CurrentTripPayload, EndRentalBody, EndRideBody, ErrorBody, LoginBody,
    RoutesPayload, StartRentalBody, StartRideBody, StationsPayload, TripEnvelope, TripList,
    UserEnvelope,
};
use crate::data::{RouteView, StationView};
use crate::trips::{CurrentTrip, PublicTransportTrip, VehicleTrip};
use crate::users::User;

use super::api::TripApi;
use super::controller::ControllerConfig;
use super::error::ClientError;

const BODY_LIMIT: usize = 4 * 1024 * 1024;

/// [`TripApi`] over HTTP, against a server mounted at `base` (e.g. `http://host:5000/api`).
#[derive(Clone)]
pub struct HttpTripApi {
    client: Client,
    base: Url,
}

impl HttpTripApi {
    pub fn new(base_url: &str) -> Result<HttpTripApi, ClientError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ClientError::Transport(format!("Invalid base url {}: {}", base_url, e)))?;
        // Joining relative paths only keeps the last segment when it ends with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(HttpTripApi {
            client: Client::default(),
            base,
        })
    }

    pub fn from_config(config: &ControllerConfig) -> Result<HttpTripApi, ClientError> {
        HttpTripApi::new(&config.base_url)
    }

    fn url(&self, path: &str) -> Result<String, ClientError> {
        self.base
            .join(path)
            .map(String::from)
            .map_err(|e| ClientError::Transport(format!("Invalid path {}: {}", path, e)))
    }
}

/// Await a request and decode its JSON body, turning non-success statuses into
/// [`ClientError::Rejected`] with the server's message.
async fn exchange<T: DeserializeOwned>(pending: SendClientRequest) -> Result<T, ClientError> {
    let mut res = pending
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let status = res.status();
    let body = res
        .body()
        .limit(BODY_LIMIT)
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

impl TripApi for HttpTripApi {
    async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let body = LoginBody {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        let res: UserEnvelope =
            exchange(self.client.post(self.url("users/login")?).send_json(&body)).await?;
        Ok(res.user)
    }

    async fn stations(&self) -> Result<Vec<StationView>, ClientError> {
        let url = self.url("data/stations-with-vehicles")?;
        let res: StationsPayload = exchange(self.client.get(url).send()).await?;
        Ok(res.stations)
    }

    async fn routes(&self) -> Result<Vec<RouteView>, ClientError> {
        let url = self.url("data/public-transport-routes")?;
        let res: RoutesPayload = exchange(self.client.get(url).send()).await?;
        Ok(res.routes)
    }

    async fn start_vehicle_trip(&self, body: StartRentalBody) -> Result<VehicleTrip, ClientError> {
        let url = self.url("trips/vehicles")?;
        let res: TripEnvelope<VehicleTrip> =
            exchange(self.client.post(url).send_json(&body)).await?;
        Ok(res.trip)
    }

    async fn end_vehicle_trip(
        &self,
        trip_id: i64,
        body: EndRentalBody,
    ) -> Result<VehicleTrip, ClientError> {
        let url = self.url(&format!("trips/vehicles/{}", trip_id))?;
        let res: TripEnvelope<VehicleTrip> =
            exchange(self.client.put(url).send_json(&body)).await?;
        Ok(res.trip)
    }

    async fn vehicle_trips(&self, user_id: i64) -> Result<Vec<VehicleTrip>, ClientError> {
        let url = self.url(&format!("trips/vehicles/user/{}", user_id))?;
        let res: TripList<VehicleTrip> = exchange(self.client.get(url).send()).await?;
        Ok(res.trips)
    }

    async fn start_ride(&self, body: StartRideBody) -> Result<PublicTransportTrip, ClientError> {
        let url = self.url("trips/public-transport")?;
        let res: TripEnvelope<PublicTransportTrip> =
            exchange(self.client.post(url).send_json(&body)).await?;
        Ok(res.trip)
    }

    async fn end_ride(
        &self,
        trip_id: i64,
        body: EndRideBody,
    ) -> Result<PublicTransportTrip, ClientError> {
        let url = self.url(&format!("trips/public-transport/{}", trip_id))?;
        let res: TripEnvelope<PublicTransportTrip> =
            exchange(self.client.put(url).send_json(&body)).await?;
        Ok(res.trip)
    }

    async fn advance_ride(
        &self,
        trip_id: i64,
        station_index: usize,
    ) -> Result<PublicTransportTrip, ClientError> {
        let url = self.url(&format!("trips/public-transport/{}/advance", trip_id))?;
        let body = AdvanceRideBody {
            current_station_index: Some(station_index as i64),
        };
        let res: TripEnvelope<PublicTransportTrip> =
            exchange(self.client.put(url).send_json(&body)).await?;
        Ok(res.trip)
    }

    async fn rides(&self, user_id: i64) -> Result<Vec<PublicTransportTrip>, ClientError> {
        let url = self.url(&format!("trips/public-transport/user/{}", user_id))?;
        let res: TripList<PublicTransportTrip> = exchange(self.client.get(url).send()).await?;
        Ok(res.trips)
    }

    async fn current_trip(&self, user_id: i64) -> Result<Option<CurrentTrip>, ClientError> {
        let url = self.url(&format!("trips/current-trip/user/{}", user_id))?;
        let res: CurrentTripPayload = exchange(self.client.get(url).send()).await?;
        res.into_current()
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn base_url_keeps_its_prefix() {
        let api = HttpTripApi::from_config(&ControllerConfig::default()).unwrap();
        assert_eq!(
            api.url("trips/vehicles/7").unwrap(),
            "http://127.0.0.1:5000/api/trips/vehicles/7"
        );
        let api = HttpTripApi::new("http://localhost:5000/api/").unwrap();
        assert_eq!(
            api.url("data/public-transport-routes").unwrap(),
            "http://localhost:5000/api/data/public-transport-routes"
        );
    }

    #[actix_rt::test]
    async fn malformed_base_url_is_a_transport_error() {
        assert!(matches!(
            HttpTripApi::new("not a url"),
            Err(ClientError::Transport(_))
        ));
    }
}
