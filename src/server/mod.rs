//! HTTP surface of the trip and transport-data services.

pub mod cors;
mod data;
mod error;
mod trips;
mod users;

use actix_web::{error::InternalError, get, web, App, HttpResponse, HttpServer, Responder};

use crate::api::ErrorBody;
use crate::config::Config;
use crate::server::cors::cors_middleware;
use crate::store::Store;

pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> AppState {
        AppState { store }
    }
}

#[get("/")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("Eco transit API is running")
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody { message })
}

/// Register every route. Malformed JSON bodies and path parameters are answered with a
/// 400 `{message}` like any other invalid input.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid request body: {}", err));
        InternalError::from_response(err, response).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid path parameter: {}", err));
        InternalError::from_response(err, response).into()
    }))
    .service(health)
    .service(
        web::scope("/api")
            .service(web::scope("/trips").configure(trips::configure))
            .service(web::scope("/data").configure(data::configure))
            .service(web::scope("/users").configure(users::configure)),
    );
}

pub async fn start_server(store: Store, config: &Config) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(store));
    let origin = config.cors_origin.clone();

    log::info!("Starting server on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&origin))
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
