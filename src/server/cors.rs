use actix_cors::Cors;
use actix_web::http::header;

pub fn cors_middleware(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600) // Cache CORS preflight for 1 hour
}
