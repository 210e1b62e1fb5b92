use actix_web::{post, web, HttpResponse};

use crate::api::{LoginBody, RegisterBody, UserEnvelope};
use crate::server::AppState;
use crate::users::{self, UserError};

#[post("/register")]
async fn register(
    data: web::Data<AppState>,
    body: web::Json<RegisterBody>,
) -> Result<HttpResponse, UserError> {
    let registration = body.into_inner().validate()?;
    let user = users::register(&mut data.store.lock(), &registration)?;
    Ok(HttpResponse::Created().json(UserEnvelope {
        message: "User registered successfully".to_string(),
        user,
    }))
}

#[post("/login")]
async fn login(
    data: web::Data<AppState>,
    body: web::Json<LoginBody>,
) -> Result<HttpResponse, UserError> {
    let (email, password) = body.into_inner().validate()?;
    let user = users::login(&data.store.lock(), &email, &password)?;
    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: "Login successful".to_string(),
        user,
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login);
}
