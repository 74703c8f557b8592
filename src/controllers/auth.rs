use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::gate::Capability;

#[derive(Deserialize)]
pub struct LoginRequest {
    role: String,
    secret: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Capability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    token: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    success: bool,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Capability>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/validate", web::get().to(validate)),
    );
}

async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    match state.gate.login(&body.role, &body.secret) {
        Ok((token, capability)) => HttpResponse::Ok().json(LoginResponse {
            success: true,
            token: Some(token),
            role: Some(capability),
            error: None,
        }),
        Err(e) => {
            log::warn!("Rejected login for role '{}': {}", body.role, e);
            HttpResponse::Unauthorized().json(LoginResponse {
                success: false,
                token: None,
                role: None,
                error: Some(e.to_string()),
            })
        }
    }
}

async fn logout(state: web::Data<AppState>, body: web::Json<LogoutRequest>) -> impl Responder {
    // Clearing is unconditional; an already-dead token is still a success.
    state.gate.logout(&body.token);
    HttpResponse::Ok().json(LogoutResponse { success: true })
}

async fn validate(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer "));

    let capability = token.and_then(|t| state.gate.capability(t));
    HttpResponse::Ok().json(ValidateResponse {
        valid: capability.is_some(),
        role: capability,
    })
}
