pub mod auth;
pub mod health;
pub mod letters;
pub mod photos;
pub mod surprise;
pub mod timeline;
pub mod videos;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::AppState;
use crate::gate::Capability;

/// Resolve the bearer token on the request to a live session capability.
pub(crate) fn capability_from_request(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<Capability, HttpResponse> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim_start_matches("Bearer ").to_string());

    let token = match token {
        Some(t) => t,
        None => {
            return Err(HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "No authorization token provided"
            })));
        }
    };

    match state.gate.capability(&token) {
        Some(capability) => Ok(capability),
        None => Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid or expired session"
        }))),
    }
}

/// Mutating routes are author-only.
pub(crate) fn require_author(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<(), HttpResponse> {
    let capability = capability_from_request(state, req)?;
    if !capability.can_author() {
        return Err(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Author access required"
        })));
    }
    Ok(())
}
