use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Serialize;

use crate::AppState;
use crate::models::{LetterRecord, PhotoRecord, VideoRecord};
use crate::store::Collection;
use crate::view::{self, SurpriseMemory};

use super::capability_from_request;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/surprise").route(web::get().to(surprise_me)));
}

#[derive(Debug, Serialize)]
struct SurpriseResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<SurpriseMemory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// One uniformly random entry from the union of all renderable collections.
async fn surprise_me(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = capability_from_request(&data, &req) {
        return resp;
    }

    let photos = data.store.load::<PhotoRecord>(Collection::Photos).await;
    let videos = data.store.load::<VideoRecord>(Collection::Videos).await;
    let letters = data.store.load::<LetterRecord>(Collection::Letters).await;

    let (photos, videos, letters) = match (photos, videos, letters) {
        (Ok(p), Ok(v), Ok(l)) => (p, v, l),
        (p, v, l) => {
            let cause = [
                p.err().map(|e| e.to_string()),
                v.err().map(|e| e.to_string()),
                l.err().map(|e| e.to_string()),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ");
            log::error!("Failed to load collections for surprise pick: {}", cause);
            return HttpResponse::InternalServerError().json(SurpriseResponse {
                success: false,
                memory: None,
                message: None,
                error: Some(cause),
            });
        }
    };

    match view::pick_surprise(photos, videos, letters) {
        Some(memory) => HttpResponse::Ok().json(SurpriseResponse {
            success: true,
            memory: Some(memory),
            message: None,
            error: None,
        }),
        None => HttpResponse::Ok().json(SurpriseResponse {
            success: false,
            memory: None,
            message: Some(
                "No memories to surprise you with yet! Add some photos, videos or letters first."
                    .to_string(),
            ),
            error: None,
        }),
    }
}
