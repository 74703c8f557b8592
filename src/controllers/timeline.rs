use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::models::TimelineEventRecord;
use crate::store::Collection;
use crate::view;

use super::{capability_from_request, require_author};

// Timeline events are append-only: there is no delete route because the
// records carry no id to address one by.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/timeline")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event)),
    );
}

#[derive(Debug, Serialize)]
struct ListEventsResponse {
    success: bool,
    events: Vec<TimelineEventRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Timeline reads oldest-first, unlike every other collection.
async fn list_events(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = capability_from_request(&data, &req) {
        return resp;
    }

    match data
        .store
        .load::<TimelineEventRecord>(Collection::Timeline)
        .await
    {
        Ok(mut events) => {
            view::sort_oldest_first(&mut events, |e| e.date);
            HttpResponse::Ok().json(ListEventsResponse {
                success: true,
                events,
                error: None,
            })
        }
        Err(e) => {
            log::error!("Failed to load timeline: {}", e);
            HttpResponse::InternalServerError().json(ListEventsResponse {
                success: false,
                events: vec![],
                error: Some(e.to_string()),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    date: NaiveDate,
    title: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct CreateEventResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<TimelineEventRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn create_event(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateEventRequest>,
) -> impl Responder {
    if let Err(resp) = require_author(&data, &req) {
        return resp;
    }

    let title = body.title.trim().to_string();
    let description = body.description.trim().to_string();
    if title.is_empty() || description.is_empty() {
        return HttpResponse::BadRequest().json(CreateEventResponse {
            success: false,
            event: None,
            error: Some("Both a title and a description are required".to_string()),
        });
    }

    let record = TimelineEventRecord {
        date: body.date,
        title,
        description,
    };

    match data.store.append(Collection::Timeline, record).await {
        Ok(event) => HttpResponse::Ok().json(CreateEventResponse {
            success: true,
            event: Some(event),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to append timeline event: {}", e);
            HttpResponse::InternalServerError().json(CreateEventResponse {
                success: false,
                event: None,
                error: Some(e.to_string()),
            })
        }
    }
}
