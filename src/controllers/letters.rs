use actix_web::{HttpRequest, HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::models::LetterRecord;
use crate::store::{Collection, StoreError};
use crate::view;

use super::{capability_from_request, require_author};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/letters")
            .route("", web::get().to(list_letters))
            .route("", web::post().to(create_letter))
            .route("/{index}", web::delete().to(delete_letter)),
    );
}

#[derive(Debug, Serialize)]
struct ListLettersResponse {
    success: bool,
    letters: Vec<LetterRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn list_letters(data: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = capability_from_request(&data, &req) {
        return resp;
    }

    match data.store.load::<LetterRecord>(Collection::Letters).await {
        Ok(mut letters) => {
            view::sort_newest_first(&mut letters, |l| l.date);
            HttpResponse::Ok().json(ListLettersResponse {
                success: true,
                letters,
                error: None,
            })
        }
        Err(e) => {
            log::error!("Failed to load letters: {}", e);
            HttpResponse::InternalServerError().json(ListLettersResponse {
                success: false,
                letters: vec![],
                error: Some(e.to_string()),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateLetterRequest {
    date: NaiveDate,
    title: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct CreateLetterResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    letter: Option<LetterRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn create_letter(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateLetterRequest>,
) -> impl Responder {
    if let Err(resp) = require_author(&data, &req) {
        return resp;
    }

    let title = body.title.trim().to_string();
    let content = body.content.trim().to_string();
    if title.is_empty() || content.is_empty() {
        return HttpResponse::BadRequest().json(CreateLetterResponse {
            success: false,
            letter: None,
            error: Some("Both a title and content are required".to_string()),
        });
    }

    let record = LetterRecord {
        id: 0,
        date: body.date,
        title,
        content,
        created_date: Utc::now(),
    };

    match data.store.append(Collection::Letters, record).await {
        Ok(letter) => HttpResponse::Ok().json(CreateLetterResponse {
            success: true,
            letter: Some(letter),
            error: None,
        }),
        Err(e) => {
            log::error!("Failed to append letter: {}", e);
            HttpResponse::InternalServerError().json(CreateLetterResponse {
                success: false,
                letter: None,
                error: Some(e.to_string()),
            })
        }
    }
}

#[derive(Debug, Serialize)]
struct DeleteLetterResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<LetterRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn delete_letter(
    data: web::Data<AppState>,
    req: HttpRequest,
    index: web::Path<usize>,
) -> impl Responder {
    if let Err(resp) = require_author(&data, &req) {
        return resp;
    }

    match data
        .store
        .remove_at::<LetterRecord>(Collection::Letters, *index)
        .await
    {
        Ok(deleted) => HttpResponse::Ok().json(DeleteLetterResponse {
            success: true,
            deleted: Some(deleted),
            error: None,
        }),
        Err(StoreError::NotFound { .. }) => HttpResponse::NotFound().json(DeleteLetterResponse {
            success: false,
            deleted: None,
            error: Some("No letter at that index".to_string()),
        }),
        Err(e) => {
            log::error!("Failed to delete letter: {}", e);
            HttpResponse::InternalServerError().json(DeleteLetterResponse {
                success: false,
                deleted: None,
                error: Some(e.to_string()),
            })
        }
    }
}
