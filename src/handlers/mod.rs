pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod payment;
pub mod profile;

use std::future::Future;

use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::notify::Notifier;
use crate::state::AppState;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// A page region backed by one fetch. A failed fetch degrades the region,
/// not the page.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Section<T> {
    Ready { data: T },
    Error { message: String },
}

impl<T> Section<T> {
    pub fn load(result: ApiResult<T>, notifier: &Notifier) -> Self {
        match result {
            Ok(data) => Section::Ready { data },
            Err(err) => {
                notifier.api_error(&err);
                Section::Error {
                    message: err.user_message(),
                }
            }
        }
    }
}

/// Page view model: `{page, user, toasts, ..sections}`. Pending toasts are
/// handed to this page and dropped from the queue.
pub fn page_body(state: &AppState, page: &str, sections: Value) -> Value {
    let mut body = json!({
        "page": page,
        "user": state.session.user(),
        "toasts": state.notifier.drain(),
    });
    if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), sections) {
        target.extend(extra);
    }
    body
}

pub fn render(state: &AppState, page: &str, sections: Value) -> HttpResponse {
    HttpResponse::Ok().json(page_body(state, page, sections))
}

/// Renders `page` only after the session check resolved successfully;
/// otherwise the public home page takes its place at the same URL.
pub async fn protected<F, Fut>(state: &AppState, page: F) -> HttpResponse
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = HttpResponse>,
{
    if state.gate.guard(state.api.as_ref(), &state.session).await {
        page().await
    } else {
        catalog::home_page(state).await
    }
}

pub async fn not_found(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::NotFound().json(page_body(&state, "not-found", json!({})))
}
