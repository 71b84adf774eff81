use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{render, Section};
use crate::cart::CartAction;
use crate::state::AppState;

pub async fn cart_page(state: &AppState) -> HttpResponse {
    let items = state.cart().load().await;
    let summary = items
        .as_ref()
        .ok()
        .map(|items| state.checkout_form().summary(items, state.config.delivery_charges));
    render(state, "cart", json!({
        "items": Section::load(items, &state.notifier),
        "summary": summary,
    }))
}

pub async fn view(state: web::Data<AppState>) -> HttpResponse {
    cart_page(&state).await
}

async fn act(state: &AppState, action: CartAction, meal_id: &str) -> HttpResponse {
    let cart = state.cart();
    // outcome is already queued as a toast for the page below
    let _ = match action {
        CartAction::Add => cart.add(meal_id).await,
        CartAction::Remove => cart.remove(meal_id).await,
        CartAction::Increment => cart.increment(meal_id).await,
        CartAction::Decrement => cart.decrement(meal_id).await,
        CartAction::Clear => cart.clear().await,
    };
    cart_page(state).await
}

pub async fn add(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    act(&state, CartAction::Add, &path.into_inner()).await
}

pub async fn remove(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    act(&state, CartAction::Remove, &path.into_inner()).await
}

pub async fn increment(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    act(&state, CartAction::Increment, &path.into_inner()).await
}

pub async fn decrement(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    act(&state, CartAction::Decrement, &path.into_inner()).await
}

pub async fn clear(state: web::Data<AppState>) -> HttpResponse {
    act(&state, CartAction::Clear, "").await
}
