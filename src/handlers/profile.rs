use actix_web::{web, HttpResponse};
use serde_json::json;

use super::{protected, render, Section};
use crate::error::ApiResult;
use crate::models::order::newest_first;
use crate::models::{AddressForm, Order};
use crate::query::QueryKey;
use crate::state::AppState;

pub const ORDERS: &str = "orders";

pub fn orders_key(user_id: &str) -> QueryKey {
    QueryKey::new(ORDERS, [user_id])
}

async fn load_orders(state: &AppState) -> ApiResult<Vec<Order>> {
    let Some(user_id) = state.session.user_id() else {
        return Ok(Vec::new());
    };
    let api = state.api.clone();
    let orders = state
        .queries
        .fetch(&orders_key(&user_id), state.config.cart_stale, move || async move {
            api.orders().await
        })
        .await?;
    Ok(newest_first(orders))
}

pub async fn profile_page(state: &AppState) -> HttpResponse {
    let addresses = state.addresses().load().await;
    let orders = load_orders(state).await;
    render(state, "profile", json!({
        "addresses": Section::load(addresses, &state.notifier),
        "orders": Section::load(orders, &state.notifier),
    }))
}

pub async fn view(state: web::Data<AppState>) -> HttpResponse {
    protected(&state, || profile_page(&state)).await
}

pub async fn add_address(form: web::Json<AddressForm>, state: web::Data<AppState>) -> HttpResponse {
    protected(&state, || async {
        // toast already queued by the address book
        let _ = state.addresses().add(&form).await;
        profile_page(&state).await
    })
    .await
}

pub async fn update_address(
    path: web::Path<String>,
    form: web::Json<AddressForm>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let id = path.into_inner();
    protected(&state, || async {
        let _ = state.addresses().update(&id, &form).await;
        profile_page(&state).await
    })
    .await
}

pub async fn delete_address(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let id = path.into_inner();
    protected(&state, || async {
        if state.addresses().delete(&id).await.is_ok() {
            let mut form = state.checkout_form();
            if form.selected_address.as_deref() == Some(id.as_str()) {
                form.selected_address = None;
            }
        }
        profile_page(&state).await
    })
    .await
}
