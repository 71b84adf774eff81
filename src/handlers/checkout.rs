use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::{render, Section};
use crate::checkout;
use crate::models::cart::subtotal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSelection {
    pub address_id: String,
}

pub async fn checkout_page(state: &AppState) -> HttpResponse {
    let items = state.cart().load().await;
    let addresses = state.addresses().load().await;
    let form = state.checkout_form().clone();

    let (summary, can_checkout) = match &items {
        Ok(items) => (
            Some(form.summary(items, state.config.delivery_charges)),
            form.can_checkout(items),
        ),
        Err(_) => (None, false),
    };

    render(state, "checkout", json!({
        "items": Section::load(items, &state.notifier),
        "addresses": Section::load(addresses, &state.notifier),
        "form": form,
        "summary": summary,
        "canCheckout": can_checkout,
    }))
}

pub async fn view(state: web::Data<AppState>) -> HttpResponse {
    checkout_page(&state).await
}

pub async fn apply_coupon(body: web::Json<CouponRequest>, state: web::Data<AppState>) -> HttpResponse {
    let items = match state.cart().load().await {
        Ok(items) => items,
        // the page's cart section reports the failure
        Err(_) => return checkout_page(&state).await,
    };
    let outcome = state.checkout_form().apply_coupon(&body.code, subtotal(&items));
    match outcome {
        Ok(discount) => {
            state.notifier.success(format!("Coupon applied: {} off", discount));
        }
        Err(err) => {
            state.notifier.error(err.to_string());
        }
    }
    checkout_page(&state).await
}

pub async fn select_address(body: web::Json<AddressSelection>, state: web::Data<AppState>) -> HttpResponse {
    let known = state
        .addresses()
        .load()
        .await
        .map(|list| list.iter().any(|a| a.id == body.address_id))
        .unwrap_or(false);

    if known {
        state.checkout_form().select_address(&body.address_id);
    } else {
        state.notifier.error("Choose one of your saved addresses");
    }
    checkout_page(&state).await
}

pub async fn reset(state: web::Data<AppState>) -> HttpResponse {
    state.checkout_form().reset();
    state.notifier.info("Checkout form reset");
    checkout_page(&state).await
}

/// Hands off to the external payment page, or stays on checkout with a toast.
pub async fn pay(state: web::Data<AppState>) -> HttpResponse {
    let items = match state.cart().load().await {
        Ok(items) => items,
        Err(_) => return checkout_page(&state).await,
    };
    let form = state.checkout_form().clone();

    match checkout::begin_payment(state.api.as_ref(), &state.payment, &form, &items).await {
        Ok(url) => HttpResponse::SeeOther()
            .append_header(("Location", url))
            .finish(),
        Err(err) => {
            state.notifier.api_error(&err);
            checkout_page(&state).await
        }
    }
}
