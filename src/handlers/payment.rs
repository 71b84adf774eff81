use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use super::profile::ORDERS;
use super::{protected, render};
use crate::cart::CART;
use crate::state::AppState;

/// Landing page after the payment provider confirmed the order.
pub async fn success(state: web::Data<AppState>) -> HttpResponse {
    protected(&state, || async {
        state.queries.invalidate_resource(CART);
        state.queries.invalidate_resource(ORDERS);
        state.checkout_form().reset();
        info!(user = ?state.session.user_id(), "payment completed");
        state.notifier.success("Payment successful, your order is on its way");
        render(&state, "payment-success", json!({}))
    })
    .await
}

pub async fn failure(state: web::Data<AppState>) -> HttpResponse {
    protected(&state, || async {
        state.notifier.error("Payment failed or was cancelled");
        render(&state, "payment-failure", json!({}))
    })
    .await
}
