use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, warn};

use super::catalog::home_page;
use super::profile::ORDERS;
use super::render;
use crate::addresses::ADDRESSES;
use crate::cart::CART;
use crate::error::ApiResult;
use crate::models::{LoginRequest, RegisterRequest};
use crate::state::AppState;
use crate::validation;

fn forget_user_caches(state: &AppState) {
    state.queries.remove_resource(CART);
    state.queries.remove_resource(ADDRESSES);
    state.queries.remove_resource(ORDERS);
}

pub async fn login_page(state: web::Data<AppState>) -> HttpResponse {
    render(&state, "login", json!({}))
}

pub async fn register_page(state: web::Data<AppState>) -> HttpResponse {
    render(&state, "register", json!({}))
}

async fn try_login(state: &AppState, request: &LoginRequest) -> ApiResult<String> {
    validation::login(request)?;
    let user = state.api.login(request).await?;
    let name = user.user_name.clone();
    state.session.set_user(user).await?;
    Ok(name)
}

pub async fn login(data: web::Json<LoginRequest>, state: web::Data<AppState>) -> HttpResponse {
    let mut request = data.into_inner();
    request.email = request.email.trim().to_string();

    match try_login(&state, &request).await {
        Ok(name) => {
            // the previous identity's cached data must not leak into this one
            forget_user_caches(&state);
            state.checkout_form().reset();
            state.gate.reset();
            info!(email = %request.email, "logged in");
            state.notifier.success(format!("Welcome back, {}", name));
            home_page(&state).await
        }
        Err(err) => {
            state.notifier.api_error(&err);
            render(&state, "login", json!({ "email": request.email }))
        }
    }
}

pub async fn register(data: web::Json<RegisterRequest>, state: web::Data<AppState>) -> HttpResponse {
    let mut request = data.into_inner();
    request.user_name = request.user_name.trim().to_string();
    request.email = request.email.trim().to_string();

    let outcome = match validation::register(&request) {
        Ok(()) => state.api.register(&request).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(_) => {
            info!(email = %request.email, "registered");
            state.notifier.success("Account created, please log in");
            render(&state, "login", json!({ "email": request.email }))
        }
        Err(err) => {
            state.notifier.api_error(&err);
            render(&state, "register", json!({
                "userName": request.user_name,
                "email": request.email,
            }))
        }
    }
}

/// Local identity is dropped even when the backend call fails.
pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    if let Err(e) = state.api.logout().await {
        warn!("Backend logout failed: {}", e);
    }
    if let Err(e) = state.session.clear().await {
        warn!("Could not clear persisted session: {}", e);
    }
    state.gate.sign_out();
    forget_user_caches(&state);
    state.checkout_form().reset();
    state.notifier.info("Logged out");
    home_page(&state).await
}
