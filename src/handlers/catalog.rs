use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use super::{render, Section};
use crate::models::meal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MenuQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn home_page(state: &AppState) -> HttpResponse {
    let catalog = state.catalog();
    let popular = Section::load(catalog.popular_meals().await, &state.notifier);
    let restaurants = Section::load(catalog.restaurants().await, &state.notifier);
    render(state, "home", json!({
        "popularMeals": popular,
        "restaurants": restaurants,
    }))
}

pub async fn home(state: web::Data<AppState>) -> HttpResponse {
    home_page(&state).await
}

pub async fn menu(query: web::Query<MenuQuery>, state: web::Data<AppState>) -> HttpResponse {
    let catalog = state.catalog();
    let category = query.category.as_deref();
    let categories = catalog.meals().await.map(|all| meal::categories(&all));
    let meals = Section::load(catalog.meals_in_category(category).await, &state.notifier);
    render(&state, "menu", json!({
        "category": category,
        "categories": categories.unwrap_or_default(),
        "meals": meals,
    }))
}

pub async fn search(query: web::Query<SearchQuery>, state: web::Data<AppState>) -> HttpResponse {
    let q = query.q.trim();
    let results = Section::load(state.catalog().search(q).await, &state.notifier);
    render(&state, "search", json!({
        "query": q,
        "results": results,
    }))
}

pub async fn restaurant(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let id = path.into_inner();
    let detail = Section::load(state.catalog().restaurant(&id).await, &state.notifier);
    render(&state, "restaurant", json!({ "restaurant": detail }))
}

pub async fn product(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    let meal_id = path.into_inner();
    let meal = Section::load(state.catalog().meal(&meal_id).await, &state.notifier);

    let cart = state.cart();
    // quantity badge only; a failed cart read already shows up on the cart page
    let _ = cart.load().await;
    render(&state, "product", json!({
        "meal": meal,
        "inCart": cart.quantity_of(&meal_id),
    }))
}
