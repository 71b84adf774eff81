mod addresses;
mod auth_gate;
mod cart;
mod catalog;
mod checkout;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod notify;
mod query;
mod services;
mod session;
mod state;
mod storage;
mod validation;

#[cfg(test)]
mod testing;

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::NormalizePath;
use actix_web::{web, App, HttpServer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use services::HttpFoodApi;
use state::AppState;
use storage::SqliteStorage;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("FOODIE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::load();

    let pool = db::init_pool(&config.database_url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to open local storage: {e}")))?;
    let api = HttpFoodApi::new(&config.api_base_url, config.request_timeout)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to build HTTP client: {e}")))?;

    let port = config.port;
    let app_state = AppState::new(Arc::new(api), Arc::new(SqliteStorage::new(pool)), config);
    if let Err(e) = app_state.session.rehydrate().await {
        warn!("Starting without persisted session: {}", e);
    }
    info!(port, backend = %app_state.config.api_base_url, "foodie client listening");
    let app_state = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .route("/", web::get().to(handlers::catalog::home))
            .route("/health", web::get().to(handlers::health_check))

            .route("/menu", web::get().to(handlers::catalog::menu))
            .route("/search", web::get().to(handlers::catalog::search))
            .route("/restaurant/{id}", web::get().to(handlers::catalog::restaurant))
            .route("/product/{meal_id}", web::get().to(handlers::catalog::product))

            .route("/cart", web::get().to(handlers::cart::view))
            .route("/cart/add/{meal_id}", web::post().to(handlers::cart::add))
            .route("/cart/remove/{meal_id}", web::post().to(handlers::cart::remove))
            .route("/cart/increment/{meal_id}", web::post().to(handlers::cart::increment))
            .route("/cart/decrement/{meal_id}", web::post().to(handlers::cart::decrement))
            .route("/cart/clear", web::post().to(handlers::cart::clear))

            .route("/checkout", web::get().to(handlers::checkout::view))
            .route("/checkout/coupon", web::post().to(handlers::checkout::apply_coupon))
            .route("/checkout/address", web::post().to(handlers::checkout::select_address))
            .route("/checkout/reset", web::post().to(handlers::checkout::reset))
            .route("/checkout/pay", web::post().to(handlers::checkout::pay))

            .route("/profile", web::get().to(handlers::profile::view))
            .route("/profile/addresses", web::post().to(handlers::profile::add_address))
            .route("/profile/addresses/{id}", web::put().to(handlers::profile::update_address))
            .route("/profile/addresses/{id}", web::delete().to(handlers::profile::delete_address))

            .route("/payment/success", web::get().to(handlers::payment::success))
            .route("/payment/failure", web::get().to(handlers::payment::failure))

            .route("/login", web::get().to(handlers::auth::login_page))
            .route("/login", web::post().to(handlers::auth::login))
            .route("/register", web::get().to(handlers::auth::register_page))
            .route("/register", web::post().to(handlers::auth::register))
            .route("/logout", web::post().to(handlers::auth::logout))

            .default_service(web::to(handlers::not_found))
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
