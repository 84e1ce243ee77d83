//! Library catalog server
//!
//! REST JSON API for a lending library: catalog browsing, bookings with
//! librarian-approved returns, wishlists, ratings and a circulation log.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/signup", post(api::auth::signup))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        .route("/auth/profile", put(api::users::update_my_profile))
        // Users
        .route("/users", get(api::users::list_users).post(api::users::create_user))
        .route("/users/:id", get(api::users::get_user).put(api::users::update_user))
        // Books
        .route("/books", get(api::books::list_books).post(api::books::create_book))
        .route("/books/categories", get(api::books::list_categories))
        .route(
            "/books/:id",
            get(api::books::get_book)
                .put(api::books::update_book)
                .delete(api::books::delete_book),
        )
        .route("/books/:id/status", get(api::books::book_status))
        // Authors and publishers
        .route("/authors", get(api::authors::list_authors).post(api::authors::create_author))
        .route("/authors/:id", get(api::authors::get_author).put(api::authors::update_author))
        .route(
            "/publishers",
            get(api::authors::list_publishers).post(api::authors::create_publisher),
        )
        .route(
            "/publishers/:id",
            get(api::authors::get_publisher).put(api::authors::update_publisher),
        )
        // Bookings
        .route(
            "/bookings",
            get(api::bookings::list_bookings).post(api::bookings::create_booking),
        )
        .route("/bookings/pending", get(api::bookings::list_pending_returns))
        .route(
            "/bookings/:id",
            get(api::bookings::get_booking).put(api::bookings::update_booking),
        )
        .route(
            "/bookings/:id/return-request",
            post(api::bookings::request_return).delete(api::bookings::cancel_return_request),
        )
        .route("/bookings/:id/approve-return", post(api::bookings::approve_return))
        // Wishlist
        .route(
            "/reservations",
            get(api::reservations::list_reservations)
                .post(api::reservations::add_to_wishlist)
                .delete(api::reservations::remove_by_book),
        )
        .route(
            "/reservations/:id",
            get(api::reservations::get_reservation).delete(api::reservations::remove_from_wishlist),
        )
        // Reviews
        .route(
            "/reviews",
            get(api::reviews::list_reviews)
                .post(api::reviews::upsert_review)
                .put(api::reviews::update_review),
        )
        .route("/reviews/:book_id/:user_id", get(api::reviews::get_review))
        // Transactions
        .route("/transactions", get(api::transactions::list_transactions))
        .route("/transactions/:id", get(api::transactions::get_transaction))
        // Change feed
        .route("/events", get(api::events::stream_events))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(api::openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
