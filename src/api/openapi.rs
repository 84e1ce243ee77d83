//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, bookings, books, events, health, reservations, reviews, transactions, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "1.0.0",
        description = "Books, bookings, wishlists and reviews for a lending library"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::login,
        auth::me,
        users::update_my_profile,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        // Books
        books::list_books,
        books::list_categories,
        books::get_book,
        books::book_status,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Authors and publishers
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::list_publishers,
        authors::get_publisher,
        authors::create_publisher,
        authors::update_publisher,
        // Bookings
        bookings::list_bookings,
        bookings::list_pending_returns,
        bookings::get_booking,
        bookings::create_booking,
        bookings::update_booking,
        bookings::request_return,
        bookings::cancel_return_request,
        bookings::approve_return,
        // Wishlist
        reservations::list_reservations,
        reservations::get_reservation,
        reservations::add_to_wishlist,
        reservations::remove_by_book,
        reservations::remove_from_wishlist,
        // Reviews
        reviews::list_reviews,
        reviews::get_review,
        reviews::upsert_review,
        reviews::update_review,
        // Transactions
        transactions::list_transactions,
        transactions::get_transaction,
        // Events
        events::stream_events,
    ),
    components(
        schemas(
            // Auth
            auth::SignupRequest,
            auth::SignupResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdateProfile,
            // Books
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::CategoriesResponse,
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::author::Publisher,
            crate::models::author::PublisherRequest,
            // Bookings
            crate::models::booking::BookingState,
            crate::models::booking::BookingDetails,
            crate::models::booking::CreateBooking,
            crate::models::booking::UpdateBooking,
            crate::models::booking::PendingReturns,
            crate::models::booking::BookAction,
            crate::models::booking::BookUserStatus,
            // Wishlist
            crate::models::reservation::Reservation,
            crate::models::reservation::CreateReservation,
            // Reviews
            crate::models::review::Review,
            crate::models::review::UpsertReview,
            crate::models::review::UpdateReview,
            // Transactions
            crate::models::transaction::Transaction,
            crate::models::transaction::TransactionKind,
            // Events
            crate::models::event::CatalogEvent,
            crate::models::event::EventKind,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login and profile"),
        (name = "users", description = "User management"),
        (name = "books", description = "Book catalog"),
        (name = "authors", description = "Authors"),
        (name = "publishers", description = "Publishers"),
        (name = "bookings", description = "Bookings and returns"),
        (name = "reservations", description = "Wishlist"),
        (name = "reviews", description = "Ratings and reviews"),
        (name = "transactions", description = "Circulation history"),
        (name = "events", description = "Change feed")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` JWT scheme referenced by secured paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
