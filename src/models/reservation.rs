//! Reservation (wishlist) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Wishlist entry joined with the book name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub reservation_id: i32,
    pub user_id: String,
    pub book_id: i32,
    pub book_name: String,
    pub reservation_date: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReservationQuery {
    pub user_id: Option<String>,
    pub book_id: Option<i32>,
}

/// Add a book to the current user's wishlist
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservation {
    pub book_id: i32,
}

/// Remove the current user's wishlist entry for a book
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemoveReservationParams {
    pub book_id: i32,
}
