//! Wishlist endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, RemoveReservationParams, Reservation, ReservationQuery},
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(ReservationQuery),
    responses(
        (status = 200, description = "Wishlist entries (own entries for non-admins)", body = Vec<Reservation>)
    )
)]
pub async fn list_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ReservationQuery>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state.services.reservations.list(&claims, query).await?;
    Ok(Json(reservations))
}

#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Wishlist entry", body = Reservation),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.services.reservations.get(&claims, id).await?;
    Ok(Json(reservation))
}

/// Add a book to the wishlist
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Added to wishlist", body = Reservation),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already in wishlist"),
        (status = 422, description = "Book is currently booked by this user")
    )
)]
pub async fn add_to_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state.services.reservations.add(&claims, request.book_id).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Remove the current user's wishlist entry for a book
#[utoipa::path(
    delete,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(RemoveReservationParams),
    responses(
        (status = 204, description = "Removed from wishlist"),
        (status = 404, description = "Book is not in the wishlist")
    )
)]
pub async fn remove_by_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(params): Query<RemoveReservationParams>,
) -> AppResult<StatusCode> {
    state
        .services
        .reservations
        .remove_for_book(&claims, params.book_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a wishlist entry
#[utoipa::path(
    delete,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 204, description = "Removed from wishlist"),
        (status = 403, description = "Not your reservation"),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn remove_from_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.reservations.remove(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
