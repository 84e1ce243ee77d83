//! Booking endpoints: borrow, request return, approve return

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::booking::{BookingDetails, BookingQuery, CreateBooking, PendingReturns, UpdateBooking},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List bookings (own bookings for non-admins)
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(BookingQuery),
    responses(
        (status = 200, description = "Bookings", body = PaginatedResponse<BookingDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<PaginatedResponse<BookingDetails>>> {
    let (page, per_page, offset) = state.config.library.paginate(query.page, query.per_page);
    let (bookings, total) = state
        .services
        .bookings
        .list(&claims, query, per_page, offset)
        .await?;

    Ok(Json(PaginatedResponse::new(bookings, total, page, per_page)))
}

/// Return requests awaiting approval
#[utoipa::path(
    get,
    path = "/bookings/pending",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending return requests, oldest first", body = PendingReturns),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_pending_returns(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<PendingReturns>> {
    let pending = state.services.bookings.pending_returns(&claims).await?;
    Ok(Json(pending))
}

/// Get a booking
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking", body = BookingDetails),
        (status = 403, description = "Not your booking"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.get(&claims, id).await?;
    Ok(Json(booking))
}

/// Book a copy
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = BookingDetails),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "Book already booked by this user"),
        (status = 422, description = "No copies available or booking limit reached")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<BookingDetails>)> {
    let booking = state.services.bookings.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Update a booking (admin); flag changes follow the booking lifecycle
#[utoipa::path(
    put,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = UpdateBooking,
    responses(
        (status = 200, description = "Booking updated", body = BookingDetails),
        (status = 400, description = "No valid fields to update"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Transition not allowed")
    )
)]
pub async fn update_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(update): Json<UpdateBooking>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.update(&claims, id, update).await?;
    Ok(Json(booking))
}

/// Ask to return a booked copy
#[utoipa::path(
    post,
    path = "/bookings/{id}/return-request",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Return requested", body = BookingDetails),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Booking is not in the booked state")
    )
)]
pub async fn request_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.request_return(&claims, id).await?;
    Ok(Json(booking))
}

/// Withdraw or reject a return request
#[utoipa::path(
    delete,
    path = "/bookings/{id}/return-request",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Return request cancelled", body = BookingDetails),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "No return request pending")
    )
)]
pub async fn cancel_return_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.cancel_return_request(&claims, id).await?;
    Ok(Json(booking))
}

/// Approve a return (admin)
#[utoipa::path(
    post,
    path = "/bookings/{id}/approve-return",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Return approved", body = BookingDetails),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Booking already returned")
    )
)]
pub async fn approve_return(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.approve_return(&claims, id).await?;
    Ok(Json(booking))
}
