//! Review endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::review::{Review, ReviewQuery, UpdateReview, UpsertReview},
};

use super::AuthenticatedUser;

#[utoipa::path(
    get,
    path = "/reviews",
    tag = "reviews",
    params(ReviewQuery),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<Review>)
    )
)]
pub async fn list_reviews(
    State(state): State<crate::AppState>,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.services.reviews.list(&query).await?;
    Ok(Json(reviews))
}

#[utoipa::path(
    get,
    path = "/reviews/{book_id}/{user_id}",
    tag = "reviews",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
        ("user_id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Review", body = Review),
        (status = 404, description = "Review not found")
    )
)]
pub async fn get_review(
    State(state): State<crate::AppState>,
    Path((book_id, user_id)): Path<(i32, String)>,
) -> AppResult<Json<Review>> {
    let review = state.services.reviews.get(book_id, &user_id).await?;
    Ok(Json(review))
}

/// Rate a book (creates or replaces the current user's review)
#[utoipa::path(
    post,
    path = "/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    request_body = UpsertReview,
    responses(
        (status = 201, description = "Review saved", body = Review),
        (status = 400, description = "Rating must be between 1 and 5"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn upsert_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(review): Json<UpsertReview>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let saved = state.services.reviews.upsert(&claims, review).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[utoipa::path(
    put,
    path = "/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn update_review(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(review): Json<UpdateReview>,
) -> AppResult<Json<Review>> {
    let saved = state.services.reviews.update(&claims, review).await?;
    Ok(Json(saved))
}
