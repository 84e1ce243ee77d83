//! Review (rating) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub book_id: i32,
    pub user_id: String,
    pub username: String,
    pub rating: i32,
    pub review_date: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ReviewQuery {
    pub book_id: Option<i32>,
    pub user_id: Option<String>,
}

/// Create or replace the current user's review of a book
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertReview {
    pub book_id: i32,
    #[validate(range(min = 1, max = 5, message = "Rating must be an integer between 1 and 5"))]
    pub rating: i32,
    pub description: Option<String>,
}

/// Partial update of the current user's review
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReview {
    pub book_id: i32,
    #[validate(range(min = 1, max = 5, message = "Rating must be an integer between 1 and 5"))]
    pub rating: Option<i32>,
    pub description: Option<String>,
}

impl UpdateReview {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let review = |rating| UpsertReview {
            book_id: 1,
            rating,
            description: None,
        };
        assert!(review(0).validate().is_err());
        assert!(review(1).validate().is_ok());
        assert!(review(5).validate().is_ok());
        assert!(review(6).validate().is_err());
    }
}
