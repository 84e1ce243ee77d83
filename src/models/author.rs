//! Author and publisher models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub author_id: i32,
    pub name: String,
    pub bio: Option<String>,
}

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 50, message = "Author name must be 1 to 50 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Author bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

/// Update author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 50, message = "Author name must be 1 to 50 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Author bio must be at most 500 characters"))]
    pub bio: Option<String>,
}

/// Publisher model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Publisher {
    pub publisher_id: i32,
    pub name: String,
}

/// Create or rename a publisher
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PublisherRequest {
    #[validate(length(min = 1, max = 50, message = "Publisher name must be 1 to 50 characters"))]
    pub name: String,
}
