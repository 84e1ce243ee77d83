//! Book (catalog entry) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book row as stored in the `books` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub book_id: i32,
    pub name: String,
    pub author_id: i32,
    pub category: String,
    pub genre: String,
    pub publisher_id: Option<i32>,
    pub publish_date: NaiveDate,
    pub language: String,
    pub page_count: i32,
    pub copies_available: i32,
    pub img_link: Option<String>,
    pub rated_type: String,
    pub description: Option<String>,
}

/// Short book representation for dashboard rows and search results
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub book_id: i32,
    pub name: String,
    pub author_name: String,
    pub category: String,
    pub genre: String,
    pub img_link: Option<String>,
    pub copies_available: i32,
    pub rating: f64,
}

/// Book with author, publisher and rating information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author_name: String,
    pub author_bio: Option<String>,
    pub publisher_name: Option<String>,
    /// Average rating rounded to one decimal, 0 when unrated
    pub rating: f64,
    pub users_rated: i64,
}

/// Book search parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Free search over name, author, category and genre
    pub q: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    /// Only books with at least one copy available
    pub available_only: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,
    /// Resolved to an existing author by name, or created
    #[validate(length(min = 1, max = 50, message = "Author name must be 1 to 50 characters"))]
    pub author_name: String,
    /// Resolved to an existing publisher by name, or created
    #[validate(length(min = 1, max = 50, message = "Publisher name must be 1 to 50 characters"))]
    pub publisher_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    pub category: String,
    #[validate(length(min = 1, max = 50, message = "Genre must be 1 to 50 characters"))]
    pub genre: String,
    /// Publication date (YYYY-MM-DD)
    pub publish_date: NaiveDate,
    #[validate(length(min = 1, max = 30, message = "Language must be 1 to 30 characters"))]
    pub language: String,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: i32,
    #[validate(range(min = 0, message = "Copies available cannot be negative"))]
    pub copies_available: i32,
    #[validate(length(max = 255, message = "Image link must be at most 255 characters"))]
    pub img_link: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Rated type must be 1 to 20 characters"))]
    pub rated_type: String,
    pub description: Option<String>,
}

/// Partial book update (admin)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Author name must be 1 to 50 characters"))]
    pub author_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Publisher name must be 1 to 50 characters"))]
    pub publisher_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Genre must be 1 to 50 characters"))]
    pub genre: Option<String>,
    pub publish_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 30, message = "Language must be 1 to 30 characters"))]
    pub language: Option<String>,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: Option<i32>,
    #[validate(range(min = 0, message = "Copies available cannot be negative"))]
    pub copies_available: Option<i32>,
    #[validate(length(max = 255, message = "Image link must be at most 255 characters"))]
    pub img_link: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Rated type must be 1 to 20 characters"))]
    pub rated_type: Option<String>,
    pub description: Option<String>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.author_name.is_none()
            && self.publisher_name.is_none()
            && self.category.is_none()
            && self.genre.is_none()
            && self.publish_date.is_none()
            && self.language.is_none()
            && self.page_count.is_none()
            && self.copies_available.is_none()
            && self.img_link.is_none()
            && self.rated_type.is_none()
            && self.description.is_none()
    }
}

/// Distinct categories, used to build the dashboard rows
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<String>,
}

/// Round an average rating to one decimal place (0 when nobody rated)
pub fn round_rating(average: Option<f64>) -> f64 {
    average
        .map(|avg| (avg * 10.0).round() / 10.0)
        .unwrap_or(0.0)
}

/// Normalise a search term into a `LIKE ... ESCAPE '\'` substring pattern.
/// Trimmed; empty becomes None.
pub fn search_term(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(&s.to_lowercase())))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
