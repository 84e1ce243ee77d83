//! Reviews repository

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::review::{Review, UpdateReview, UpsertReview},
};

const SELECT_REVIEW: &str = r#"
    SELECT r.book_id, r.user_id, u.username, r.rating, r.review_date, r.description
    FROM reviews r
    JOIN users u ON u.user_id = r.user_id
"#;

#[derive(Clone)]
pub struct ReviewsRepository {
    pool: Pool<Postgres>,
}

impl ReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, book_id: i32, user_id: &str) -> AppResult<Review> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_REVIEW);
        builder
            .push(" WHERE r.book_id = ")
            .push_bind(book_id)
            .push(" AND r.user_id = ")
            .push_bind(user_id.to_string());

        builder
            .build_query_as::<Review>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }

    pub async fn list(&self, book_id: Option<i32>, user_id: Option<&str>) -> AppResult<Vec<Review>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_REVIEW);
        builder.push(" WHERE TRUE");
        if let Some(book_id) = book_id {
            builder.push(" AND r.book_id = ").push_bind(book_id);
        }
        if let Some(user_id) = user_id {
            builder.push(" AND r.user_id = ").push_bind(user_id.to_string());
        }
        builder.push(" ORDER BY r.review_date DESC");

        let reviews = builder.build_query_as::<Review>().fetch_all(&self.pool).await?;
        Ok(reviews)
    }

    /// Rating a user gave to a book
    pub async fn rating_of(&self, book_id: i32, user_id: &str) -> AppResult<Option<i32>> {
        let rating = sqlx::query_scalar::<_, i32>(
            "SELECT rating FROM reviews WHERE book_id = $1 AND user_id = $2",
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating)
    }

    /// Insert or replace a user's review of a book
    pub async fn upsert(&self, user_id: &str, review: &UpsertReview) -> AppResult<Review> {
        let book_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE book_id = $1)")
            .bind(review.book_id)
            .fetch_one(&self.pool)
            .await?;
        if !book_exists {
            return Err(AppError::NotFound(format!("Book with id {} not found", review.book_id)));
        }

        sqlx::query(
            r#"
            INSERT INTO reviews (book_id, user_id, rating, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (book_id, user_id)
            DO UPDATE SET rating = EXCLUDED.rating,
                          description = EXCLUDED.description,
                          review_date = NOW()
            "#,
        )
        .bind(review.book_id)
        .bind(user_id)
        .bind(review.rating)
        .bind(&review.description)
        .execute(&self.pool)
        .await?;

        self.get(review.book_id, user_id).await
    }

    /// Update fields of an existing review
    pub async fn update(&self, user_id: &str, update: &UpdateReview) -> AppResult<Review> {
        let result = sqlx::query(
            r#"
            UPDATE reviews
            SET rating = COALESCE($3, rating),
                description = COALESCE($4, description),
                review_date = NOW()
            WHERE book_id = $1 AND user_id = $2
            "#,
        )
        .bind(update.book_id)
        .bind(user_id)
        .bind(update.rating)
        .bind(&update.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Review not found".to_string()));
        }

        self.get(update.book_id, user_id).await
    }
}
