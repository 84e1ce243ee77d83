//! Reservations (wishlist) repository

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::reservation::Reservation,
};

const SELECT_RESERVATION: &str = r#"
    SELECT r.reservation_id, r.user_id, r.book_id, b.name AS book_name, r.reservation_date
    FROM reservations r
    JOIN books b ON b.book_id = r.book_id
"#;

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_RESERVATION);
        builder.push(" WHERE r.reservation_id = ").push_bind(id);

        builder
            .build_query_as::<Reservation>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    pub async fn list(&self, user_id: Option<&str>, book_id: Option<i32>) -> AppResult<Vec<Reservation>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_RESERVATION);
        builder.push(" WHERE TRUE");
        if let Some(user_id) = user_id {
            builder.push(" AND r.user_id = ").push_bind(user_id.to_string());
        }
        if let Some(book_id) = book_id {
            builder.push(" AND r.book_id = ").push_bind(book_id);
        }
        builder.push(" ORDER BY r.reservation_date DESC, r.reservation_id DESC");

        let reservations = builder
            .build_query_as::<Reservation>()
            .fetch_all(&self.pool)
            .await?;
        Ok(reservations)
    }

    /// Wishlist entry of a user for a book
    pub async fn find(&self, user_id: &str, book_id: i32) -> AppResult<Option<i32>> {
        let id = sqlx::query_scalar::<_, i32>(
            "SELECT reservation_id FROM reservations WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    /// Add a book to a user's wishlist.
    /// Refused when the user already holds the book or already wishlisted it.
    pub async fn create(&self, user_id: &str, book_id: i32) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT book_id FROM books WHERE book_id = $1 FOR SHARE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let holds_book: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE user_id = $1 AND book_id = $2 AND currently_booked)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if holds_book {
            return Err(AppError::BusinessRule(
                "You already have an active booking for this book".to_string(),
            ));
        }

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO reservations (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            RETURNING reservation_id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict("Book is already in your wishlist".to_string()))?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reservations WHERE reservation_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Reservation with id {} not found", id)));
        }
        Ok(())
    }

    /// Remove a user's wishlist entry for a book, returning its id
    pub async fn delete_for_book(&self, user_id: &str, book_id: i32) -> AppResult<i32> {
        sqlx::query_scalar::<_, i32>(
            "DELETE FROM reservations WHERE user_id = $1 AND book_id = $2 RETURNING reservation_id",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Book is not in your wishlist".to_string()))
    }
}
