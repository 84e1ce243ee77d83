//! Bookings repository.
//!
//! Every change to booking flags and to `books.copies_available` happens here,
//! inside one database transaction holding row locks, so the copies counter and
//! the transaction log always agree with the bookings table.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::booking::{
        Booking, BookingDetails, BookingDetailsRow, BookingQuery, BookingState, TransitionEffect,
    },
    repository::transactions::TransactionsRepository,
};

const SELECT_BOOKING: &str = r#"
    SELECT bk.booking_id, bk.user_id, u.username, bk.book_id, b.name AS book_name,
           bk.booking_date, bk.due_date, bk.currently_booked, bk.pending_return, bk.returned_date
    FROM bookings bk
    JOIN users u ON u.user_id = bk.user_id
    JOIN books b ON b.book_id = bk.book_id
"#;

/// Requested change to an existing booking, resolved against its locked row
#[derive(Debug, Clone, Copy)]
pub struct BookingChange {
    pub target: BookingState,
    pub due_date: Option<DateTime<Utc>>,
}

/// Outcome of a committed booking change
#[derive(Debug)]
pub struct BookingTransition {
    pub booking: Booking,
    pub from: BookingState,
    pub to: BookingState,
    pub effect: TransitionEffect,
    /// Copies on the shelf after a completed return
    pub copies_available: Option<i32>,
}

/// Outcome of a committed booking creation
#[derive(Debug)]
pub struct NewBooking {
    pub booking: Booking,
    pub copies_available: i32,
    /// Wishlist entry removed because the user now holds the book
    pub removed_reservation: Option<i32>,
}

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get booking by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    /// Get booking joined with user and book names
    pub async fn get_details(&self, id: i32) -> AppResult<BookingDetails> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_BOOKING);
        builder.push(" WHERE bk.booking_id = ").push_bind(id);

        let row = builder
            .build_query_as::<BookingDetailsRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))?;

        BookingDetails::try_from(row)
    }

    /// Search bookings with pagination, newest first
    pub async fn search(&self, query: &BookingQuery, limit: i64, offset: i64) -> AppResult<(Vec<BookingDetails>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM bookings bk WHERE TRUE");
        push_booking_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(SELECT_BOOKING);
        select.push(" WHERE TRUE");
        push_booking_filters(&mut select, query);
        select
            .push(" ORDER BY bk.booking_date DESC, bk.booking_id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = select
            .build_query_as::<BookingDetailsRow>()
            .fetch_all(&self.pool)
            .await?;

        let bookings = rows
            .into_iter()
            .map(BookingDetails::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((bookings, total))
    }

    /// Bookings awaiting return approval, oldest first
    pub async fn pending_returns(&self) -> AppResult<Vec<BookingDetails>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_BOOKING);
        builder.push(" WHERE bk.currently_booked AND bk.pending_return ORDER BY bk.booking_date, bk.booking_id");

        builder
            .build_query_as::<BookingDetailsRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(BookingDetails::try_from)
            .collect()
    }

    /// Active (not returned) booking of a user for a book
    pub async fn active_for(&self, user_id: &str, book_id: i32) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE user_id = $1 AND book_id = $2 AND currently_booked
            ORDER BY booking_date DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(booking)
    }

    /// Book a copy for a user.
    ///
    /// Locks the user row then the book row, checks availability and limits,
    /// takes one copy, drops the user's wishlist entry for the book and logs a
    /// `reserved` transaction.
    pub async fn create(
        &self,
        user_id: &str,
        book_id: i32,
        due_date: DateTime<Utc>,
        max_active: i64,
    ) -> AppResult<NewBooking> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, String>("SELECT user_id FROM users WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        let copies: i32 = sqlx::query_scalar("SELECT copies_available FROM books WHERE book_id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let already_booked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE user_id = $1 AND book_id = $2 AND currently_booked)",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_booked {
            return Err(AppError::Conflict("You already have an active booking for this book".to_string()));
        }

        if copies <= 0 {
            return Err(AppError::BusinessRule("No copies available".to_string()));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE user_id = $1 AND currently_booked",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if active >= max_active {
            return Err(AppError::BusinessRule(format!(
                "Maximum active bookings reached ({}/{})",
                active, max_active
            )));
        }

        let copies_available: i32 = sqlx::query_scalar(
            r#"
            UPDATE books SET copies_available = copies_available - 1
            WHERE book_id = $1
            RETURNING copies_available
            "#,
        )
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (user_id, book_id, due_date, currently_booked, pending_return)
            VALUES ($1, $2, $3, TRUE, FALSE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        let removed_reservation = sqlx::query_scalar::<_, i32>(
            "DELETE FROM reservations WHERE user_id = $1 AND book_id = $2 RETURNING reservation_id",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?;

        TransactionsRepository::record(&mut tx, user_id, book_id, true).await?;

        tx.commit().await?;

        Ok(NewBooking {
            booking,
            copies_available,
            removed_reservation,
        })
    }

    /// Apply a state change to a booking.
    ///
    /// `resolve` sees the locked row and decides the target state (and may
    /// refuse, e.g. for permission checks). Completing a return puts the copy
    /// back and logs a `returned` transaction in the same database transaction.
    pub async fn transition<F>(&self, id: i32, resolve: F) -> AppResult<BookingTransition>
    where
        F: FnOnce(&Booking, BookingState) -> AppResult<BookingChange>,
    {
        let mut tx = self.pool.begin().await?;

        let book_id = sqlx::query_scalar::<_, i32>("SELECT book_id FROM bookings WHERE booking_id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))?;

        // Book row before booking row, the same order as create and book deletion
        sqlx::query("SELECT 1 FROM books WHERE book_id = $1 FOR UPDATE")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        let current = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))?;

        let from = current.state()?;
        let change = resolve(&current, from)?;

        let effect = if change.target == from && change.due_date.is_some() && from.is_active() {
            // Due date change only
            TransitionEffect::None
        } else {
            from.transition(change.target)?
        };

        if let Some(due_date) = change.due_date {
            if due_date <= current.booking_date {
                return Err(AppError::Validation("Due date must be after the booking date".to_string()));
            }
        }

        let (currently_booked, pending_return) = change.target.flags();
        let completes_return = effect == TransitionEffect::CompleteReturn;

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET currently_booked = $2,
                pending_return = $3,
                due_date = COALESCE($4, due_date),
                returned_date = CASE WHEN $5 THEN NOW() ELSE returned_date END
            WHERE booking_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(currently_booked)
        .bind(pending_return)
        .bind(change.due_date)
        .bind(completes_return)
        .fetch_one(&mut *tx)
        .await?;

        let copies_available = if completes_return {
            let copies: i32 = sqlx::query_scalar(
                r#"
                UPDATE books SET copies_available = copies_available + 1
                WHERE book_id = $1
                RETURNING copies_available
                "#,
            )
            .bind(booking.book_id)
            .fetch_one(&mut *tx)
            .await?;

            TransactionsRepository::record(&mut tx, &booking.user_id, booking.book_id, false).await?;
            Some(copies)
        } else {
            None
        };

        tx.commit().await?;

        Ok(BookingTransition {
            booking,
            from,
            to: change.target,
            effect,
            copies_available,
        })
    }
}

fn push_booking_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookingQuery) {
    if let Some(ref user_id) = query.user_id {
        builder.push(" AND bk.user_id = ").push_bind(user_id.clone());
    }
    if let Some(book_id) = query.book_id {
        builder.push(" AND bk.book_id = ").push_bind(book_id);
    }
    match query.pending {
        Some(true) => {
            builder.push(" AND bk.currently_booked AND bk.pending_return");
        }
        Some(false) => {
            builder.push(" AND NOT bk.pending_return");
        }
        None => {}
    }
    match query.active {
        Some(true) => {
            builder.push(" AND bk.currently_booked");
        }
        Some(false) => {
            builder.push(" AND NOT bk.currently_booked");
        }
        None => {}
    }
}
