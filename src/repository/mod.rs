//! Repository layer for database operations

pub mod authors;
pub mod bookings;
pub mod books;
pub mod reservations;
pub mod reviews;
pub mod transactions;
pub mod users;

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::DatabaseConfig;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub books: books::BooksRepository,
    pub authors: authors::AuthorsRepository,
    pub publishers: authors::PublishersRepository,
    pub bookings: bookings::BookingsRepository,
    pub reservations: reservations::ReservationsRepository,
    pub reviews: reviews::ReviewsRepository,
    pub transactions: transactions::TransactionsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            publishers: authors::PublishersRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            reviews: reviews::ReviewsRepository::new(pool.clone()),
            transactions: transactions::TransactionsRepository::new(pool.clone()),
            pool,
        }
    }

    /// `SELECT 1` round trip
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Connect to PostgreSQL, retrying while the database comes up
pub async fn connect_pool(config: &DatabaseConfig) -> Result<Pool<Postgres>, sqlx::Error> {
    let attempts = config.connect_retries.max(1);
    let mut attempt = 1;

    loop {
        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await;

        match result {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    "Database connection attempt {}/{} failed: {}. Retrying in {}s",
                    attempt,
                    attempts,
                    e,
                    config.retry_delay_secs
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_secs(config.retry_delay_secs)).await;
            }
            Err(e) => {
                tracing::error!("Could not connect to database after {} attempts", attempts);
                return Err(e);
            }
        }
    }
}
