//! Transactions (circulation history) repository

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::transaction::{Transaction, TransactionRow},
};

const SELECT_TRANSACTION: &str = r#"
    SELECT t.transaction_id, t.user_id, u.username, t.book_id, b.name AS book_name,
           t.transaction_date, t.reserved
    FROM transactions t
    JOIN users u ON u.user_id = t.user_id
    JOIN books b ON b.book_id = t.book_id
"#;

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append an entry; runs on the caller's connection so it commits with the booking change
    pub async fn record(conn: &mut PgConnection, user_id: &str, book_id: i32, reserved: bool) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO transactions (user_id, book_id, reserved)
            VALUES ($1, $2, $3)
            RETURNING transaction_id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(reserved)
        .fetch_one(conn)
        .await?;
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Transaction> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_TRANSACTION);
        builder.push(" WHERE t.transaction_id = ").push_bind(id);

        builder
            .build_query_as::<TransactionRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(Transaction::from)
            .ok_or_else(|| AppError::NotFound(format!("Transaction with id {} not found", id)))
    }

    /// Newest first
    pub async fn search(
        &self,
        user_id: Option<&str>,
        book_id: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Transaction>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM transactions t WHERE TRUE");
        push_filters(&mut count, user_id, book_id);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(SELECT_TRANSACTION);
        select.push(" WHERE TRUE");
        push_filters(&mut select, user_id, book_id);
        select
            .push(" ORDER BY t.transaction_date DESC, t.transaction_id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let transactions = select
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Transaction::from)
            .collect();

        Ok((transactions, total))
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, user_id: Option<&str>, book_id: Option<i32>) {
    if let Some(user_id) = user_id {
        builder.push(" AND t.user_id = ").push_bind(user_id.to_string());
    }
    if let Some(book_id) = book_id {
        builder.push(" AND t.book_id = ").push_bind(book_id);
    }
}
