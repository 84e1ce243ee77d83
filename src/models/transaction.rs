//! Transaction history model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Reserved,
    Returned,
}

impl From<bool> for TransactionKind {
    fn from(reserved: bool) -> Self {
        if reserved {
            TransactionKind::Reserved
        } else {
            TransactionKind::Returned
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub transaction_id: i32,
    pub user_id: String,
    pub username: String,
    pub book_id: i32,
    pub book_name: String,
    pub transaction_date: DateTime<Utc>,
    pub reserved: bool,
}

/// Transaction log entry for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub transaction_id: i32,
    pub user_id: String,
    pub username: String,
    pub book_id: i32,
    pub book_name: String,
    pub transaction_date: DateTime<Utc>,
    pub reserved: bool,
    pub kind: TransactionKind,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            transaction_id: row.transaction_id,
            user_id: row.user_id,
            username: row.username,
            book_id: row.book_id,
            book_name: row.book_name,
            transaction_date: row.transaction_date,
            reserved: row.reserved,
            kind: row.reserved.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    pub user_id: Option<String>,
    pub book_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
