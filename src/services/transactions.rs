//! Transaction history service

use crate::{
    error::AppResult,
    models::{
        transaction::{Transaction, TransactionQuery},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct TransactionsService {
    repository: Repository,
}

impl TransactionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Admins see every entry, other users only their own
    pub async fn list(
        &self,
        claims: &UserClaims,
        query: TransactionQuery,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Transaction>, i64)> {
        let user_id = claims.scope_user_id(query.user_id);
        self.repository
            .transactions
            .search(user_id.as_deref(), query.book_id, limit, offset)
            .await
    }

    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<Transaction> {
        let transaction = self.repository.transactions.get_by_id(id).await?;
        claims.require_owner_or_admin(&transaction.user_id)?;
        Ok(transaction)
    }
}
