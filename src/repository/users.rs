//! Users repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::user::{UpdateUser, User, UserQuery, UserShort},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (login)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str, exclude_id: Option<&str>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(username) = LOWER($1) AND ($2::VARCHAR IS NULL OR user_id != $2)
            )
            "#,
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<&str>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1) AND ($2::VARCHAR IS NULL OR user_id != $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery, limit: i64, offset: i64) -> AppResult<(Vec<UserShort>, i64)> {
        let pattern = crate::models::book::search_term(&query.username);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE TRUE");
        push_user_filter(&mut count, &pattern);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            r#"
            SELECT u.user_id, u.username, u.email, u.full_name, u.is_admin,
                   (SELECT COUNT(*) FROM bookings b
                    WHERE b.user_id = u.user_id AND b.currently_booked) AS active_bookings
            FROM users u
            WHERE TRUE
            "#,
        );
        push_user_filter(&mut select, &pattern);
        select
            .push(" ORDER BY u.username LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = select
            .build_query_as::<UserShort>()
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total))
    }

    /// Insert a new user
    pub async fn create(
        &self,
        user_id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
        is_admin: bool,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, username, email, password_hash, full_name, is_admin)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update the given fields; `password_hash` replaces the stored hash when set
    pub async fn update(&self, id: &str, update: &UpdateUser, password_hash: Option<String>) -> AppResult<User> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut fields = builder.separated(", ");
        let mut has_fields = false;

        if let Some(ref username) = update.username {
            fields.push("username = ").push_bind_unseparated(username.clone());
            has_fields = true;
        }
        if let Some(ref email) = update.email {
            fields.push("email = ").push_bind_unseparated(email.clone());
            has_fields = true;
        }
        if let Some(ref full_name) = update.full_name {
            fields.push("full_name = ").push_bind_unseparated(full_name.clone());
            has_fields = true;
        }
        if let Some(is_admin) = update.is_admin {
            fields.push("is_admin = ").push_bind_unseparated(is_admin);
            has_fields = true;
        }
        if let Some(hash) = password_hash {
            fields.push("password_hash = ").push_bind_unseparated(hash);
            has_fields = true;
        }

        if !has_fields {
            return Err(AppError::BadRequest("No valid fields to update".to_string()));
        }

        builder
            .push(" WHERE user_id = ")
            .push_bind(id.to_string())
            .push(" RETURNING *");

        builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }
}

fn push_user_filter(builder: &mut QueryBuilder<'_, Postgres>, pattern: &Option<String>) {
    if let Some(pattern) = pattern {
        builder
            .push(" AND (LOWER(u.username) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(u.email) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(COALESCE(u.full_name, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\')");
    }
}
