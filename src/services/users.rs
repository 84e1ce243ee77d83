//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{generate_user_id, CreateUser, UpdateProfile, UpdateUser, User, UserClaims, UserQuery, UserShort},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    /// Authenticate user by username and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::warn!("Failed login for user {}", user.user_id);
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = UserClaims::for_user(&user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!("User {} logged in", user.user_id);
        Ok((token, user))
    }

    /// Register a regular (non-admin) account
    pub async fn signup(&self, mut user: CreateUser) -> AppResult<User> {
        user.is_admin = Some(false);
        self.create_user(user).await
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users
    pub async fn search_users(&self, query: &UserQuery, limit: i64, offset: i64) -> AppResult<(Vec<UserShort>, i64)> {
        self.repository.users.search(query, limit, offset).await
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        self.ensure_unique(Some(&user.username), Some(&user.email), None).await?;

        let password_hash = self.hash_password(&user.password)?;
        let user_id = generate_user_id();

        let created = self
            .repository
            .users
            .create(
                &user_id,
                user.username.trim(),
                user.email.trim(),
                &password_hash,
                user.full_name.as_deref(),
                user.is_admin.unwrap_or(false),
            )
            .await?;

        tracing::info!("Created user {} ({})", created.username, created.user_id);
        Ok(created)
    }

    /// Update an existing user
    pub async fn update_user(&self, id: &str, user: UpdateUser) -> AppResult<User> {
        if user.is_empty() {
            return Err(AppError::BadRequest("No valid fields to update".to_string()));
        }

        self.repository.users.get_by_id(id).await?;
        self.ensure_unique(user.username.as_deref(), user.email.as_deref(), Some(id))
            .await?;

        let password_hash = match user.password {
            Some(ref password) => Some(self.hash_password(password)?),
            None => None,
        };

        self.repository.users.update(id, &user, password_hash).await
    }

    /// Update user's own profile
    pub async fn update_profile(&self, user_id: &str, profile: UpdateProfile) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;

        self.ensure_unique(profile.username.as_deref(), profile.email.as_deref(), Some(user_id))
            .await?;

        // Changing the password requires the current one
        let password_hash = match profile.new_password {
            Some(ref new_password) => {
                let current_password = profile.current_password.as_ref().ok_or_else(|| {
                    AppError::Validation("Current password required to change password".to_string())
                })?;
                if !self.verify_password(&user, current_password)? {
                    return Err(AppError::Authentication("Current password is incorrect".to_string()));
                }
                Some(self.hash_password(new_password)?)
            }
            None => None,
        };

        let update = UpdateUser {
            username: profile.username,
            email: profile.email,
            password: None,
            full_name: profile.full_name,
            is_admin: None,
        };

        if update.is_empty() && password_hash.is_none() {
            return Ok(user);
        }

        self.repository.users.update(user_id, &update, password_hash).await
    }

    async fn ensure_unique(&self, username: Option<&str>, email: Option<&str>, exclude_id: Option<&str>) -> AppResult<()> {
        if let Some(username) = username {
            if self.repository.users.username_exists(username.trim(), exclude_id).await? {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }
        if let Some(email) = email {
            if self.repository.users.email_exists(email.trim(), exclude_id).await? {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
        Ok(())
    }
}
