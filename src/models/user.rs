//! User model and related types

use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

/// Length of the generated user identifier (matches `users.user_id VARCHAR(10)`)
pub const USER_ID_LEN: usize = 10;

/// Generate a new user identifier: `U` followed by 9 uppercase alphanumerics
pub fn generate_user_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(USER_ID_LEN - 1)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();
    format!("U{}", suffix)
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_admin: bool,
}

/// Short user representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_admin: bool,
    /// Number of books currently held (booked or awaiting return approval)
    pub active_bookings: i64,
}

/// User query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Case-insensitive substring of username, email or full name
    pub username: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 30, message = "Username must be 3 to 30 characters"))]
    pub username: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: Option<String>,
    pub is_admin: Option<bool>,
}

/// Update user request (admin)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 30, message = "Username must be 3 to 30 characters"))]
    pub username: Option<String>,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: Option<String>,
    pub is_admin: Option<bool>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.full_name.is_none()
            && self.is_admin.is_none()
    }
}

/// Update own profile request (for authenticated users)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    /// Display name
    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: Option<String>,
    /// Email address (must be unique)
    #[validate(
        email(message = "Invalid email format"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    pub email: Option<String>,
    /// Username (must be unique)
    #[validate(length(min = 3, max = 30, message = "Username must be 3 to 30 characters"))]
    pub username: Option<String>,
    /// Current password (required to change password)
    pub current_password: Option<String>,
    /// New password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn for_user(user: &User, expiration_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.user_id.clone(),
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
            exp: now + (expiration_hours as i64 * 3600),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Allow access to resources owned by `owner_id` (admins can access everything)
    pub fn require_owner_or_admin(&self, owner_id: &str) -> Result<(), AppError> {
        if self.is_admin || self.user_id == owner_id {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You can only access your own records".to_string(),
            ))
        }
    }

    /// Resolve the user a request acts for: non-admins are always pinned to themselves
    pub fn scope_user_id(&self, requested: Option<String>) -> Option<String> {
        if self.is_admin {
            requested
        } else {
            Some(self.user_id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(is_admin: bool) -> UserClaims {
        UserClaims {
            sub: "UABCDEFGH1".into(),
            user_id: "UABCDEFGH1".into(),
            username: "reader".into(),
            is_admin,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        }
    }

    #[test]
    fn test_generate_user_id() {
        let id = generate_user_id();
        assert_eq!(id.len(), USER_ID_LEN);
        assert!(id.starts_with('U'));
        assert!(id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_token_roundtrip() {
        let token = claims(true).create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, "UABCDEFGH1");
        assert!(parsed.is_admin);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut expired = claims(false);
        expired.exp = Utc::now().timestamp() - 3600;
        let token = expired.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn test_scope_user_id() {
        assert_eq!(claims(false).scope_user_id(Some("UOTHER0000".into())), Some("UABCDEFGH1".into()));
        assert_eq!(claims(true).scope_user_id(Some("UOTHER0000".into())), Some("UOTHER0000".into()));
        assert_eq!(claims(true).scope_user_id(None), None);
    }

    #[test]
    fn test_owner_or_admin() {
        assert!(claims(false).require_owner_or_admin("UABCDEFGH1").is_ok());
        assert!(claims(false).require_owner_or_admin("UOTHER0000").is_err());
        assert!(claims(true).require_owner_or_admin("UOTHER0000").is_ok());
        assert!(claims(false).require_admin().is_err());
    }

    #[test]
    fn test_updates_reject_oversized_fields() {
        let long_email = format!("{}@example.com", "a".repeat(60));

        let update = UpdateUser {
            email: Some(long_email.clone()),
            ..UpdateUser::default()
        };
        assert!(update.validate().is_err());

        let update = UpdateUser {
            full_name: Some("x".repeat(101)),
            ..UpdateUser::default()
        };
        assert!(update.validate().is_err());

        let profile = UpdateProfile {
            full_name: Some("x".repeat(101)),
            email: Some(long_email),
            username: None,
            current_password: None,
            new_password: None,
        };
        let errors = profile.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("full_name"));

        let ok = UpdateUser {
            email: Some("reader@example.com".into()),
            ..UpdateUser::default()
        };
        assert!(ok.validate().is_ok());
    }
}
