//! Account service: registration, sign-in, and token lifecycle.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use feedboard_common::{AppError, AppResult, IdGenerator};
use feedboard_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Account service for registration and authentication.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// A successful sign-in: the user row plus the bearer token to hand out.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: user::Model,
    pub token: String,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;
        validate_password_strength(&input.password)?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest(
                "Email already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let model = user::ActiveModel {
            id: Set(user_id),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            token: Set(Some(token)),
            ..Default::default()
        };

        let created = self.user_repo.create(model).await?;

        tracing::info!(user_id = %created.id, "registered new account");

        Ok(created)
    }

    /// Sign in with a username or email plus password.
    ///
    /// All failure modes collapse into `Unauthorized` so callers cannot
    /// probe which accounts exist.
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<LoginOutcome> {
        let user = self
            .user_repo
            .find_by_username_or_email(identifier)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        // The token column is nullable; issue one if it was ever cleared.
        if let Some(token) = user.token.clone() {
            return Ok(LoginOutcome { user, token });
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        let user = self.user_repo.update(active).await?;

        Ok(LoginOutcome { user, token })
    }

    /// Authenticate a user by bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Rotate a user's token, invalidating every session holding the old one.
    pub async fn regenerate_token(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let new_token = self.id_gen.generate_token();

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(new_token.clone()));

        self.user_repo.update(active).await?;

        Ok(new_token)
    }
}

/// Check the character-class rules the length validator cannot express.
fn validate_password_strength(password: &str) -> AppResult<()> {
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::Validation(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Password must contain at least one number".to_string(),
        ));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
