use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use todos_core::validation::validate_credentials;
use tracing::{info, warn};

use crate::api::error::AppError;
use crate::db::users::{NewUser, UserRepository, UserView};

use super::tokens::TokenService;

const INVALID_CREDENTIALS: &str = "invalid email or password";
const DUMMY_PASSWORD: &str = "no account uses this password";

/// Account signup and password login.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    tokens: TokenService,
    bcrypt_cost: u32,
    /// Verified against for unknown e-mails, so both failures cost one bcrypt run.
    dummy_hash: Arc<OnceCell<String>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalServerError(format!("failed to hash password: {e}")))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::InternalServerError(format!("failed to verify password: {e}")))
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            repo,
            tokens,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<UserView, AppError> {
        let email = normalize_email(email);
        validate_credentials(&email, password).map_err(AppError::ValidationFailed)?;

        let password_hash = hash_password(password.to_string(), self.bcrypt_cost).await?;
        let user = self
            .repo
            .create(NewUser {
                email,
                password_hash,
                created_at: Utc::now(),
            })
            .await?;

        info!("Registered user {}", user.uuid);
        Ok(UserView::from(&user))
    }

    /// Returns a session token for valid credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_email(email);
        let Some(user) = self.repo.find_by_email(&email).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_password(DUMMY_PASSWORD.to_string(), self.bcrypt_cost))
                .await?;
            verify_password(password.to_string(), dummy.clone()).await?;
            warn!("Login attempt for unknown account");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            warn!("Failed login for user {}", user.uuid);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(self.tokens.issue(user.id)?)
    }
}
