use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims carried by access tokens and password reset tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Email address of the user
    pub sub: String,
    /// Tenant the token was minted for
    pub tenant: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(email_address: &str, tenant: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: email_address.to_string(),
            tenant: tenant.to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(jsonwebtoken::errors::Error),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(jsonwebtoken::errors::Error),

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed: {0}")]
    HashingTask(#[from] tokio::task::JoinError),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(AuthError::TokenGeneration)
}

/// Validate signature and expiry, returning the claims
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data =
        decode::<Claims>(token, &decoding_key, &Validation::default()).map_err(AuthError::InvalidToken)?;

    Ok(token_data.claims)
}

/// bcrypt is deliberately slow; keep it off the async worker threads.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(valid)
}
