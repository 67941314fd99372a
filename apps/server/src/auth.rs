//! Bearer-token authentication for the protected routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;
use crate::main_lib::AppState;

#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: Option<String>,
    pub exp: usize,
}

/// Validates HS256 bearer tokens.
pub struct AuthManager {
    key: DecodingKey,
    validation: Validation,
}

impl AuthManager {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                ApiError::Unauthorized
            })
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid bearer token.
///
/// Without a configured secret every request is rejected.
pub async fn require_jwt(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = state.auth.as_ref().ok_or(ApiError::Unauthorized)?;
    let token = bearer_token(&request).ok_or(ApiError::Unauthorized)?;
    auth.verify(token)?;
    Ok(next.run(request).await)
}
