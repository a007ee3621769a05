// zahroshop/src/services/auth_service.rs

//! Bearer-token resolution. Tokens are issued elsewhere; only their SHA-256
//! digests are stored.

use crate::errors::AppError;
use crate::models::User;
use crate::repo::IdentityRepository;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

/// Hex-encoded SHA-256 digest of a raw API token.
pub fn hash_token(raw_token: &str) -> String {
  hex::encode(Sha256::digest(raw_token.as_bytes()))
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header_value: &str) -> Option<&str> {
  let (scheme, token) = header_value.trim().split_once(' ')?;
  let token = token.trim();
  if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
    Some(token)
  } else {
    None
  }
}

#[instrument(name = "auth_service::resolve_token", skip_all, err(Display))]
pub async fn resolve_token(identities: &dyn IdentityRepository, raw_token: &str) -> Result<User, AppError> {
  match identities.find_by_token_hash(&hash_token(raw_token)).await? {
    Some(user) => {
      debug!(user_id = %user.id, "Bearer token resolved.");
      Ok(user)
    }
    None => {
      warn!("Unknown bearer token presented.");
      Err(AppError::Auth("Invalid or expired token.".to_string()))
    }
  }
}
