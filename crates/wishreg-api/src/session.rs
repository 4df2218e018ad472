//! Bearer-token session extractor.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use wishreg_core::{auth, identity::Identity};

use crate::{AppState, Backend, error::ApiError};

/// The authenticated caller. Present in a handler means the bearer token
/// resolved to a live session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub token:    String,
  pub identity: Identity,
}

/// The token from `Authorization: Bearer <token>`, if well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.trim().split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

impl<S, B> FromRequestParts<AppState<S, B>> for CurrentUser
where
  S: Backend,
  B: Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, B>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let identity = auth::current_identity(state.store.as_ref(), token.clone()).await?;
    Ok(CurrentUser { token, identity })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn parses_bearer() {
    assert_eq!(bearer_token(&headers("Bearer abc123")).as_deref(), Some("abc123"));
    assert_eq!(bearer_token(&headers("bearer  abc123 ")).as_deref(), Some("abc123"));
  }

  #[test]
  fn rejects_other_schemes() {
    assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
    assert_eq!(bearer_token(&headers("Bearer")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }
}
