//! Sign-up, sign-in and session resolution over an [`IdentityProvider`].

use crate::{
  Error, Result,
  identity::{Credentials, Identity, Session},
  store::{FailureKind, IdentityProvider, StoreFailure},
};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

fn classify<E: StoreFailure>(err: E) -> Error {
  match err.kind() {
    FailureKind::UniqueViolation => Error::EmailTaken,
    FailureKind::InvalidCredentials => Error::InvalidCredentials,
    FailureKind::ForeignKeyViolation | FailureKind::Other => Error::upstream(err),
  }
}

pub async fn sign_up<I: IdentityProvider>(
  identity: &I,
  credentials: Credentials,
  full_name: Option<String>,
) -> Result<Identity> {
  let email = credentials.normalized_email();
  if !email.contains('@') {
    return Err(Error::InvalidInput(format!("{email:?} is not an email address")));
  }
  if credentials.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::InvalidInput(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  let full_name = full_name
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty());

  let created = identity
    .sign_up(Credentials { email, password: credentials.password }, full_name)
    .await
    .map_err(classify)?;
  tracing::info!(user = %created.id, "signed up");
  Ok(created)
}

pub async fn sign_in<I: IdentityProvider>(
  identity: &I,
  credentials: Credentials,
) -> Result<Session> {
  let credentials = Credentials {
    email:    credentials.normalized_email(),
    password: credentials.password,
  };
  identity.sign_in(credentials).await.map_err(classify)
}

pub async fn sign_out<I: IdentityProvider>(identity: &I, token: String) -> Result<()> {
  identity.sign_out(token).await.map_err(classify)
}

/// Resolve a bearer token; unknown or expired tokens are
/// [`Error::InvalidCredentials`].
pub async fn current_identity<I: IdentityProvider>(
  identity: &I,
  token: String,
) -> Result<Identity> {
  identity
    .current_session(token)
    .await
    .map_err(classify)?
    .ok_or(Error::InvalidCredentials)
}
