//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | Body: `{"email","password","full_name"?}`; 201 |
//! | `POST` | `/auth/signin` | Body: `{"email","password"}`; returns `{token, identity}` |
//! | `POST` | `/auth/signout` | Bearer; 204 |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use wishreg_core::{
  auth,
  identity::{Credentials, Session},
  store::BlobStore,
};

use crate::{AppState, Backend, error::ApiError, session::CurrentUser};

#[derive(Debug, Deserialize)]
pub struct SignUpBody {
  pub email:     String,
  pub password:  String,
  #[serde(default)]
  pub full_name: Option<String>,
}

/// `POST /auth/signup`
pub async fn sign_up<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  Json(body): Json<SignUpBody>,
) -> Result<impl IntoResponse, ApiError> {
  let credentials = Credentials { email: body.email, password: body.password };
  let identity = auth::sign_up(app.store.as_ref(), credentials, body.full_name).await?;
  Ok((StatusCode::CREATED, Json(identity)))
}

/// `POST /auth/signin`
pub async fn sign_in<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  Json(credentials): Json<Credentials>,
) -> Result<Json<Session>, ApiError> {
  let session = auth::sign_in(app.store.as_ref(), credentials).await?;
  Ok(Json(session))
}

/// `POST /auth/signout`
pub async fn sign_out<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
) -> Result<StatusCode, ApiError> {
  auth::sign_out(app.store.as_ref(), user.token).await?;
  Ok(StatusCode::NO_CONTENT)
}
