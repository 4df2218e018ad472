//! Handlers for `/groups` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/groups` | Caller's groups with members (caller excluded) |
//! | `POST` | `/groups` | Body: `{"name":"Family"}`; 201 with the invite code |
//! | `POST` | `/groups/join` | Body: `{"code":"x7k2qp"}`; case/whitespace-insensitive |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use wishreg_core::{
  graph::{Group, GroupRoster},
  groups,
  store::BlobStore,
};

use crate::{AppState, Backend, error::ApiError, session::CurrentUser};

/// `GET /groups`
pub async fn sidebar<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
) -> Result<Json<Vec<GroupRoster>>, ApiError> {
  Ok(Json(groups::sidebar(app.store.as_ref(), user.identity.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /groups`
pub async fn create<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let group = groups::create_group(app.store.as_ref(), &body.name, user.identity.id).await?;
  Ok((StatusCode::CREATED, Json(group)))
}

#[derive(Debug, Deserialize)]
pub struct JoinBody {
  pub code: String,
}

/// `POST /groups/join`
pub async fn join<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Json(body): Json<JoinBody>,
) -> Result<Json<Group>, ApiError> {
  Ok(Json(groups::join_group(app.store.as_ref(), &body.code, user.identity.id).await?))
}
