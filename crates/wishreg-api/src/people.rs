//! Handlers for people search and the follow graph.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/people?q=<term>` | At most 5 results; terms under 2 chars return `[]` |
//! | `GET`    | `/people/visible` | Circle plus group co-members |
//! | `GET`    | `/circle` | People the caller follows |
//! | `POST`   | `/people/:id/follow` | Mutual follow; 204 |
//! | `DELETE` | `/people/:id/follow` | Removes both edges; 204 |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;
use wishreg_core::{graph::Person, social, store::BlobStore};

use crate::{AppState, Backend, error::ApiError, session::CurrentUser};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /people?q=<term>`
pub async fn search<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  _user: CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Person>>, ApiError> {
  Ok(Json(social::search(app.store.as_ref(), &params.q).await?))
}

/// `GET /people/visible`
pub async fn visible<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
) -> Result<Json<Vec<Person>>, ApiError> {
  Ok(Json(social::visible_people(app.store.as_ref(), user.identity.id).await?))
}

/// `GET /circle`
pub async fn circle<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
) -> Result<Json<Vec<Person>>, ApiError> {
  Ok(Json(social::circle(app.store.as_ref(), user.identity.id).await?))
}

/// `POST /people/:id/follow`
pub async fn follow<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(target): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  social::follow(app.store.as_ref(), user.identity.id, target).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /people/:id/follow`
pub async fn unfollow<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(target): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  social::unfollow(app.store.as_ref(), user.identity.id, target).await?;
  Ok(StatusCode::NO_CONTENT)
}
