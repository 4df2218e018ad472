//! Handlers for `/me`: the caller's own profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Merged identity + profile |
//! | `PUT`  | `/me` | Body: profile form; returns the save report |

use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::Deserialize;
use wishreg_core::{
  profiles::{self, ProfileDraft, ProfileSaved, ProfileView},
  store::BlobStore,
};

use crate::{
  AppState, Backend,
  error::ApiError,
  session::CurrentUser,
  upload::{UploadBody, image_source},
};

/// `GET /me`
pub async fn load<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
) -> Result<Json<ProfileView>, ApiError> {
  let store = app.store.as_ref();
  let view = profiles::load(store, store, user.identity.id).await?;
  Ok(Json(view))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileBody {
  pub full_name:  String,
  pub username:   Option<String>,
  pub birthday:   Option<NaiveDate>,
  pub group_code: Option<String>,
  pub avatar_url: Option<String>,
  pub avatar:     Option<UploadBody>,
}

/// `PUT /me`
pub async fn save<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Json(body): Json<ProfileBody>,
) -> Result<Json<ProfileSaved>, ApiError> {
  let draft = ProfileDraft {
    full_name:  body.full_name,
    username:   body.username,
    avatar:     image_source(body.avatar, body.avatar_url)?,
    birthday:   body.birthday,
    group_code: body.group_code,
  };
  let store = app.store.as_ref();
  let saved = profiles::save(store, app.blobs.as_ref(), store, user.identity.id, draft).await?;
  Ok(Json(saved))
}
