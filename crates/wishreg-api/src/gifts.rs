//! Handlers for wishlists, gifts and reservations.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/currencies` | Supported codes and symbols |
//! | `GET`    | `/lists/:owner/gifts` | Optional `?q=`; 403 unless the owner is visible |
//! | `POST`   | `/gifts` | Body: gift form; 201 |
//! | `GET`    | `/gifts/:id` | The gift as the caller sees it |
//! | `PUT`    | `/gifts/:id` | Owner only |
//! | `DELETE` | `/gifts/:id` | Owner only; 204 |
//! | `POST`   | `/gifts/:id/reservation` | `{"outcome":"reserved"}`, or 409 on a lost race |
//! | `DELETE` | `/gifts/:id/reservation` | `{"outcome":"released"}` |
//! | `POST`   | `/gifts/:id/reservation/toggle` | Either of the above |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::IntoEnumIterator as _;
use uuid::Uuid;
use wishreg_core::{
  catalog::{self, GiftDraft, ListFilter},
  gift::{Currency, Gift},
  reservation::{self, GiftCard, ReservationOutcome},
  store::BlobStore,
};

use crate::{
  AppState, Backend,
  error::ApiError,
  session::CurrentUser,
  upload::{UploadBody, image_source},
};

// ─── Currencies ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CurrencyInfo {
  pub code:   Currency,
  pub symbol: &'static str,
}

/// `GET /currencies`
pub async fn currencies() -> Json<Vec<CurrencyInfo>> {
  Json(
    Currency::iter()
      .map(|code| CurrencyInfo { code, symbol: code.symbol() })
      .collect(),
  )
}

// ─── Lists ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub q: Option<String>,
}

/// `GET /lists/:owner/gifts[?q=<text>]`
pub async fn wishlist<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(owner): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<GiftCard>>, ApiError> {
  let filter = ListFilter { text: params.q };
  let cards = catalog::wishlist(app.store.as_ref(), user.identity.id, owner, &filter).await?;
  Ok(Json(cards))
}

// ─── CRUD ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GiftBody {
  pub name:        String,
  pub price:       String,
  pub currency:    Currency,
  pub description: String,
  pub image_url:   Option<String>,
  pub image:       Option<UploadBody>,
}

impl GiftBody {
  fn into_draft(self) -> Result<GiftDraft, ApiError> {
    Ok(GiftDraft {
      name:        self.name,
      price:       self.price,
      currency:    self.currency,
      description: self.description,
      image:       image_source(self.image, self.image_url)?,
    })
  }
}

/// `POST /gifts`
pub async fn create<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Json(body): Json<GiftBody>,
) -> Result<impl IntoResponse, ApiError> {
  let draft = body.into_draft()?;
  let gift =
    catalog::create(app.store.as_ref(), app.blobs.as_ref(), user.identity.id, draft).await?;
  Ok((StatusCode::CREATED, Json(gift)))
}

/// `GET /gifts/:id`
pub async fn get_one<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<GiftCard>, ApiError> {
  Ok(Json(catalog::card(app.store.as_ref(), user.identity.id, id).await?))
}

/// `PUT /gifts/:id`
pub async fn update<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<GiftBody>,
) -> Result<Json<Gift>, ApiError> {
  let draft = body.into_draft()?;
  let gift =
    catalog::update(app.store.as_ref(), app.blobs.as_ref(), user.identity.id, id, draft).await?;
  Ok(Json(gift))
}

/// `DELETE /gifts/:id`
pub async fn delete<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  catalog::delete(app.store.as_ref(), user.identity.id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reservations ────────────────────────────────────────────────────────────

/// A reservation outcome as an HTTP response. A lost race is `409 Conflict`.
pub struct OutcomeResponse(pub ReservationOutcome);

impl IntoResponse for OutcomeResponse {
  fn into_response(self) -> Response {
    let status = match self.0 {
      ReservationOutcome::RaceLost => StatusCode::CONFLICT,
      ReservationOutcome::Reserved | ReservationOutcome::Released => StatusCode::OK,
    };
    (status, Json(json!({ "outcome": self.0 }))).into_response()
  }
}

/// `POST /gifts/:id/reservation`
pub async fn reserve<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<OutcomeResponse, ApiError> {
  let outcome = reservation::reserve(app.store.as_ref(), id, user.identity.id).await?;
  Ok(OutcomeResponse(outcome))
}

/// `DELETE /gifts/:id/reservation`
pub async fn release<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<OutcomeResponse, ApiError> {
  let outcome = reservation::release(app.store.as_ref(), id, user.identity.id).await?;
  Ok(OutcomeResponse(outcome))
}

/// `POST /gifts/:id/reservation/toggle`
pub async fn toggle<S: Backend, B: BlobStore + 'static>(
  State(app): State<AppState<S, B>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<OutcomeResponse, ApiError> {
  let outcome = reservation::toggle(app.store.as_ref(), id, user.identity.id).await?;
  Ok(OutcomeResponse(outcome))
}
