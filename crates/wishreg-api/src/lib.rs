//! JSON REST API for wishreg.
//!
//! Exposes an axum [`Router`] over any backend implementing the core data and
//! identity ports, plus a [`BlobStore`] for uploads. TLS and static file
//! serving are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", wishreg_api::api_router(store.clone(), blobs.clone()))
//! ```

pub mod auth;
pub mod error;
pub mod gifts;
pub mod groups;
pub mod me;
pub mod people;
pub mod session;
pub mod upload;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use wishreg_core::store::{BlobStore, IdentityProvider, RegistryStore};

pub use error::ApiError;
pub use session::CurrentUser;

/// Everything a handler needs: the data/identity backend and blob storage.
pub trait Backend: RegistryStore + IdentityProvider + 'static {}

impl<T> Backend for T where T: RegistryStore + IdentityProvider + 'static {}

/// Shared router state.
pub struct AppState<S, B> {
  pub store: Arc<S>,
  pub blobs: Arc<B>,
}

impl<S, B> Clone for AppState<S, B> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), blobs: Arc::clone(&self.blobs) }
  }
}

/// Build the API router for `store` and `blobs`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, B>(store: Arc<S>, blobs: Arc<B>) -> Router<()>
where
  S: Backend,
  B: BlobStore + 'static,
{
  Router::new()
    // Auth
    .route("/auth/signup", post(auth::sign_up::<S, B>))
    .route("/auth/signin", post(auth::sign_in::<S, B>))
    .route("/auth/signout", post(auth::sign_out::<S, B>))
    // Profile
    .route("/me", get(me::load::<S, B>).put(me::save::<S, B>))
    // People
    .route("/people", get(people::search::<S, B>))
    .route("/people/visible", get(people::visible::<S, B>))
    .route("/circle", get(people::circle::<S, B>))
    .route(
      "/people/{id}/follow",
      post(people::follow::<S, B>).delete(people::unfollow::<S, B>),
    )
    // Groups
    .route("/groups", get(groups::sidebar::<S, B>).post(groups::create::<S, B>))
    .route("/groups/join", post(groups::join::<S, B>))
    // Gifts
    .route("/currencies", get(gifts::currencies))
    .route("/lists/{owner}/gifts", get(gifts::wishlist::<S, B>))
    .route("/gifts", post(gifts::create::<S, B>))
    .route(
      "/gifts/{id}",
      get(gifts::get_one::<S, B>)
        .put(gifts::update::<S, B>)
        .delete(gifts::delete::<S, B>),
    )
    .route(
      "/gifts/{id}/reservation",
      post(gifts::reserve::<S, B>).delete(gifts::release::<S, B>),
    )
    .route("/gifts/{id}/reservation/toggle", post(gifts::toggle::<S, B>))
    .with_state(AppState { store, blobs })
}
