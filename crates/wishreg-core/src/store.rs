//! The ports the managers talk to: the data store, blob storage and the
//! identity provider.
//!
//! Backends (e.g. `wishreg-store-sqlite`) implement these traits. Managers and
//! the HTTP layer depend on the abstraction, never on a concrete backend.

use std::future::Future;

use bytes::Bytes;
use uuid::Uuid;

use crate::{
  gift::{Gift, GiftPatch},
  graph::{FollowEdge, Group, InviteCode, Membership, Profile},
  identity::{Credentials, Identity, IdentityPatch, Session},
};

// ─── Failure classification ──────────────────────────────────────────────────

/// What a backend failure means to the managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  /// A uniqueness constraint rejected an insert (row already exists).
  UniqueViolation,
  /// A referenced row does not exist.
  ForeignKeyViolation,
  /// Unknown email or wrong password.
  InvalidCredentials,
  Other,
}

/// Implemented by backend error types so managers can branch on the meaning
/// of a failure without inspecting backend-specific codes.
pub trait StoreFailure: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> FailureKind;
}

// ─── Data store ──────────────────────────────────────────────────────────────

/// Typed access to profiles, follow edges, groups and gifts.
///
/// The store owns no application state beyond the rows themselves. Every
/// method is a suspension point and returns a `Send` future so the trait can
/// back a multi-threaded axum server.
pub trait RegistryStore: Send + Sync {
  type Error: StoreFailure;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Insert or replace the profile with `profile.id`.
  fn upsert_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Profiles for `ids`; unknown ids are skipped.
  fn list_profiles(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Case-insensitive substring match on full name or username.
  fn search_profiles(
    &self,
    term: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  // ── Follows ───────────────────────────────────────────────────────────

  /// Insert one directed edge. A duplicate is a
  /// [`FailureKind::UniqueViolation`]; an unknown endpoint is a
  /// [`FailureKind::ForeignKeyViolation`].
  fn insert_follow(
    &self,
    edge: FollowEdge,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns the number of rows removed.
  fn delete_follow(
    &self,
    edge: FollowEdge,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Outbound edges from `follower_id`.
  fn list_following(
    &self,
    follower_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FollowEdge>, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Insert a group. A code collision is a [`FailureKind::UniqueViolation`].
  fn insert_group(
    &self,
    group: Group,
  ) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  /// Look up a group by its (already normalised) invite code.
  fn find_group_by_code(
    &self,
    code: InviteCode,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  fn insert_membership(
    &self,
    membership: Membership,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_groups_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Group>, Self::Error>> + Send + '_;

  /// Every membership row for any of `group_ids`.
  fn list_memberships(
    &self,
    group_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Membership>, Self::Error>> + Send + '_;

  // ── Gifts ─────────────────────────────────────────────────────────────

  /// Every gift row. Filtering by owner happens in the catalog manager.
  fn list_gifts(&self) -> impl Future<Output = Result<Vec<Gift>, Self::Error>> + Send + '_;

  fn get_gift(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Gift>, Self::Error>> + Send + '_;

  fn insert_gift(
    &self,
    gift: Gift,
  ) -> impl Future<Output = Result<Gift, Self::Error>> + Send + '_;

  /// Overwrite the owner-editable fields. Returns the number of rows touched.
  fn update_gift(
    &self,
    id: Uuid,
    patch: GiftPatch,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Conditional write: set `reserved_by = new` only where the stored value
  /// currently equals `expected` (`None` matching a free gift).
  ///
  /// Returns the number of rows touched; zero means the precondition failed.
  /// Implementations must perform the comparison and the write atomically.
  fn set_reserved_by(
    &self,
    id: Uuid,
    expected: Option<Uuid>,
    new: Option<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn delete_gift(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Blob storage ────────────────────────────────────────────────────────────

/// Object storage for uploaded images.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` under the relative object `path`, replacing any existing
  /// object.
  fn put(
    &self,
    path: String,
    bytes: Bytes,
    media_type: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The URL at which `path` is publicly readable.
  fn public_url(&self, path: &str) -> String;
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Sign-up, sign-in and session resolution.
pub trait IdentityProvider: Send + Sync {
  type Error: StoreFailure;

  /// Register a new identity. Also creates the identity's profile row.
  fn sign_up(
    &self,
    credentials: Credentials,
    full_name: Option<String>,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  fn sign_in(
    &self,
    credentials: Credentials,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Invalidate `token`. Unknown tokens are ignored.
  fn sign_out(
    &self,
    token: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a session token to its identity.
  fn current_session(
    &self,
    token: String,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  fn update_identity(
    &self,
    id: Uuid,
    patch: IdentityPatch,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;
}
