//! Error types for `wishreg-core`.

use thiserror::Error;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("gift not found: {0}")]
  GiftNotFound(Uuid),

  #[error("no group uses invite code {0:?}")]
  GroupNotFound(String),

  #[error("profile not found: {0}")]
  ProfileNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("gift {0} belongs to someone else")]
  NotGiftOwner(Uuid),

  #[error("gift {0} is not reserved by you")]
  NotReserver(Uuid),

  #[error("the wishlist of {0} is not visible to you")]
  ListHidden(Uuid),

  #[error("cannot follow yourself")]
  SelfFollow,

  #[error("cannot reserve your own gift {0}")]
  OwnGiftReservation(Uuid),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("an account already exists for that email")]
  EmailTaken,

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("identity update failed: {0}")]
  IdentityUpdate(#[source] BoxError),

  #[error("profile update failed: {0}")]
  ProfileUpdate(#[source] BoxError),

  #[error("upstream failure: {0}")]
  Upstream(#[source] BoxError),
}

/// The coarse classification callers branch on.
///
/// Benign uniqueness conflicts never reach this level; lost reservation races
/// are reported as [`ReservationOutcome::RaceLost`] rather than as an error.
///
/// [`ReservationOutcome::RaceLost`]: crate::reservation::ReservationOutcome::RaceLost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Forbidden,
  InvalidOperation,
  Unauthorized,
  Upstream,
}

impl Error {
  pub fn upstream<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Upstream(Box::new(err))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::GiftNotFound(_)
      | Self::GroupNotFound(_)
      | Self::ProfileNotFound(_)
      | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::NotGiftOwner(_) | Self::NotReserver(_) | Self::ListHidden(_) => {
        ErrorKind::Forbidden
      }
      Self::SelfFollow
      | Self::OwnGiftReservation(_)
      | Self::InvalidInput(_)
      | Self::EmailTaken => ErrorKind::InvalidOperation,
      Self::InvalidCredentials => ErrorKind::Unauthorized,
      Self::IdentityUpdate(_) | Self::ProfileUpdate(_) | Self::Upstream(_) => {
        ErrorKind::Upstream
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
