//! Error type for `wishreg-store-sqlite`.

use rusqlite::ffi;
use thiserror::Error;
use wishreg_core::store::{FailureKind, StoreFailure};

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown currency code: {0:?}")]
  UnknownCurrency(String),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("invalid blob path: {0:?}")]
  InvalidBlobPath(String),

  #[error("blob i/o error: {0}")]
  Io(#[from] std::io::Error),
}

impl StoreFailure for Error {
  fn kind(&self) -> FailureKind {
    match self {
      Self::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))) => {
        match e.extended_code {
          ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            FailureKind::UniqueViolation
          }
          ffi::SQLITE_CONSTRAINT_FOREIGNKEY => FailureKind::ForeignKeyViolation,
          _ => FailureKind::Other,
        }
      }
      Self::InvalidCredentials => FailureKind::InvalidCredentials,
      _ => FailureKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
