//! SQLite backend for the wishreg gift registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] implements both the
//! data port and the identity port; [`FsBlobStore`] keeps uploads on disk.

mod encode;
mod identity;
mod schema;
mod store;

pub mod blob;
pub mod error;

pub use blob::FsBlobStore;
pub use error::{Error, Result};
pub use store::SqliteStore;
