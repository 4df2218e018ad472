//! Core types, port traits and managers for the wishreg gift registry.
//!
//! This crate has no HTTP or database dependencies. The
//! managers are plain async functions generic over the ports in [`store`];
//! the acting user is always passed in explicitly.

// Ports use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod auth;
pub mod catalog;
pub mod error;
pub mod gift;
pub mod graph;
pub mod groups;
pub mod identity;
pub mod profiles;
pub mod reservation;
pub mod social;
pub mod store;
pub mod view;

pub use error::{Error, ErrorKind, Result};
