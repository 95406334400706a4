//! Storage models and schema helpers for mailroom.
//!
//! This crate defines the mail event data model shared by the store adapter,
//! the control plane and the clerk shell, plus the fixed tag vocabulary of the
//! XML store.

pub mod models;
pub mod schema;

pub use models::*;
