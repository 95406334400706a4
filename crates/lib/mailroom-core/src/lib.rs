//! Core types and services for mailroom.
//!
//! This crate owns the XML-backed store adapter, the query helpers used to
//! filter and order mail events, and the clerk control plane that ties the two
//! together for the shell and the CLI.

pub mod control;
pub mod query;
pub mod store;
