//! Clerk shell for mailroom.
//!
//! A top bar of four buttons switches between three panels: mail entry, price
//! lookup and route lookup. The mail entry form is the only path that writes to
//! the store; the lookups are read-only views over the control plane.

pub mod command;
pub mod panels;
pub mod shell;
pub mod view;

pub use command::{Command, Panel, Transition, dispatch};
pub use shell::{ClerkShell, ShellOutcome};
