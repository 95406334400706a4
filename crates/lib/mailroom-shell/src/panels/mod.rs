//! Panel state for the clerk shell.

pub mod form;
pub mod lookup;

pub use form::FormDraft;
pub use lookup::LookupFilter;
