use std::{error::Error, fmt, path::PathBuf};

use mailroom_store::schema::{STORE_COUNTRIES, STORE_MAIL_EVENTS};

use crate::query::QueryError;
use crate::store::{StoreError, XmlStore};

pub mod data;
pub mod submit;

pub use data::EventQuery;
pub use submit::{SubmitReport, SubmitRequest};

#[derive(Debug)]
pub enum ControlError {
    Store(StoreError),
    Query(QueryError),
    InvalidInput(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Query(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Query(err) => Some(err),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<QueryError> for ControlError {
    fn from(err: QueryError) -> Self {
        Self::Query(err)
    }
}

/// Names of the two documents a clerk works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    pub mail_events: String,
    pub countries: String,
}

impl Default for StoreNames {
    fn default() -> Self {
        Self {
            mail_events: STORE_MAIL_EVENTS.to_string(),
            countries: STORE_COUNTRIES.to_string(),
        }
    }
}

/// Clerk operations over the mail event and country stores.
#[derive(Debug, Clone)]
pub struct ClerkControlPlane {
    store: XmlStore,
    names: StoreNames,
}

impl ClerkControlPlane {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_store(XmlStore::new(data_dir), StoreNames::default())
    }

    #[must_use]
    pub const fn with_store(store: XmlStore, names: StoreNames) -> Self {
        Self { store, names }
    }

    #[must_use]
    pub const fn store(&self) -> &XmlStore {
        &self.store
    }

    #[must_use]
    pub const fn names(&self) -> &StoreNames {
        &self.names
    }
}
