use std::path::PathBuf;

use mailroom_store::models::{Day, RecordKind};
use mailroom_store::schema::{FIELD_FROM, FIELD_TO, ROOT_COUNTRIES, ROOT_MAIL_EVENTS};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::{QueryError, SortOrder, events_between, sort_events};
use crate::store::{FieldFilter, LoadReport, TagColumn};

use super::{ClerkControlPlane, ControlError};

/// Listing options for [`ClerkControlPlane::list_events`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    pub kind: Option<RecordKind>,
    pub from_day: Option<String>,
    pub to_day: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl EventQuery {
    #[must_use]
    pub const fn with_kind(mut self, kind: Option<RecordKind>) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn between(mut self, from_day: impl Into<String>, to_day: impl Into<String>) -> Self {
        self.from_day = Some(from_day.into());
        self.to_day = Some(to_day.into());
        self
    }

    #[must_use]
    pub const fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    fn range(&self) -> Result<Option<(Day, Day)>, ControlError> {
        match (self.from_day.as_deref(), self.to_day.as_deref()) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) => {
                let from = Day::parse(from).map_err(QueryError::from)?;
                let to = Day::parse(to).map_err(QueryError::from)?;
                Ok(Some((from, to)))
            }
            _ => Err(ControlError::InvalidInput(
                "a date range needs both a from and a to day".to_string(),
            )),
        }
    }
}

impl ClerkControlPlane {
    /// Loads mail events, optionally narrowed by kind and day range, sorted.
    ///
    /// # Errors
    /// Returns `ControlError` if a bound is invalid or the store cannot be loaded.
    pub fn list_events(&self, query: &EventQuery) -> Result<LoadReport, ControlError> {
        let range = query.range()?;
        let mut report = self.store.load_events(&self.names.mail_events, query.kind)?;
        if let Some((from, to)) = range {
            report.events = events_between(&report.events, from, to);
        }
        sort_events(&mut report.events, query.sort);
        debug!(
            "listed {} events ({} skipped)",
            report.events.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Events of one kind travelling between two optional parties.
    ///
    /// # Errors
    /// Returns `ControlError` if the store cannot be loaded.
    pub fn route_events(
        &self,
        kind: RecordKind,
        from: Option<&str>,
        to: Option<&str>,
        sort: SortOrder,
    ) -> Result<LoadReport, ControlError> {
        let filters: Vec<FieldFilter> = kind
            .fields()
            .iter()
            .map(|tag| match *tag {
                FIELD_FROM => FieldFilter::matching(*tag, non_blank(from)),
                FIELD_TO => FieldFilter::matching(*tag, non_blank(to)),
                _ => FieldFilter::any(*tag),
            })
            .collect();
        let records =
            self.store
                .load_records_conditional(&self.names.mail_events, kind.tag(), &filters)?;
        let mut report = LoadReport::from_records(records);
        sort_events(&mut report.events, sort);
        Ok(report)
    }

    /// Reference list of countries, in document order.
    ///
    /// # Errors
    /// Returns `ControlError` if the country store cannot be loaded.
    pub fn countries(&self) -> Result<Vec<String>, ControlError> {
        Ok(self.store.load_countries(&self.names.countries)?)
    }

    /// Raw tag columns from either store.
    ///
    /// # Errors
    /// Returns `ControlError` if the store cannot be loaded.
    pub fn tag_columns(&self, store: &str, tags: &[&str]) -> Result<Vec<TagColumn>, ControlError> {
        Ok(self.store.load_fields(store, tags)?)
    }

    /// Creates empty mail event and country documents when they are absent.
    ///
    /// Returns the paths of the documents that were created.
    ///
    /// # Errors
    /// Returns `ControlError` if a document cannot be written.
    pub fn init_stores(&self) -> Result<Vec<PathBuf>, ControlError> {
        let mut created = Vec::new();
        for (name, root) in [
            (&self.names.mail_events, ROOT_MAIL_EVENTS),
            (&self.names.countries, ROOT_COUNTRIES),
        ] {
            if self.store.create_store(name, root)? {
                created.push(self.store.path_for(name));
            }
        }
        Ok(created)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
