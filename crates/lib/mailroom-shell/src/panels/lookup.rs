use mailroom_core::control::{ClerkControlPlane, ControlError};
use mailroom_core::query::{SortOrder, events_between};
use mailroom_core::store::LoadReport;
use mailroom_store::models::{Day, RecordKind};

/// Party and day filters shared by the route and price panels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub range: Option<(Day, Day)>,
    pub sort: SortOrder,
}

impl LookupFilter {
    /// Applies one panel verb to the filter.
    ///
    /// `*` or an empty value clears a party; `range clear` clears the days.
    ///
    /// # Errors
    /// Returns a message for unknown verbs or unparseable values.
    pub fn apply(&mut self, verb: &str, args: &[&str]) -> Result<(), String> {
        match verb {
            "from" => self.from = party(args),
            "to" => self.to = party(args),
            "sort" => {
                self.sort = args
                    .first()
                    .ok_or_else(|| "sort needs an order".to_string())?
                    .parse()?;
            }
            "range" => {
                self.range = match args {
                    [] | ["clear"] => None,
                    [from, to] => Some((
                        Day::parse(from).map_err(|err| err.to_string())?,
                        Day::parse(to).map_err(|err| err.to_string())?,
                    )),
                    _ => return Err("range needs two days or 'clear'".to_string()),
                };
            }
            other => return Err(format!("unknown lookup verb: {other}")),
        }
        Ok(())
    }

    /// Runs the lookup for one record kind.
    ///
    /// # Errors
    /// Returns `ControlError` if the store cannot be loaded.
    pub fn run(
        &self,
        control: &ClerkControlPlane,
        kind: RecordKind,
    ) -> Result<LoadReport, ControlError> {
        let mut report =
            control.route_events(kind, self.from.as_deref(), self.to.as_deref(), self.sort)?;
        if let Some((from, to)) = self.range {
            report.events = events_between(&report.events, from, to);
        }
        Ok(report)
    }

    #[must_use]
    pub fn describe(&self) -> String {
        let range = self
            .range
            .map_or_else(|| "any day".to_string(), |(from, to)| format!("{from} .. {to}"));
        format!(
            "from {} to {}, {range}, sorted {}",
            self.from.as_deref().unwrap_or("*"),
            self.to.as_deref().unwrap_or("*"),
            self.sort
        )
    }
}

fn party(args: &[&str]) -> Option<String> {
    let joined = args.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() || trimmed == "*" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parties_accept_multi_word_names_and_wildcards() {
        let mut filter = LookupFilter::default();
        filter.apply("to", &["Costa", "Rica"]).expect("to");
        assert_eq!(filter.to.as_deref(), Some("Costa Rica"));
        filter.apply("to", &["*"]).expect("to");
        assert_eq!(filter.to, None);
    }

    #[test]
    fn range_and_sort_parse_or_report() {
        let mut filter = LookupFilter::default();
        filter
            .apply("range", &["09/06/2013", "10/05/2013"])
            .expect("range");
        assert!(filter.range.is_some());
        filter.apply("range", &["clear"]).expect("clear");
        assert_eq!(filter.range, None);
        assert!(filter.apply("range", &["10/05/2013"]).is_err());

        filter.apply("sort", &["priority-desc"]).expect("sort");
        assert_eq!(filter.sort, SortOrder::PriorityDescending);
        assert!(filter.apply("sort", &[]).is_err());
        assert!(filter.apply("weigh", &[]).is_err());
    }
}
