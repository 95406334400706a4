//! Filtering and ordering over loaded mail events.

use std::{cmp::Ordering, error::Error, fmt, str::FromStr};

use mailroom_store::models::{Day, DayParseError, MailEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidBound(DayParseError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBound(err) => write!(f, "invalid date bound: {err}"),
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBound(err) => Some(err),
        }
    }
}

impl From<DayParseError> for QueryError {
    fn from(err: DayParseError) -> Self {
        Self::InvalidBound(err)
    }
}

/// Ordering keys for mail event listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DayAscending,
    DayDescending,
    PriorityAscending,
    PriorityDescending,
}

impl SortOrder {
    pub const ALL: [Self; 4] = [
        Self::DayAscending,
        Self::DayDescending,
        Self::PriorityAscending,
        Self::PriorityDescending,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DayAscending => "day-asc",
            Self::DayDescending => "day-desc",
            Self::PriorityAscending => "priority-asc",
            Self::PriorityDescending => "priority-desc",
        }
    }

    #[must_use]
    pub fn compare(self, a: &MailEvent, b: &MailEvent) -> Ordering {
        match self {
            Self::DayAscending => a.day.cmp(&b.day),
            Self::DayDescending => b.day.cmp(&a.day),
            Self::PriorityAscending => a.priority.cmp(&b.priority),
            Self::PriorityDescending => b.priority.cmp(&a.priority),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|order| order.as_str()).collect();
                format!("unknown sort order '{s}', expected one of {}", known.join(", "))
            })
    }
}

/// Sorts in place. Equal keys keep their load order.
pub fn sort_events(events: &mut [MailEvent], order: SortOrder) {
    events.sort_by(|a, b| order.compare(a, b));
}

/// Events whose day lies between the two bounds, inclusive.
///
/// Bounds are `dd/mm/yyyy` text and may be given in either order.
///
/// # Errors
/// Returns `QueryError::InvalidBound` if either bound does not parse.
pub fn filter_by_date_range(
    events: &[MailEvent],
    from: &str,
    to: &str,
) -> Result<Vec<MailEvent>, QueryError> {
    let from = Day::parse(from)?;
    let to = Day::parse(to)?;
    Ok(events_between(events, from, to))
}

#[must_use]
pub fn events_between(events: &[MailEvent], from: Day, to: Day) -> Vec<MailEvent> {
    let (start, end) = if from > to { (to, from) } else { (from, to) };
    events
        .iter()
        .filter(|event| start <= event.day && event.day <= end)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(text: &str) -> Day {
        Day::parse(text).expect("valid day")
    }

    fn sample() -> Vec<MailEvent> {
        vec![
            MailEvent::mail(day("10/05/2013"), "Lima", "Quito", 2),
            MailEvent::parcel(day("01/06/2013"), "Quito", "Lima", "1", "2", 1),
            MailEvent::mail(day("09/06/2013"), "Bogota", "Lima", 2),
            MailEvent::mail(day("10/06/2013"), "Lima", "Bogota", 3),
            MailEvent::mail(day("01/01/2013"), "Quito", "Bogota", 1),
        ]
    }

    #[test]
    fn range_includes_both_bounds_when_given_reversed() {
        let events = vec![MailEvent::mail(day("10/05/2013"), "Lima", "Quito", 1)];
        let filtered = filter_by_date_range(&events, "09/06/2013", "10/05/2013").expect("filter");
        assert_eq!(filtered, events);
    }

    #[test]
    fn range_is_symmetric_in_its_bounds() {
        let events = sample();
        let forward = filter_by_date_range(&events, "10/05/2013", "09/06/2013").expect("filter");
        let backward = filter_by_date_range(&events, "09/06/2013", "10/05/2013").expect("filter");
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 3);
    }

    #[test]
    fn range_rejects_unparseable_bounds() {
        let err = filter_by_date_range(&sample(), "2013-05-10", "09/06/2013")
            .expect_err("bound should not parse");
        assert!(matches!(err, QueryError::InvalidBound(_)));
    }

    #[test]
    fn priority_sorts_keep_load_order_for_ties() {
        let mut ascending = sample();
        sort_events(&mut ascending, SortOrder::PriorityAscending);
        let mut descending = sample();
        sort_events(&mut descending, SortOrder::PriorityDescending);

        let days = |events: &[MailEvent], priority: i32| -> Vec<String> {
            events
                .iter()
                .filter(|event| event.priority == priority)
                .map(|event| event.day.to_string())
                .collect()
        };
        for priority in 1..=3 {
            assert_eq!(days(ascending.as_slice(), priority), days(descending.as_slice(), priority));
        }
        assert_eq!(days(ascending.as_slice(), 2), vec!["10/05/2013", "09/06/2013"]);

        let priorities: Vec<i32> = descending.iter().map(|event| event.priority).collect();
        assert_eq!(priorities, vec![3, 2, 2, 1, 1]);
    }

    #[test]
    fn day_sorts_are_chronological() {
        let mut events = sample();
        sort_events(&mut events, SortOrder::DayAscending);
        let first = events.first().expect("events").day;
        let last = events.last().expect("events").day;
        assert_eq!((first, last), (day("01/01/2013"), day("10/06/2013")));

        sort_events(&mut events, SortOrder::DayDescending);
        assert_eq!(events[0].day, day("10/06/2013"));
    }

    #[test]
    fn sort_order_parses_its_own_names() {
        for order in SortOrder::ALL {
            assert_eq!(order.as_str().parse::<SortOrder>(), Ok(order));
        }
        assert!("newest".parse::<SortOrder>().is_err());
    }
}
