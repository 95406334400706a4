use std::{error::Error, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::{
    DAY_FORMAT,
    FIELD_DAY,
    FIELD_FROM,
    FIELD_PRIORITY,
    FIELD_TO,
    FIELD_VOLUME,
    FIELD_WEIGHT,
    MAIL_FIELDS,
    PARCEL_FIELDS,
    TAG_MAIL,
    TAG_PARCEL,
};

/// Error returned when a day is not in `dd/mm/yyyy` form or names no real date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayParseError {
    input: String,
}

impl DayParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for DayParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unparseable day '{}', expected dd/mm/yyyy", self.input)
    }
}

impl Error for DayParseError {}

/// Calendar day of a mail event. Text form is always `dd/mm/yyyy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(NaiveDate);

impl Day {
    /// Parses the `dd/mm/yyyy` text form.
    ///
    /// # Errors
    /// Returns `DayParseError` if the text has another shape or is not a real date.
    pub fn parse(text: &str) -> Result<Self, DayParseError> {
        let trimmed = text.trim();
        if !has_day_shape(trimmed) {
            return Err(DayParseError::new(text));
        }
        NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
            .map(Self)
            .map_err(|_| DayParseError::new(text))
    }

    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }
}

fn has_day_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(index, byte)| match index {
            2 | 5 => *byte == b'/',
            _ => byte.is_ascii_digit(),
        })
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for Day {
    type Err = DayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for Day {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Record kind; in storage it is carried only by the element tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Mail,
    Parcel,
}

impl RecordKind {
    pub const ALL: [Self; 2] = [Self::Mail, Self::Parcel];

    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Mail => TAG_MAIL,
            Self::Parcel => TAG_PARCEL,
        }
    }

    /// Field tags in storage order for this kind.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Mail => &MAIL_FIELDS,
            Self::Parcel => &PARCEL_FIELDS,
        }
    }

    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            TAG_MAIL => Some(Self::Mail),
            TAG_PARCEL => Some(Self::Parcel),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown record kind: {s}"))
    }
}

/// A mail or parcel entry.
///
/// Parcels carry `weight` and `volume`; plain mail never does. The constructors
/// keep the two in step with `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailEvent {
    pub kind: RecordKind,
    pub day: Day,
    pub to: String,
    pub from: String,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

impl MailEvent {
    pub fn mail(day: Day, to: impl Into<String>, from: impl Into<String>, priority: i32) -> Self {
        Self {
            kind: RecordKind::Mail,
            day,
            to: to.into(),
            from: from.into(),
            priority,
            weight: None,
            volume: None,
        }
    }

    pub fn parcel(
        day: Day,
        to: impl Into<String>,
        from: impl Into<String>,
        weight: impl Into<String>,
        volume: impl Into<String>,
        priority: i32,
    ) -> Self {
        Self {
            kind: RecordKind::Parcel,
            day,
            to: to.into(),
            from: from.into(),
            priority,
            weight: Some(weight.into()),
            volume: Some(volume.into()),
        }
    }

    #[must_use]
    pub const fn is_parcel(&self) -> bool {
        matches!(self.kind, RecordKind::Parcel)
    }

    /// `(tag, text)` pairs in the fixed storage order for this record's kind.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        self.kind
            .fields()
            .iter()
            .map(|tag| (*tag, self.field_text(tag).unwrap_or_default()))
            .collect()
    }

    /// Text form of a single field, if this record's kind has it.
    #[must_use]
    pub fn field_text(&self, tag: &str) -> Option<String> {
        match tag {
            FIELD_DAY => Some(self.day.to_string()),
            FIELD_TO => Some(self.to.clone()),
            FIELD_FROM => Some(self.from.clone()),
            FIELD_PRIORITY => Some(self.priority.to_string()),
            FIELD_WEIGHT => self.weight.clone(),
            FIELD_VOLUME => self.volume.clone(),
            _ => None,
        }
    }
}

impl fmt::Display for MailEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} to {} priority {}",
            self.kind, self.day, self.from, self.to, self.priority
        )?;
        if let (Some(weight), Some(volume)) = (&self.weight, &self.volume) {
            write!(f, " weight {weight} volume {volume}")?;
        }
        Ok(())
    }
}
