use std::fmt::Write;

use mailroom_core::control::SubmitRequest;
use mailroom_store::models::RecordKind;
use mailroom_store::schema::{
    FIELD_DAY,
    FIELD_FROM,
    FIELD_PRIORITY,
    FIELD_TO,
    FIELD_VOLUME,
    FIELD_WEIGHT,
};

const FIELD_KIND: &str = "kind";

/// Mail entry form contents between edits and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    pub kind: RecordKind,
    pub day: String,
    pub to: String,
    pub from: String,
    pub priority: String,
    pub weight: String,
    pub volume: String,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            kind: RecordKind::Mail,
            day: String::new(),
            to: String::new(),
            from: String::new(),
            priority: String::new(),
            weight: String::new(),
            volume: String::new(),
        }
    }
}

impl FormDraft {
    /// Sets one form field by its tag name.
    ///
    /// # Errors
    /// Returns a message if the field is unknown or the kind is not valid.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), String> {
        let value = value.trim().to_string();
        match field.trim().to_ascii_lowercase().as_str() {
            FIELD_KIND => self.kind = value.parse()?,
            FIELD_DAY => self.day = value,
            FIELD_TO => self.to = value,
            FIELD_FROM => self.from = value,
            FIELD_PRIORITY => self.priority = value,
            FIELD_WEIGHT => self.weight = value,
            FIELD_VOLUME => self.volume = value,
            other => return Err(format!("unknown form field: {other}")),
        }
        Ok(())
    }

    /// Submission payload; parcel-only fields are dropped for plain mail.
    #[must_use]
    pub fn to_request(&self) -> SubmitRequest {
        let parcel_field = |value: &str| match self.kind {
            RecordKind::Parcel => Some(value.to_string()),
            RecordKind::Mail => None,
        };
        SubmitRequest {
            kind: self.kind,
            day: self.day.clone(),
            to: self.to.clone(),
            from: self.from.clone(),
            priority: self.priority.clone(),
            weight: parcel_field(&self.weight),
            volume: parcel_field(&self.volume),
        }
    }

    #[must_use]
    pub fn render(&self, countries: &[String]) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "  {FIELD_KIND:<9}{}", self.kind);
        let mut rows = vec![
            (FIELD_DAY, &self.day),
            (FIELD_TO, &self.to),
            (FIELD_FROM, &self.from),
        ];
        if self.kind == RecordKind::Parcel {
            rows.push((FIELD_WEIGHT, &self.weight));
            rows.push((FIELD_VOLUME, &self.volume));
        }
        rows.push((FIELD_PRIORITY, &self.priority));
        for (field, value) in rows {
            let shown = if value.is_empty() { "-" } else { value.as_str() };
            let _ = writeln!(output, "  {field:<9}{shown}");
        }
        if !countries.is_empty() {
            let _ = writeln!(output, "  countries: {}", countries.join(", "));
        }
        output.push_str("  set <field> <value> | clear | submit\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_draft_drops_parcel_fields() {
        let mut draft = FormDraft::default();
        draft.set("weight", "3").expect("known field");
        draft.set("day", " 10/05/2013 ").expect("known field");
        let request = draft.to_request();
        assert_eq!(request.day, "10/05/2013");
        assert_eq!(request.weight, None);
    }

    #[test]
    fn parcel_draft_carries_dimensions() {
        let mut draft = FormDraft::default();
        draft.set("Kind", "parcel").expect("known kind");
        draft.set("weight", "3").expect("known field");
        let request = draft.to_request();
        assert_eq!(request.kind, RecordKind::Parcel);
        assert_eq!(request.weight.as_deref(), Some("3"));
        assert_eq!(request.volume.as_deref(), Some(""));
    }

    #[test]
    fn unknown_fields_and_kinds_are_rejected() {
        let mut draft = FormDraft::default();
        assert!(draft.set("colour", "red").is_err());
        assert!(draft.set("kind", "letter").is_err());
        assert_eq!(draft, FormDraft::default());
    }

    #[test]
    fn render_lists_parcel_rows_only_for_parcels() {
        let mut draft = FormDraft::default();
        assert!(!draft.render(&[]).contains("weight"));
        draft.kind = RecordKind::Parcel;
        assert!(draft.render(&[]).contains("weight"));
    }
}
