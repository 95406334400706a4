use mailroom_store::models::{Day, MailEvent, RecordKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::store::{StoreError, unstorable_char};

use super::{ClerkControlPlane, ControlError};

/// Form data for a new mail or parcel entry, as typed by the clerk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub kind: RecordKind,
    pub day: String,
    pub to: String,
    pub from: String,
    pub priority: String,
    pub weight: Option<String>,
    pub volume: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReport {
    pub event: MailEvent,
    pub store_path: String,
}

impl SubmitRequest {
    /// Validates the form fields into a typed event.
    ///
    /// # Errors
    /// Returns `ControlError::InvalidInput` naming the first bad field.
    pub fn to_event(&self) -> Result<MailEvent, ControlError> {
        let to = required(&self.to, "to")?;
        let from = required(&self.from, "from")?;
        let day =
            Day::parse(&self.day).map_err(|err| ControlError::InvalidInput(err.to_string()))?;
        let priority = self.priority.trim().parse::<i32>().map_err(|_| {
            ControlError::InvalidInput(format!("priority must be an integer: '{}'", self.priority))
        })?;

        let weight = optional(self.weight.as_deref(), "weight")?;
        let volume = optional(self.volume.as_deref(), "volume")?;
        match self.kind {
            RecordKind::Mail => {
                if weight.is_some() || volume.is_some() {
                    return Err(ControlError::InvalidInput(
                        "mail entries do not carry weight or volume".to_string(),
                    ));
                }
                Ok(MailEvent::mail(day, to, from, priority))
            }
            RecordKind::Parcel => {
                let weight = weight.ok_or_else(|| missing("weight"))?;
                let volume = volume.ok_or_else(|| missing("volume"))?;
                Ok(MailEvent::parcel(day, to, from, weight, volume, priority))
            }
        }
    }
}

impl ClerkControlPlane {
    /// Validates a form submission and appends it to the mail event store.
    ///
    /// When a country list exists, both parties must appear in it.
    ///
    /// # Errors
    /// Returns `ControlError` if validation fails or the store cannot be rewritten.
    pub fn submit(&self, request: &SubmitRequest) -> Result<SubmitReport, ControlError> {
        let event = request.to_event()?;
        self.check_parties(&event)?;

        self.store.append_record(&self.names.mail_events, &event)?;
        let store_path = self.store.path_for(&self.names.mail_events);
        info!("clerk submitted {} entry for {}", event.kind, event.day);

        Ok(SubmitReport {
            event,
            store_path: store_path.display().to_string(),
        })
    }

    fn check_parties(&self, event: &MailEvent) -> Result<(), ControlError> {
        let countries = match self.store.load_countries(&self.names.countries) {
            Ok(countries) => countries,
            Err(StoreError::NotFound(path)) => {
                debug!("no country list at {}, skipping party check", path.display());
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        if countries.is_empty() {
            return Ok(());
        }
        for (field, party) in [("to", &event.to), ("from", &event.from)] {
            if !countries.iter().any(|country| country == party) {
                return Err(ControlError::InvalidInput(format!(
                    "{field} '{party}' is not a known country"
                )));
            }
        }
        Ok(())
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ControlError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(missing(field));
    }
    storable(value, field)
}

fn optional<'a>(value: Option<&'a str>, field: &str) -> Result<Option<&'a str>, ControlError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| storable(value, field))
        .transpose()
}

fn storable<'a>(value: &'a str, field: &str) -> Result<&'a str, ControlError> {
    match unstorable_char(value) {
        Some(ch) => Err(ControlError::InvalidInput(format!(
            "{field} contains a character that cannot be stored: {ch:?}"
        ))),
        None => Ok(value),
    }
}

fn missing(field: &str) -> ControlError {
    ControlError::InvalidInput(format!("{field} is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: RecordKind) -> SubmitRequest {
        SubmitRequest {
            kind,
            day: "10/05/2013".to_string(),
            to: " Lima ".to_string(),
            from: "Quito".to_string(),
            priority: "1".to_string(),
            weight: None,
            volume: None,
        }
    }

    #[test]
    fn mail_request_becomes_trimmed_event() {
        let event = request(RecordKind::Mail).to_event().expect("valid mail");
        assert_eq!(event.to, "Lima");
        assert_eq!(event.priority, 1);
        assert!(!event.is_parcel());
    }

    #[test]
    fn parcel_request_requires_dimensions() {
        let mut parcel = request(RecordKind::Parcel);
        parcel.weight = Some("2".to_string());
        let err = parcel.to_event().expect_err("volume missing");
        assert!(err.to_string().contains("volume is required"));

        parcel.volume = Some("5".to_string());
        let event = parcel.to_event().expect("valid parcel");
        assert_eq!(event.weight.as_deref(), Some("2"));
        assert_eq!(event.volume.as_deref(), Some("5"));
    }

    #[test]
    fn mail_request_rejects_parcel_fields() {
        let mut mail = request(RecordKind::Mail);
        mail.weight = Some("2".to_string());
        assert!(matches!(mail.to_event(), Err(ControlError::InvalidInput(_))));
    }

    #[test]
    fn bad_day_and_priority_are_reported() {
        let mut bad_day = request(RecordKind::Mail);
        bad_day.day = "2013/05/10".to_string();
        assert!(bad_day.to_event().expect_err("bad day").to_string().contains("dd/mm/yyyy"));

        let mut bad_priority = request(RecordKind::Mail);
        bad_priority.priority = "urgent".to_string();
        assert!(
            bad_priority
                .to_event()
                .expect_err("bad priority")
                .to_string()
                .contains("priority must be an integer")
        );
    }

    #[test]
    fn control_characters_are_rejected_in_every_text_field() {
        let mut bad_to = request(RecordKind::Mail);
        bad_to.to = "Li\u{1}ma".to_string();
        let err = bad_to.to_event().expect_err("control character in to");
        assert!(err.to_string().contains("to contains a character"));

        let mut bad_weight = request(RecordKind::Parcel);
        bad_weight.weight = Some("2\u{FFFE}".to_string());
        bad_weight.volume = Some("5".to_string());
        assert!(matches!(bad_weight.to_event(), Err(ControlError::InvalidInput(_))));
    }
}
