pub const STORE_MAIL_EVENTS: &str = "mailevents";
pub const STORE_COUNTRIES: &str = "countries";
pub const STORE_EXTENSION: &str = "xml";

pub const ROOT_MAIL_EVENTS: &str = "mailevents";
pub const ROOT_COUNTRIES: &str = "countries";

pub const TAG_MAIL: &str = "mail";
pub const TAG_PARCEL: &str = "parcel";
pub const TAG_COUNTRY: &str = "country";

pub const FIELD_DAY: &str = "day";
pub const FIELD_TO: &str = "to";
pub const FIELD_FROM: &str = "from";
pub const FIELD_PRIORITY: &str = "priority";
pub const FIELD_WEIGHT: &str = "weight";
pub const FIELD_VOLUME: &str = "volume";

pub const MAIL_FIELDS: [&str; 4] = [FIELD_DAY, FIELD_TO, FIELD_FROM, FIELD_PRIORITY];
pub const PARCEL_FIELDS: [&str; 6] = [
    FIELD_DAY,
    FIELD_TO,
    FIELD_FROM,
    FIELD_WEIGHT,
    FIELD_VOLUME,
    FIELD_PRIORITY,
];

/// `chrono` format string for the `dd/mm/yyyy` day text form.
pub const DAY_FORMAT: &str = "%d/%m/%Y";

pub fn store_file_name(store: &str) -> String {
    format!("{store}.{STORE_EXTENSION}")
}
