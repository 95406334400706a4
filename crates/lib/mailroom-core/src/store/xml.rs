use std::{
    error::Error,
    fmt,
    fs,
    io,
    path::{Path, PathBuf},
};

use mailroom_store::models::{Day, MailEvent, RecordKind};
use mailroom_store::schema::{
    FIELD_DAY,
    FIELD_FROM,
    FIELD_PRIORITY,
    FIELD_TO,
    FIELD_VOLUME,
    FIELD_WEIGHT,
    TAG_COUNTRY,
    store_file_name,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::document::{XmlElement, unstorable_char};

#[derive(Debug)]
pub enum StoreError {
    NotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
    Malformed { path: PathBuf, message: String },
    InvalidInput(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "store not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "I/O error on {}: {source}", path.display()),
            Self::Malformed { path, message } => {
                write!(f, "malformed store {}: {message}", path.display())
            }
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Text values of one tag, as returned by [`XmlStore::load_fields`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagColumn {
    pub tag: String,
    pub values: Vec<String>,
}

/// Field selection for [`XmlStore::load_records_conditional`].
///
/// `expected: None` extracts the field without constraining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub tag: String,
    pub expected: Option<String>,
}

impl FieldFilter {
    pub fn any(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            expected: None,
        }
    }

    pub fn equals(tag: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            expected: Some(expected.into()),
        }
    }

    /// Constrains the field only when a value is given.
    pub fn matching(tag: impl Into<String>, expected: Option<&str>) -> Self {
        Self {
            tag: tag.into(),
            expected: expected.map(str::to_string),
        }
    }
}

/// One keyed element's fields, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    pub key_tag: String,
    /// Index among all `mail` and `parcel` entries of the document, or among
    /// the `key_tag` elements when the key is not an entry tag.
    pub position: usize,
    pub fields: Vec<(String, String)>,
}

impl RawRecord {
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
    }

    /// Requested tags that the element did not carry.
    #[must_use]
    pub fn missing(&self, tags: &[&str]) -> Vec<String> {
        tags.iter()
            .filter(|tag| self.get(tag).is_none())
            .map(|tag| (*tag).to_string())
            .collect()
    }
}

/// Why a stored row could not become a [`MailEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", content = "detail", rename_all = "snake_case")]
pub enum RecordProblem {
    UnknownKind(String),
    MissingFields(Vec<String>),
    InvalidDay(String),
    InvalidPriority(String),
}

impl fmt::Display for RecordProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(tag) => write!(f, "<{tag}> is not a mail or parcel entry"),
            Self::MissingFields(tags) => write!(f, "missing fields: {}", tags.join(", ")),
            Self::InvalidDay(message) => f.write_str(message),
            Self::InvalidPriority(value) => write!(f, "priority is not an integer: '{value}'"),
        }
    }
}

/// A row skipped during a typed load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    pub position: usize,
    pub key_tag: String,
    pub problem: RecordProblem,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.key_tag, self.position, self.problem)
    }
}

impl Error for RecordError {}

/// Result of a typed load: the usable events plus the rows that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub events: Vec<MailEvent>,
    pub skipped: Vec<RecordError>,
}

impl LoadReport {
    /// Converts raw rows, keeping failures as skipped entries.
    #[must_use]
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let mut report = Self::default();
        for record in records {
            match event_from_record(&record) {
                Ok(event) => report.events.push(event),
                Err(problem) => {
                    let error = RecordError {
                        position: record.position,
                        key_tag: record.key_tag,
                        problem,
                    };
                    warn!("skipping stored record: {error}");
                    report.skipped.push(error);
                }
            }
        }
        report
    }
}

/// XML documents kept as `<name>.xml` files in one data directory.
#[derive(Debug, Clone)]
pub struct XmlStore {
    data_dir: PathBuf,
}

impl XmlStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn path_for(&self, store: &str) -> PathBuf {
        self.data_dir.join(store_file_name(store))
    }

    /// Loads a whole store document into memory.
    ///
    /// # Errors
    /// Returns `StoreError` if the file is absent, unreadable or not well-formed.
    pub fn load_document(&self, store: &str) -> StoreResult<XmlElement> {
        ensure_store_name(store)?;
        let path = self.path_for(store);
        let xml = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                StoreError::NotFound(path.clone())
            } else {
                StoreError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let root = XmlElement::parse(&xml).map_err(|err| StoreError::Malformed {
            path: path.clone(),
            message: err.to_string(),
        })?;
        debug!("loaded {} ({} top-level entries)", path.display(), root.elements().count());
        Ok(root)
    }

    /// Overwrites a store document with the given tree.
    ///
    /// # Errors
    /// Returns `StoreError` if the file cannot be written.
    pub fn save_document(&self, store: &str, root: &XmlElement) -> StoreResult<()> {
        ensure_store_name(store)?;
        let path = self.path_for(store);
        fs::write(&path, root.to_document_string()).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }

    /// Writes an empty document with the given root unless the store exists.
    ///
    /// Returns `true` when a new file was created.
    ///
    /// # Errors
    /// Returns `StoreError` if the data directory or file cannot be written.
    pub fn create_store(&self, store: &str, root: &str) -> StoreResult<bool> {
        ensure_store_name(store)?;
        ensure_non_empty(root, "root")?;
        let path = self.path_for(store);
        if path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Io {
            path: self.data_dir.clone(),
            source,
        })?;
        self.save_document(store, &XmlElement::new(root))?;
        info!("created store {}", path.display());
        Ok(true)
    }

    /// Text content of every element named `tag`, in document order.
    ///
    /// # Errors
    /// Returns `StoreError` if the document cannot be loaded.
    pub fn load_field(&self, store: &str, tag: &str) -> StoreResult<Vec<String>> {
        ensure_non_empty(tag, "tag")?;
        let root = self.load_document(store)?;
        Ok(text_of_all(&root, tag))
    }

    /// Like [`Self::load_field`] for several tags over a single load.
    ///
    /// Tags with no matching element are left out of the result.
    ///
    /// # Errors
    /// Returns `StoreError` if the document cannot be loaded.
    pub fn load_fields(&self, store: &str, tags: &[&str]) -> StoreResult<Vec<TagColumn>> {
        for tag in tags {
            ensure_non_empty(tag, "tag")?;
        }
        let root = self.load_document(store)?;
        Ok(tags
            .iter()
            .filter_map(|tag| {
                let values = text_of_all(&root, tag);
                if values.is_empty() {
                    None
                } else {
                    Some(TagColumn {
                        tag: (*tag).to_string(),
                        values,
                    })
                }
            })
            .collect())
    }

    /// Extracts the filtered fields of every element named `key_tag`.
    ///
    /// An element is kept only when every constrained field is present with
    /// exactly the expected text. Unconstrained fields that are absent are
    /// left out of the record; see [`RawRecord::missing`].
    ///
    /// # Errors
    /// Returns `StoreError` if the document cannot be loaded.
    pub fn load_records_conditional(
        &self,
        store: &str,
        key_tag: &str,
        filters: &[FieldFilter],
    ) -> StoreResult<Vec<RawRecord>> {
        ensure_non_empty(key_tag, "key_tag")?;
        let root = self.load_document(store)?;
        let scanned: Vec<&XmlElement> = if RecordKind::from_tag(key_tag).is_some() {
            entries_of(&root).into_iter().map(|(_, element)| element).collect()
        } else {
            root.descendants_named(key_tag)
        };
        Ok(scanned
            .into_iter()
            .enumerate()
            .filter(|(_, element)| element.name == key_tag)
            .filter_map(|(position, element)| extract_record(element, position, filters))
            .collect())
    }

    /// Appends one record as the last child of the root and rewrites the file.
    ///
    /// # Errors
    /// Returns `StoreError` if the document cannot be loaded or written back.
    pub fn append_record(&self, store: &str, record: &MailEvent) -> StoreResult<()> {
        validate_event(record)?;
        let mut root = self.load_document(store)?;

        let mut element = XmlElement::new(record.kind.tag());
        for (tag, text) in record.fields() {
            element.push(XmlElement::with_text(tag, text));
        }
        root.push(element);

        self.save_document(store, &root)?;
        info!("appended {record} to {}", self.path_for(store).display());
        Ok(())
    }

    /// Loads every `mail` and `parcel` entry as a typed event.
    ///
    /// Rows that cannot be converted are skipped and listed in the report.
    /// `kind` restricts the load to one record kind.
    ///
    /// # Errors
    /// Returns `StoreError` if the document cannot be loaded.
    pub fn load_events(&self, store: &str, kind: Option<RecordKind>) -> StoreResult<LoadReport> {
        let root = self.load_document(store)?;
        let records = entries_of(&root)
            .into_iter()
            .enumerate()
            .filter(|(_, (entry_kind, _))| kind.is_none_or(|wanted| wanted == *entry_kind))
            .filter_map(|(position, (entry_kind, element))| {
                let filters: Vec<FieldFilter> =
                    entry_kind.fields().iter().map(|tag| FieldFilter::any(*tag)).collect();
                extract_record(element, position, &filters)
            })
            .collect();
        Ok(LoadReport::from_records(records))
    }

    /// Loads the reference country list.
    ///
    /// # Errors
    /// Returns `StoreError` if the document cannot be loaded.
    pub fn load_countries(&self, store: &str) -> StoreResult<Vec<String>> {
        self.load_field(store, TAG_COUNTRY)
    }
}

/// `mail` and `parcel` elements below the root, in document order.
fn entries_of(root: &XmlElement) -> Vec<(RecordKind, &XmlElement)> {
    let mut entries = Vec::new();
    collect_entries(root, &mut entries);
    entries
}

fn collect_entries<'a>(
    element: &'a XmlElement,
    entries: &mut Vec<(RecordKind, &'a XmlElement)>,
) {
    for child in element.elements() {
        if let Some(kind) = RecordKind::from_tag(&child.name) {
            entries.push((kind, child));
        }
        collect_entries(child, entries);
    }
}

fn text_of_all(root: &XmlElement, tag: &str) -> Vec<String> {
    root.descendants_named(tag)
        .into_iter()
        .map(XmlElement::text_content)
        .collect()
}

fn extract_record(
    element: &XmlElement,
    position: usize,
    filters: &[FieldFilter],
) -> Option<RawRecord> {
    let mut fields = Vec::with_capacity(filters.len());
    for filter in filters {
        let value = element
            .first_descendant(&filter.tag)
            .map(XmlElement::text_content);
        match (value, filter.expected.as_deref()) {
            (Some(value), Some(expected)) if value != expected => return None,
            (None, Some(_)) => return None,
            (Some(value), _) => fields.push((filter.tag.clone(), value)),
            (None, None) => {}
        }
    }
    Some(RawRecord {
        key_tag: element.name.clone(),
        position,
        fields,
    })
}

/// Converts a raw row into a typed event, using the row's key tag as its kind.
///
/// # Errors
/// Returns the first `RecordProblem` found in the row.
pub fn event_from_record(record: &RawRecord) -> Result<MailEvent, RecordProblem> {
    let kind = RecordKind::from_tag(&record.key_tag)
        .ok_or_else(|| RecordProblem::UnknownKind(record.key_tag.clone()))?;

    let missing = record.missing(kind.fields());
    if !missing.is_empty() {
        return Err(RecordProblem::MissingFields(missing));
    }
    let field = |tag: &str| record.get(tag).unwrap_or_default().to_string();

    let day =
        Day::parse(&field(FIELD_DAY)).map_err(|err| RecordProblem::InvalidDay(err.to_string()))?;
    let priority_text = field(FIELD_PRIORITY);
    let priority = priority_text
        .trim()
        .parse::<i32>()
        .map_err(|_| RecordProblem::InvalidPriority(priority_text.clone()))?;

    Ok(match kind {
        RecordKind::Mail => MailEvent::mail(day, field(FIELD_TO), field(FIELD_FROM), priority),
        RecordKind::Parcel => MailEvent::parcel(
            day,
            field(FIELD_TO),
            field(FIELD_FROM),
            field(FIELD_WEIGHT),
            field(FIELD_VOLUME),
            priority,
        ),
    })
}

fn validate_event(record: &MailEvent) -> StoreResult<()> {
    if record.is_parcel() != (record.weight.is_some() && record.volume.is_some()) {
        return Err(StoreError::InvalidInput(format!(
            "{} record has mismatched weight/volume fields",
            record.kind
        )));
    }
    for (tag, text) in record.fields() {
        ensure_storable(&text, tag)?;
    }
    Ok(())
}

/// A field value must reload as the same text: non-empty, unpadded and free
/// of characters XML cannot carry.
fn ensure_storable(value: &str, field: &str) -> StoreResult<()> {
    ensure_non_empty(value, field)?;
    if value.trim() != value {
        return Err(StoreError::InvalidInput(format!(
            "{field} has leading or trailing whitespace: '{value}'"
        )));
    }
    if let Some(ch) = unstorable_char(value) {
        return Err(StoreError::InvalidInput(format!(
            "{field} contains a character that cannot be stored: {ch:?}"
        )));
    }
    Ok(())
}

fn ensure_store_name(store: &str) -> StoreResult<()> {
    ensure_non_empty(store, "store")?;
    if store.contains(['/', '\\']) || store == "." || store == ".." {
        return Err(StoreError::InvalidInput(format!(
            "store name must be a bare file stem: {store}"
        )));
    }
    Ok(())
}

fn ensure_non_empty(value: &str, field: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r"<mailevents>
    <mail><day>10/05/2013</day><to>Lima</to><from>Quito</from><priority>1</priority></mail>
    <parcel><day>12/05/2013</day><to>Quito</to><from>Lima</from><weight>4</weight><volume>9</volume><priority>2</priority></parcel>
    <mail><day>not a day</day><to>Lima</to><from>Quito</from><priority>1</priority></mail>
    <mail><day>14/05/2013</day><to>Lima</to><priority>3</priority></mail>
    <mail><day>15/05/2013</day><to>Lima</to><from>Bogota</from><priority>high</priority></mail>
</mailevents>";

    fn store_with(contents: &str) -> (tempfile::TempDir, XmlStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("mailevents.xml"), contents).expect("write fixture");
        let store = XmlStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn load_fields_omits_tags_without_matches() {
        let (_dir, store) = store_with(EVENTS);
        let columns = store
            .load_fields("mailevents", &["weight", "colour", "to"])
            .expect("load fields");
        let tags: Vec<&str> = columns.iter().map(|column| column.tag.as_str()).collect();
        assert_eq!(tags, vec!["weight", "to"]);
        assert_eq!(columns[1].values.len(), 5);
    }

    #[test]
    fn conditional_load_applies_only_non_null_constraints() {
        let (_dir, store) = store_with(EVENTS);
        let filters = [
            FieldFilter::any("day"),
            FieldFilter::equals("to", "Lima"),
            FieldFilter::matching("from", Some("Quito")),
            FieldFilter::any("priority"),
        ];
        let records = store
            .load_records_conditional("mailevents", "mail", &filters)
            .expect("conditional load");
        let positions: Vec<usize> = records.iter().map(|record| record.position).collect();
        assert_eq!(positions, vec![0, 2]);
        assert_eq!(records[0].get("day"), Some("10/05/2013"));
    }

    #[test]
    fn conditional_load_reports_missing_fields_by_name() {
        let (_dir, store) = store_with(EVENTS);
        let filters = [
            FieldFilter::any("day"),
            FieldFilter::any("from"),
            FieldFilter::any("priority"),
        ];
        let records = store
            .load_records_conditional("mailevents", "mail", &filters)
            .expect("conditional load");
        assert_eq!(records.len(), 4);
        assert_eq!(records[2].fields.len(), 2);
        assert_eq!(records[2].missing(&["day", "from", "priority"]), vec!["from"]);
    }

    #[test]
    fn typed_load_skips_and_reports_bad_rows() {
        let (_dir, store) = store_with(EVENTS);
        let report = store.load_events("mailevents", None).expect("typed load");
        assert_eq!(report.events.len(), 2);
        assert!(report.events[1].is_parcel());

        let problems: Vec<(usize, &RecordProblem)> = report
            .skipped
            .iter()
            .map(|skipped| (skipped.position, &skipped.problem))
            .collect();
        assert_eq!(problems.len(), 3);
        assert!(matches!(problems[0], (2, RecordProblem::InvalidDay(_))));
        assert_eq!(
            problems[1],
            (3, &RecordProblem::MissingFields(vec!["from".to_string()]))
        );
        assert_eq!(
            problems[2],
            (4, &RecordProblem::InvalidPriority("high".to_string()))
        );
    }

    #[test]
    fn typed_load_can_be_restricted_to_one_kind() {
        let (_dir, store) = store_with(EVENTS);
        let report = store
            .load_events("mailevents", Some(RecordKind::Parcel))
            .expect("typed load");
        assert_eq!(report.events.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn missing_and_malformed_stores_are_distinct_errors() {
        let (_dir, store) = store_with("<mailevents><mail></mailevents>");
        assert!(matches!(
            store.load_field("mailevents", "day"),
            Err(StoreError::Malformed { .. })
        ));
        assert!(matches!(
            store.load_field("absent", "day"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn store_names_cannot_escape_the_data_dir() {
        let (_dir, store) = store_with(EVENTS);
        assert!(matches!(
            store.load_field("../mailevents", "day"),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn create_store_leaves_existing_documents_alone() {
        let (_dir, store) = store_with(EVENTS);
        assert!(!store.create_store("mailevents", "mailevents").expect("create"));
        assert_eq!(store.load_field("mailevents", "to").expect("load").len(), 5);
        assert!(store.create_store("countries", "countries").expect("create"));
        assert!(store.load_countries("countries").expect("load").is_empty());
    }

    #[test]
    fn append_rejects_parcels_without_dimensions() {
        let (_dir, store) = store_with(EVENTS);
        let day = Day::parse("01/01/2014").expect("day");
        let mut parcel = MailEvent::mail(day, "Lima", "Quito", 1);
        parcel.kind = RecordKind::Parcel;
        assert!(matches!(
            store.append_record("mailevents", &parcel),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn skipped_rows_keep_one_position_across_kinds() {
        let (_dir, store) = store_with(
            "<mailevents>\
             <mail><day>10/05/2013</day><to>Lima</to><from>Quito</from><priority>1</priority></mail>\
             <parcel><day>someday</day><to>Lima</to><from>Quito</from>\
             <weight>1</weight><volume>2</volume><priority>1</priority></parcel>\
             </mailevents>",
        );
        let typed = store.load_events("mailevents", None).expect("typed load");
        assert_eq!(typed.skipped[0].position, 1);

        let filters: Vec<FieldFilter> = RecordKind::Parcel
            .fields()
            .iter()
            .map(|tag| FieldFilter::any(*tag))
            .collect();
        let raw = store
            .load_records_conditional("mailevents", "parcel", &filters)
            .expect("conditional load");
        let conditional = LoadReport::from_records(raw);
        assert_eq!(conditional.skipped, typed.skipped);
    }

    #[test]
    fn append_rejects_values_that_would_not_reload() {
        let (_dir, store) = store_with(EVENTS);
        let day = Day::parse("01/01/2014").expect("day");
        for event in [
            MailEvent::mail(day, "Li\u{1}ma", "Quito", 1),
            MailEvent::mail(day, " Lima", "Quito ", 1),
            MailEvent::mail(day, "", "Quito", 1),
            MailEvent::parcel(day, "Lima", "Quito", "2\r", "3", 1),
        ] {
            assert!(matches!(
                store.append_record("mailevents", &event),
                Err(StoreError::InvalidInput(_))
            ));
        }
        assert_eq!(store.load_field("mailevents", "to").expect("store still loads").len(), 5);
    }
}
