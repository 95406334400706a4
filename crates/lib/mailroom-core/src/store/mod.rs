//! XML store adapter.
//!
//! Each store is one XML document that is loaded whole on every read and
//! rewritten whole on every append.

pub mod document;
pub mod xml;

pub use document::{XmlElement, XmlNode, unstorable_char};
pub use xml::{
    FieldFilter,
    LoadReport,
    RawRecord,
    RecordError,
    RecordProblem,
    StoreError,
    StoreResult,
    TagColumn,
    XmlStore,
    event_from_record,
};
