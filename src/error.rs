//! Error types for record transformation.
//!
//! Errors are split by blast radius: [`ValueError`] is raised by a single
//! handler and aborts the current record once the engine has wrapped it into
//! a [`RecordError`] carrying the field key and bibliographic id.
//! [`ReferenceDataError`] is raised while loading lookup tables and is the
//! only error that should stop a whole batch.

use crate::Dialect;
use thiserror::Error;

/// Canonical document keys used for consistent error reporting.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const LANGUAGE: &str = "language";
    pub const IDENTIFIED_BY: &str = "identifiedBy";
    pub const DOCUMENT_TYPE: &str = "documentType";
    pub const SUBJECTS: &str = "subjects";
    pub const CONTRIBUTION: &str = "contribution";
    pub const PROVISION_ACTIVITY: &str = "provisionActivity";
    pub const PART_OF: &str = "partOf";
    pub const ABSTRACTS: &str = "abstracts";
    pub const FILES: &str = "files";
    pub const NOTES: &str = "notes";
    pub const SERIES: &str = "series";
    pub const CLASSIFICATION: &str = "classification";
    pub const EDITION_STATEMENT: &str = "editionStatement";
    pub const DISSERTATION: &str = "dissertation";
    pub const OTHER_EDITION: &str = "otherEdition";
    pub const COLLECTIONS: &str = "collections";
    pub const SUBDIVISIONS: &str = "subdivisions";
    pub const ORGANISATION: &str = "organisation";
    pub const METADATA: &str = "metadata";
}

/// Top-level error type for transformation operations.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("No schema defined for key \"{0}\"")]
    UnknownSchema(String),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Reference(#[from] ReferenceDataError),

    #[error("{dialect} records must be given as {expected}")]
    UnexpectedInput {
        dialect: Dialect,
        expected: &'static str,
    },

    #[cfg(feature = "xml")]
    #[error("Malformed XML input: {0}")]
    Xml(String),
}

/// Record-fatal error with enough context to log an actionable diagnostic.
#[derive(Error, Debug)]
#[error("Error in {dialect} record {bib_id}{}: {error}",
    match key {
        Some(k) => format!(" at field {}", k),
        None => String::new(),
    }
)]
pub struct RecordError {
    /// Bibliographic id of the record, `???` when the record has none
    pub bib_id: String,
    /// Dispatch key of the offending field (tag and indicators)
    pub key: Option<String>,
    /// Dialect whose rule set was running
    pub dialect: Dialect,
    /// The specific error raised by the handler
    pub error: ValueError,
}

impl RecordError {
    /// Create a new RecordError.
    pub fn new(
        dialect: Dialect,
        bib_id: impl Into<String>,
        key: Option<String>,
        error: ValueError,
    ) -> Self {
        Self {
            bib_id: bib_id.into(),
            key,
            dialect,
            error,
        }
    }

    /// Create a RecordError attached to a field key.
    pub fn at_field(
        dialect: Dialect,
        bib_id: impl Into<String>,
        key: impl Into<String>,
        error: ValueError,
    ) -> Self {
        Self::new(dialect, bib_id, Some(key.into()), error)
    }

    /// Create a RecordError not tied to a single field.
    pub fn without_field(dialect: Dialect, bib_id: impl Into<String>, error: ValueError) -> Self {
        Self::new(dialect, bib_id, None, error)
    }
}

/// Value-level errors raised by handlers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("No role found{}", match label {
        Some(l) => format!(" for \"{}\"", l),
        None => String::new(),
    })]
    NoRole {
        field: &'static str,
        label: Option<String>,
    },

    #[error("Bad date for {field}: \"{value}\"")]
    BadDate { field: &'static str, value: String },

    #[error("Missing value for {field}")]
    MissingValue { field: &'static str },

    #[error("Bad value for {field}: \"{value}\" ({reason})")]
    BadValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors raised while loading reference tables.
#[derive(Error, Debug)]
pub enum ReferenceDataError {
    #[error("Unable to read {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("The {table} table is empty")]
    EmptyTable { table: &'static str },

    #[error("Bad row {row} in {table} table: {reason}")]
    BadRow {
        table: &'static str,
        row: usize,
        reason: String,
    },
}

impl ReferenceDataError {
    pub(crate) fn csv(table: &'static str, source: csv::Error) -> Self {
        Self::Csv { table, source }
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::Error> for TransformError {
    fn from(err: quick_xml::Error) -> Self {
        TransformError::Xml(err.to_string())
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::events::attributes::AttrError> for TransformError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        TransformError::Xml(err.to_string())
    }
}
