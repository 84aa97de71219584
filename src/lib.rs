//! A rule-driven engine normalizing bibliographic records into one canonical document.
//!
//! `bibnorm` ingests records harvested from heterogeneous sources and maps
//! them onto a single [`Document`] model. Every source format is a
//! [`Dialect`] with its own ordered rule table.
//!
//! # Features
//!
//! The library has several optional features that can be enabled in your Cargo.toml:
//!
//! - `xml` - MARCXML and generic XML input adapters (enabled by default)
//! - `parallel` - Parallel batch transformation with rayon (enabled by default)
//! - `regex` - Full regex engine (enabled by default)
//! - `lite` - Use `regex-lite` instead of `regex`
//!
//! # Supported Sources
//!
//! - **MARC**: generic MARC 21 (`marc21`), the swisscovery union catalogue
//!   (`sru`), RERO DOC (`rerodoc`), AR.ODES (`arodes`), ZORA (`zora`) and
//!   Archive ouverte UNIGE (`unige`)
//! - **OAI-PMH**: Dublin Core (`dc`) and OpenAIRE/datacite (`openaire`),
//!   handed over as JSON trees
//! - **Citation APIs**: Crossref (`crossref`) and Medline (`medline`)
//!
//! # Basic Usage
//!
//! ```rust
//! use bibnorm::record::{Field, RawRecord};
//! use bibnorm::{SourceRecord, create};
//!
//! let record = RawRecord::new()
//!     .with_field(Field::control("001", "R004567655"))
//!     .with_field(
//!         Field::data("260", ' ', ' ')
//!             .with_subfield('a', "Lausanne :")
//!             .with_subfield('b', "Imprint,")
//!             .with_subfield('c', "1798-1799"),
//!     );
//!
//! let transformer = create("rerodoc").unwrap();
//! let document = transformer.transform(&SourceRecord::Marc(record)).unwrap();
//! let publication = document.publication().unwrap();
//! assert_eq!(publication.start_date.as_deref(), Some("1798"));
//! assert_eq!(publication.end_date.as_deref(), Some("1799"));
//! ```
//!
//! # Error Handling
//!
//! Transformation errors are record-scoped: a [`RecordError`](error::RecordError)
//! names the dialect, the bibliographic id and the offending field, and the
//! batch carries on with the next record.
//!
//! ```rust
//! use bibnorm::{TransformError, create};
//!
//! match create("unknown") {
//!     Err(TransformError::UnknownSchema(key)) => assert_eq!(key, "unknown"),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Thread Safety
//!
//! Transformers are stateless and can be shared between threads. Each record
//! gets its own [`RecordContext`](context::RecordContext); the only shared
//! state is the read-only [`ReferenceData`](reference::ReferenceData).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod context;
pub mod contribution;
pub mod dialects;
pub mod document;
pub mod engine;
pub mod error;
pub mod identifier;
pub mod provision;
pub mod record;
pub mod reference;
pub mod registry;
pub mod script;
#[cfg(feature = "xml")]
pub mod xml;

// Reexports
pub use document::{DocKey, Document, Entry};
pub use engine::{Handler, RuleSet};
pub use error::{RecordError, ReferenceDataError, TransformError, ValueError};
pub use record::{Field, RawRecord, Subfield};
pub use reference::ReferenceData;
pub use registry::{EntityRegistry, LinkRegistry};

mod regex;
mod utils;

/// Result type of transformation operations.
pub type Result<T> = std::result::Result<T, TransformError>;

/// Source formats supported by the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Marc21,
    Sru,
    ReroDoc,
    Arodes,
    Zora,
    Unige,
    DublinCore,
    OpenAire,
    Crossref,
    Medline,
}

impl Dialect {
    /// Every dialect, in factory key order.
    pub const ALL: [Dialect; 10] = [
        Dialect::Marc21,
        Dialect::Sru,
        Dialect::ReroDoc,
        Dialect::Arodes,
        Dialect::Zora,
        Dialect::Unige,
        Dialect::DublinCore,
        Dialect::OpenAire,
        Dialect::Crossref,
        Dialect::Medline,
    ];

    /// Factory key of the dialect.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Marc21 => "marc21",
            Dialect::Sru => "sru",
            Dialect::ReroDoc => "rerodoc",
            Dialect::Arodes => "arodes",
            Dialect::Zora => "zora",
            Dialect::Unige => "unige",
            Dialect::DublinCore => "dc",
            Dialect::OpenAire => "openaire",
            Dialect::Crossref => "crossref",
            Dialect::Medline => "medline",
        }
    }

    /// Whether records of this dialect are given as [`SourceRecord::Marc`].
    pub fn is_marc(&self) -> bool {
        matches!(
            self,
            Dialect::Marc21
                | Dialect::Sru
                | Dialect::ReroDoc
                | Dialect::Arodes
                | Dialect::Zora
                | Dialect::Unige
        )
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = TransformError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim();
        Dialect::ALL
            .into_iter()
            .find(|dialect| dialect.as_str() == key)
            .ok_or_else(|| TransformError::UnknownSchema(key.to_string()))
    }
}

/// A harvested record handed to a transformer.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    /// MARC-like record (tagged fields and subfields)
    Marc(RawRecord),
    /// JSON tree (API responses, or XML in the `@attr` / `#text` convention)
    Json(serde_json::Value),
}

/// Maps one source record onto the canonical document.
///
/// Implementations are stateless: all per-record state lives in a
/// [`RecordContext`](context::RecordContext) built inside `transform`.
pub trait RecordTransformer: Send + Sync {
    /// Dialect this transformer implements.
    fn dialect(&self) -> Dialect;

    /// Transform a single record.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError::Record`] when a handler rejects the record,
    /// or [`TransformError::UnexpectedInput`] when the record shape does not
    /// fit the dialect.
    fn transform(&self, record: &SourceRecord) -> Result<Document>;
}

/// Returns the transformer registered for a dialect key, using the embedded
/// reference tables and a [`LinkRegistry`].
///
/// # Errors
///
/// Returns [`TransformError::UnknownSchema`] for unknown keys and
/// [`TransformError::Reference`] when the reference tables cannot be loaded.
///
/// # Examples
///
/// ```
/// use bibnorm::{Dialect, create};
///
/// let transformer = create("sru").unwrap();
/// assert_eq!(transformer.dialect(), Dialect::Sru);
/// ```
pub fn create(key: &str) -> Result<Box<dyn RecordTransformer>> {
    let dialect = key.parse::<Dialect>()?;
    let reference = ReferenceData::global()?;
    Ok(dialects::transformer(
        dialect,
        reference,
        Arc::new(LinkRegistry::default()),
    ))
}

/// Like [`create`], with explicit reference tables and entity registry.
pub fn create_with(
    key: &str,
    reference: Arc<ReferenceData>,
    registry: Arc<dyn EntityRegistry>,
) -> Result<Box<dyn RecordTransformer>> {
    let dialect = key.parse::<Dialect>()?;
    Ok(dialects::transformer(dialect, reference, registry))
}

/// Transforms many records, in parallel when the `parallel` feature is
/// enabled. Results keep the input order; one failing record never stops
/// the others.
pub fn transform_batch(
    transformer: &dyn RecordTransformer,
    records: &[SourceRecord],
) -> Vec<Result<Document>> {
    #[cfg(feature = "parallel")]
    {
        records
            .par_iter()
            .map(|record| transformer.transform(record))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        records
            .iter()
            .map(|record| transformer.transform(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Field;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("marc21", Dialect::Marc21)]
    #[case("sru", Dialect::Sru)]
    #[case("rerodoc", Dialect::ReroDoc)]
    #[case("arodes", Dialect::Arodes)]
    #[case("zora", Dialect::Zora)]
    #[case("unige", Dialect::Unige)]
    #[case("dc", Dialect::DublinCore)]
    #[case("openaire", Dialect::OpenAire)]
    #[case("crossref", Dialect::Crossref)]
    #[case("medline", Dialect::Medline)]
    fn test_create_known_keys(#[case] key: &str, #[case] expected: Dialect) {
        let transformer = create(key).unwrap();
        assert_eq!(transformer.dialect(), expected);
        assert_eq!(expected.to_string(), key);
    }

    #[test]
    fn test_create_unknown_key() {
        let result = create("bibtex");
        assert!(matches!(result, Err(TransformError::UnknownSchema(key)) if key == "bibtex"));
    }

    #[test]
    fn test_unexpected_input() {
        let transformer = create("rerodoc").unwrap();
        let result = transformer.transform(&SourceRecord::Json(serde_json::json!({})));
        assert!(matches!(
            result,
            Err(TransformError::UnexpectedInput {
                dialect: Dialect::ReroDoc,
                ..
            })
        ));
    }

    #[test]
    fn test_transform_batch_keeps_order_and_isolates_failures() {
        let transformer = create("rerodoc").unwrap();
        let records = vec![
            SourceRecord::Marc(
                RawRecord::new()
                    .with_field(Field::control("001", "1"))
                    .with_field(Field::data("500", ' ', ' ').with_subfield('a', "first")),
            ),
            SourceRecord::Marc(
                RawRecord::new()
                    .with_field(Field::control("001", "2"))
                    .with_field(Field::data("700", ' ', ' ').with_subfield('a', "Doe, John")),
            ),
            SourceRecord::Marc(
                RawRecord::new()
                    .with_field(Field::control("001", "3"))
                    .with_field(Field::data("500", ' ', ' ').with_subfield('a', "third")),
            ),
        ];

        let results = transform_batch(transformer.as_ref(), &records);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().notes, vec!["first"]);
        assert!(matches!(&results[1], Err(TransformError::Record(err)) if err.bib_id == "2"));
        assert_eq!(results[2].as_ref().unwrap().notes, vec!["third"]);
    }
}
