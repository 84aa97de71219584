//! Source dialects and their transformers.
//!
//! MARC-like dialects are a static [`RuleSet`] plus an optional
//! post-processing hook. Tree dialects (OAI-PMH XML handed over as JSON,
//! citation API responses) map the whole tree in one function.
//!
//! # Design Decision
//!
//! ## One Pipeline for Every MARC Dialect
//! 1. build a fresh [`RecordContext`] from the record
//! 2. dispatch every field through the dialect's rule set
//! 3. apply the deferred start date candidates by tier
//! 4. run the dialect's post-processing hook
//!
//! Rule sets are compiled once in `LazyLock` statics and shared by every
//! transformer of the dialect.

mod citation;
mod common;
pub mod tree;

pub mod arodes;
pub mod crossref;
pub mod dublin_core;
pub mod marc21;
pub mod medline;
pub mod openaire;
pub mod rerodoc;
pub mod sru;
pub mod unige;
pub mod zora;

use crate::context::RecordContext;
use crate::document::Document;
use crate::engine::RuleSet;
use crate::error::{RecordError, TransformError, ValueError};
use crate::provision::apply_start_dates;
use crate::reference::ReferenceData;
use crate::registry::EntityRegistry;
use crate::{Dialect, RecordTransformer, Result, SourceRecord};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Post-processing run once every field has been dispatched.
pub(crate) type FinishHook =
    fn(&mut Document, &mut RecordContext<'_>) -> std::result::Result<(), ValueError>;

/// Bibliographic id of a tree record, used in diagnostics.
pub(crate) type TreeId = fn(&Value) -> Option<String>;

/// Maps a whole tree record.
pub(crate) type TreeMapper =
    fn(&Value, &mut RecordContext<'_>) -> std::result::Result<Document, ValueError>;

/// Rule set of a MARC-like dialect, `None` for tree dialects.
pub fn rules(dialect: Dialect) -> Option<&'static RuleSet> {
    match dialect {
        Dialect::Marc21 => Some(&*marc21::RULES),
        Dialect::Sru => Some(&*sru::RULES),
        Dialect::ReroDoc => Some(&*rerodoc::RULES),
        Dialect::Arodes => Some(&*arodes::RULES),
        Dialect::Zora => Some(&*zora::RULES),
        Dialect::Unige => Some(&*unige::RULES),
        Dialect::DublinCore | Dialect::OpenAire | Dialect::Crossref | Dialect::Medline => None,
    }
}

/// Builds the transformer of a dialect.
pub(crate) fn transformer(
    dialect: Dialect,
    reference: Arc<ReferenceData>,
    registry: Arc<dyn EntityRegistry>,
) -> Box<dyn RecordTransformer> {
    let finish: Option<FinishHook> = match dialect {
        Dialect::ReroDoc => Some(rerodoc::finish),
        Dialect::Arodes | Dialect::Zora => Some(common::host_year_from_start_date),
        _ => None,
    };

    if let Some(rules) = rules(dialect) {
        return Box::new(MarcTransformer {
            rules,
            finish,
            reference,
            registry,
        });
    }

    let (id, map): (TreeId, TreeMapper) = match dialect {
        Dialect::DublinCore => (dublin_core::record_id, dublin_core::map),
        Dialect::OpenAire => (openaire::record_id, openaire::map),
        Dialect::Crossref => (crossref::record_id, crossref::map),
        _ => (medline::record_id, medline::map),
    };
    Box::new(TreeTransformer {
        dialect,
        id,
        map,
        reference,
        registry,
    })
}

/// Transformer of a MARC-like dialect.
pub(crate) struct MarcTransformer {
    rules: &'static RuleSet,
    finish: Option<FinishHook>,
    reference: Arc<ReferenceData>,
    registry: Arc<dyn EntityRegistry>,
}

impl RecordTransformer for MarcTransformer {
    fn dialect(&self) -> Dialect {
        self.rules.dialect()
    }

    fn transform(&self, record: &SourceRecord) -> Result<Document> {
        let dialect = self.dialect();
        let SourceRecord::Marc(record) = record else {
            return Err(TransformError::UnexpectedInput {
                dialect,
                expected: "MARC records",
            });
        };

        let mut ctx = RecordContext::new(dialect, record, &self.reference, self.registry.as_ref());
        let mut doc = Document::new();

        self.rules
            .dispatch(&mut doc, &mut ctx, &record.dispatch_fields())?;
        apply_start_dates(&mut doc, &mut ctx);

        if let Some(finish) = self.finish {
            finish(&mut doc, &mut ctx).map_err(|err| {
                RecordError::without_field(dialect, ctx.bib_id.clone(), err)
            })?;
        }

        debug!(dialect = %dialect, bib_id = %ctx.bib_id, "record transformed");
        Ok(doc)
    }
}

/// Transformer of a dialect delivered as a JSON tree.
pub(crate) struct TreeTransformer {
    dialect: Dialect,
    id: TreeId,
    map: TreeMapper,
    reference: Arc<ReferenceData>,
    registry: Arc<dyn EntityRegistry>,
}

impl RecordTransformer for TreeTransformer {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn transform(&self, record: &SourceRecord) -> Result<Document> {
        let SourceRecord::Json(value) = record else {
            return Err(TransformError::UnexpectedInput {
                dialect: self.dialect,
                expected: "JSON trees",
            });
        };

        let id = (self.id)(value);
        let mut ctx = RecordContext::detached(
            self.dialect,
            id.as_deref(),
            &self.reference,
            self.registry.as_ref(),
        );
        let mut doc = (self.map)(value, &mut ctx).map_err(|err| {
            RecordError::without_field(self.dialect, ctx.bib_id.clone(), err)
        })?;
        apply_start_dates(&mut doc, &mut ctx);

        debug!(dialect = %self.dialect, bib_id = %ctx.bib_id, "record transformed");
        Ok(doc)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::{Field, RawRecord};
    use crate::registry::LinkRegistry;
    use pretty_assertions::assert_eq;

    /// Transforms a MARC record with the embedded reference tables.
    pub(crate) fn transform_marc(dialect: Dialect, record: RawRecord) -> Result<Document> {
        transformer(
            dialect,
            ReferenceData::global().unwrap(),
            Arc::new(LinkRegistry::default()),
        )
        .transform(&SourceRecord::Marc(record))
    }

    /// Transforms a JSON tree with the embedded reference tables.
    pub(crate) fn transform_tree(dialect: Dialect, value: Value) -> Result<Document> {
        transformer(
            dialect,
            ReferenceData::global().unwrap(),
            Arc::new(LinkRegistry::default()),
        )
        .transform(&SourceRecord::Json(value))
    }

    #[test]
    fn test_every_marc_dialect_has_rules() {
        for dialect in Dialect::ALL {
            assert_eq!(rules(dialect).is_some(), dialect.is_marc(), "{}", dialect);
            if let Some(rules) = rules(dialect) {
                assert_eq!(rules.dialect(), dialect);
                assert!(!rules.is_empty());
            }
        }
    }

    #[test]
    fn test_tree_dialect_rejects_marc() {
        let result = transformer(
            Dialect::Crossref,
            ReferenceData::global().unwrap(),
            Arc::new(LinkRegistry::default()),
        )
        .transform(&SourceRecord::Marc(RawRecord::new()));
        assert!(matches!(
            result,
            Err(TransformError::UnexpectedInput {
                dialect: Dialect::Crossref,
                ..
            })
        ));
    }

    #[test]
    fn test_idempotence() {
        let record = RawRecord::new()
            .with_field(Field::control("001", "R008945501"))
            .with_field(Field::control(
                "008",
                "060716s1990    sz ||| |  ||||00|  |fre|d",
            ))
            .with_field(Field::data("020", ' ', ' ').with_subfield('a', "978-3-1 (paperback)"))
            .with_field(
                Field::data("245", '1', '0')
                    .with_subfield('a', "Histoire de la Suisse :")
                    .with_subfield('b', "des origines"),
            )
            .with_field(
                Field::data("264", ' ', '1')
                    .with_subfield('a', "Lausanne :")
                    .with_subfield('b', "Payot,")
                    .with_subfield('c', "2001"),
            )
            .with_field(
                Field::data("700", '1', ' ')
                    .with_subfield('a', "Muller, Anne")
                    .with_subfield('4', "edt"),
            );

        for dialect in [Dialect::Marc21, Dialect::Sru] {
            let first = transform_marc(dialect, record.clone())
                .unwrap()
                .to_json_string()
                .unwrap();
            let second = transform_marc(dialect, record.clone())
                .unwrap()
                .to_json_string()
                .unwrap();
            assert_eq!(first, second);
        }
    }
}
