//! Per-record transformation state.
//!
//! A [`RecordContext`] is created for each record, before dispatch, from the
//! record's fixed-position fields. It is never shared between records; the
//! only process-wide state it reaches is the read-only
//! [`ReferenceData`](crate::reference::ReferenceData).

use crate::Dialect;
use crate::document::Reference;
use crate::provision::DateCandidate;
use crate::record::RawRecord;
use crate::reference::ReferenceData;
use crate::registry::{EntityKind, EntityRegistry, entity_hash};
use crate::script::AlternateGraphic;
use std::collections::HashMap;
use tracing::warn;

/// Placeholder id for records without a 001 field.
pub const UNKNOWN_BIB_ID: &str = "???";

/// Language code used when 008 gives none.
pub const UNDETERMINED_LANGUAGE: &str = "und";

static EMPTY_RECORD: RawRecord = RawRecord {
    leader: None,
    fields: Vec::new(),
};

/// Mutable scratch state shared by the handlers of one record.
pub struct RecordContext<'a> {
    pub dialect: Dialect,
    pub record: &'a RawRecord,
    pub reference: &'a ReferenceData,
    pub registry: &'a dyn EntityRegistry,
    pub bib_id: String,
    /// 008 with trailing blanks removed
    pub field_008: String,
    pub date_type: Option<char>,
    pub date1: Option<String>,
    pub date2: Option<String>,
    pub lang_008: String,
    /// 041$a values, record order, de-duplicated
    pub languages_a: Vec<String>,
    /// 041$h values, record order, de-duplicated
    pub languages_h: Vec<String>,
    pub country: Option<String>,
    pub cantons: Vec<String>,
    pub alternate_graphic: AlternateGraphic,
    pub(crate) date_candidates: Vec<DateCandidate>,
    entities: HashMap<String, Reference>,
}

impl<'a> RecordContext<'a> {
    /// Builds the context of a MARC record. Never fails: missing or short
    /// fixed fields degrade to defaults.
    pub fn new(
        dialect: Dialect,
        record: &'a RawRecord,
        reference: &'a ReferenceData,
        registry: &'a dyn EntityRegistry,
    ) -> Self {
        let bib_id = record
            .control("001")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(UNKNOWN_BIB_ID)
            .to_string();

        let field_008 = record
            .control("008")
            .map(|data| data.trim_end().to_string())
            .unwrap_or_default();

        let date_type = field_008.chars().nth(6);
        let date1 = char_slice(&field_008, 7, 11);
        let date2 = char_slice(&field_008, 11, 15);
        let lang_008 = char_slice(&field_008, 35, 38)
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or_else(|| {
                if !field_008.is_empty() {
                    warn!(bib_id = %bib_id, "no language in 008, set to 'und'");
                }
                UNDETERMINED_LANGUAGE.to_string()
            });

        let languages_a = collect_unique(record, "041", 'a');
        let languages_h = collect_unique(record, "041", 'h');

        let (country, cantons) = init_country(record, &bib_id, &field_008);

        let alternate_graphic = AlternateGraphic::build(record, &bib_id, &lang_008, &languages_a);

        Self {
            dialect,
            record,
            reference,
            registry,
            bib_id,
            field_008,
            date_type,
            date1,
            date2,
            lang_008,
            languages_a,
            languages_h,
            country,
            cantons,
            alternate_graphic,
            date_candidates: Vec::new(),
            entities: HashMap::new(),
        }
    }

    /// Builds the context of a non-MARC record.
    pub fn detached(
        dialect: Dialect,
        bib_id: Option<&str>,
        reference: &'a ReferenceData,
        registry: &'a dyn EntityRegistry,
    ) -> Self {
        let mut ctx = Self::new(dialect, &EMPTY_RECORD, reference, registry);
        if let Some(id) = bib_id.map(str::trim).filter(|id| !id.is_empty()) {
            ctx.bib_id = id.to_string();
        }
        ctx
    }

    /// Reference of a subdivision or collection, resolved at most once per
    /// record for a given content hash.
    pub fn entity(&mut self, kind: EntityKind, organisation: &str, name: &str) -> Reference {
        let hash = entity_hash(kind, organisation, name);
        if let Some(reference) = self.entities.get(&hash) {
            return reference.clone();
        }
        let reference = self.registry.resolve(kind, organisation, name, &hash);
        self.entities.insert(hash, reference.clone());
        reference
    }
}

/// Character-based slice, `None` when the text is too short.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> Option<String> {
    let slice: String = text.chars().skip(start).take(end - start).collect();
    (slice.chars().count() == end - start).then_some(slice)
}

fn collect_unique(record: &RawRecord, tag: &str, code: char) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for field in record.fields_by_tag(tag) {
        for value in field.get_all(code) {
            let value = value.trim();
            if !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
    }
    values
}

/// Country and cantons from 044$c (`sz-be`), else 008/15-17.
fn init_country(record: &RawRecord, bib_id: &str, field_008: &str) -> (Option<String>, Vec<String>) {
    if let Some(field_044) = record.fields_by_tag("044").next() {
        let mut cantons = Vec::new();
        for code in field_044.get_all('c') {
            match code.split_once('-') {
                Some((_, canton)) if !canton.trim().is_empty() => {
                    cantons.push(canton.trim().to_string())
                }
                _ => warn!(bib_id, code, "unable to read canton"),
            }
        }
        let country = (!cantons.is_empty()).then(|| "sz".to_string());
        return (country, cantons);
    }

    let country = field_008
        .chars()
        .skip(15)
        .take(3)
        .collect::<String>()
        .trim()
        .to_string();
    ((!country.is_empty()).then_some(country), Vec::new())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::Field;
    use crate::registry::LinkRegistry;
    use pretty_assertions::assert_eq;
    use std::sync::LazyLock;

    pub(crate) static TEST_REFERENCE: LazyLock<ReferenceData> =
        LazyLock::new(|| ReferenceData::load(&Default::default()).unwrap());

    pub(crate) static TEST_REGISTRY: LazyLock<LinkRegistry> = LazyLock::new(LinkRegistry::default);

    pub(crate) fn context_for(record: &RawRecord) -> RecordContext<'_> {
        RecordContext::new(Dialect::Marc21, record, &TEST_REFERENCE, &*TEST_REGISTRY)
    }

    #[test]
    fn test_context_from_fixed_fields() {
        let record = RawRecord::new()
            .with_field(Field::control("001", "R008945501"))
            .with_field(Field::control(
                "008",
                "060716q19902000sz ||| |  ||||00|  |fre|d",
            ))
            .with_field(
                Field::data("041", '1', ' ')
                    .with_subfield('a', "fre")
                    .with_subfield('a', "ger")
                    .with_subfield('h', "eng"),
            )
            .with_field(Field::data("041", ' ', ' ').with_subfield('a', "fre"));

        let ctx = context_for(&record);
        assert_eq!(ctx.bib_id, "R008945501");
        assert_eq!(ctx.date_type, Some('q'));
        assert_eq!(ctx.date1.as_deref(), Some("1990"));
        assert_eq!(ctx.date2.as_deref(), Some("2000"));
        assert_eq!(ctx.lang_008, "fre");
        assert_eq!(ctx.languages_a, vec!["fre", "ger"]);
        assert_eq!(ctx.languages_h, vec!["eng"]);
        assert_eq!(ctx.country.as_deref(), Some("sz"));
        assert!(ctx.cantons.is_empty());
    }

    #[test]
    fn test_context_defaults() {
        let record = RawRecord::new();
        let ctx = context_for(&record);
        assert_eq!(ctx.bib_id, UNKNOWN_BIB_ID);
        assert_eq!(ctx.lang_008, UNDETERMINED_LANGUAGE);
        assert_eq!(ctx.date1, None);
        assert_eq!(ctx.date_type, None);
        assert_eq!(ctx.country, None);
        assert!(ctx.alternate_graphic.is_empty());
    }

    #[test]
    fn test_short_008() {
        let record = RawRecord::new().with_field(Field::control("008", "060716s1990"));
        let ctx = context_for(&record);
        assert_eq!(ctx.date1.as_deref(), Some("1990"));
        assert_eq!(ctx.date2, None);
        assert_eq!(ctx.lang_008, UNDETERMINED_LANGUAGE);
    }

    #[test]
    fn test_cantons() {
        let record = RawRecord::new()
            .with_field(Field::control("008", "060716s1990    xx "))
            .with_field(
                Field::data("044", ' ', ' ')
                    .with_subfield('c', "sz-be")
                    .with_subfield('c', "sz-vd")
                    .with_subfield('c', "broken"),
            );
        let ctx = context_for(&record);
        assert_eq!(ctx.cantons, vec!["be", "vd"]);
        assert_eq!(ctx.country.as_deref(), Some("sz"));
    }

    #[test]
    fn test_entity_cache() {
        let record = RawRecord::new();
        let mut ctx = context_for(&record);
        let first = ctx.entity(EntityKind::Collection, "test-org", "Collection 1");
        let again = ctx.entity(EntityKind::Collection, "test-org", "collection 1");
        let other = ctx.entity(EntityKind::Collection, "test-org", "Collection 2");
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(ctx.entities.len(), 2);
    }

    #[test]
    fn test_detached_context() {
        let ctx = RecordContext::detached(
            Dialect::Crossref,
            Some("10.1000/xyz"),
            &TEST_REFERENCE,
            &*TEST_REGISTRY,
        );
        assert_eq!(ctx.bib_id, "10.1000/xyz");
        assert_eq!(ctx.lang_008, UNDETERMINED_LANGUAGE);
    }
}
