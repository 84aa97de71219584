//! Field dispatch engine.
//!
//! A [`RuleSet`] is an ordered table of `(pattern, key, handler)` rules.
//! Fields are grouped by dispatch key (tag and indicators) in first-seen
//! order, then every rule whose pattern matches the key runs in
//! registration order:
//!
//! - [`Handler::Each`] is called once per field occurrence
//! - [`Handler::Single`] receives every occurrence of the key at once and
//!   decides itself which one wins
//!
//! Handler results are folded with [`Document::merge`]. A handler may also
//! write to the document directly and return `Ok(None)`.

use crate::Dialect;
use crate::context::RecordContext;
use crate::document::{DocKey, Document, Entry};
use crate::error::{RecordError, ValueError};
use crate::record::Field;
use crate::regex::Regex;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Result of a single handler call.
pub type HandlerResult = Result<Option<Entry>, ValueError>;

/// Handler called once per field occurrence.
pub type EachHandler = fn(&mut Document, &Field, &mut RecordContext<'_>) -> HandlerResult;

/// Handler called once with every occurrence of a dispatch key.
pub type SingleHandler = fn(&mut Document, &[&Field], &mut RecordContext<'_>) -> HandlerResult;

/// Cardinality of a rule.
#[derive(Clone, Copy)]
pub enum Handler {
    Each(EachHandler),
    Single(SingleHandler),
}

/// Pattern matched against a full dispatch key (`260__`, `0247_`, `001`,
/// `leader`). Patterns are anchored at both ends.
#[derive(Debug, Clone)]
pub struct TagPattern {
    source: &'static str,
    regex: Regex,
}

impl TagPattern {
    pub fn new(source: &'static str) -> Result<Self, crate::regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", source))?;
        Ok(Self { source, regex })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &'static str {
        self.source
    }
}

/// One entry of a rule set.
#[derive(Clone)]
pub struct Rule {
    pub pattern: TagPattern,
    pub key: DocKey,
    pub handler: Handler,
}

/// Collects rules before their patterns are compiled.
pub struct RuleSetBuilder {
    dialect: Dialect,
    rules: Vec<(&'static str, DocKey, Handler)>,
}

impl RuleSetBuilder {
    /// Adds a per-occurrence rule.
    #[must_use]
    pub fn each(mut self, pattern: &'static str, key: DocKey, handler: EachHandler) -> Self {
        self.rules.push((pattern, key, Handler::Each(handler)));
        self
    }

    /// Adds a rule receiving every occurrence of a key at once.
    #[must_use]
    pub fn single(mut self, pattern: &'static str, key: DocKey, handler: SingleHandler) -> Self {
        self.rules.push((pattern, key, Handler::Single(handler)));
        self
    }

    pub fn build(self) -> Result<RuleSet, crate::regex::Error> {
        let rules = self
            .rules
            .into_iter()
            .map(|(pattern, key, handler)| {
                Ok(Rule {
                    pattern: TagPattern::new(pattern)?,
                    key,
                    handler,
                })
            })
            .collect::<Result<Vec<_>, crate::regex::Error>>()?;
        Ok(RuleSet {
            dialect: self.dialect,
            rules,
        })
    }
}

/// Ordered, stateless rule table of a dialect.
#[derive(Clone)]
pub struct RuleSet {
    dialect: Dialect,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn builder(dialect: Dialect) -> RuleSetBuilder {
        RuleSetBuilder {
            dialect,
            rules: Vec::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule claims the dispatch key.
    pub fn handles(&self, key: &str) -> bool {
        self.rules.iter().any(|rule| rule.pattern.matches(key))
    }

    /// Runs every matching rule over `fields` and merges the results into
    /// `doc`. The first handler error aborts the record.
    pub fn dispatch(
        &self,
        doc: &mut Document,
        ctx: &mut RecordContext<'_>,
        fields: &[Field],
    ) -> Result<(), RecordError> {
        for (key, group) in group_by_key(fields) {
            let mut matched = false;
            for rule in self.rules.iter().filter(|rule| rule.pattern.matches(&key)) {
                matched = true;
                let result = match rule.handler {
                    Handler::Each(handler) => {
                        let mut entries = Vec::with_capacity(group.len());
                        for field in &group {
                            entries.push(handler(doc, field, ctx).map_err(|err| {
                                RecordError::at_field(self.dialect, ctx.bib_id.clone(), &key, err)
                            })?);
                        }
                        entries
                    }
                    Handler::Single(handler) => vec![handler(doc, &group, ctx).map_err(|err| {
                        RecordError::at_field(self.dialect, ctx.bib_id.clone(), &key, err)
                    })?],
                };

                for entry in result.into_iter().flatten() {
                    if entry.key() != rule.key {
                        warn!(
                            bib_id = %ctx.bib_id,
                            key = %key,
                            expected = %rule.key,
                            found = %entry.key(),
                            "handler result ignored, key mismatch"
                        );
                        continue;
                    }
                    doc.merge(entry);
                }
            }
            if !matched {
                trace!(bib_id = %ctx.bib_id, key = %key, "no rule for field");
            }
        }
        Ok(())
    }
}

/// Groups fields by dispatch key, keys in first-seen order, fields in
/// record order inside a group.
fn group_by_key(fields: &[Field]) -> Vec<(String, Vec<&Field>)> {
    let mut groups: Vec<(String, Vec<&Field>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for field in fields {
        let key = field.key();
        match positions.get(&key) {
            Some(&index) => groups[index].1.push(field),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![field]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context_for;
    use crate::error::fields;
    use crate::record::RawRecord;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn note_from_a(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
        Ok(field.get_first('a').map(|a| Entry::Notes(vec![a.to_string()])))
    }

    fn last_extent(_doc: &mut Document, fields: &[&Field], _ctx: &mut RecordContext<'_>) -> HandlerResult {
        Ok(fields
            .last()
            .and_then(|f| f.get_first('a'))
            .map(|a| Entry::Extent(a.to_string())))
    }

    fn direct_write(doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
        if let Some(a) = field.get_first('a') {
            doc.content_note.push(a.to_string());
        }
        Ok(None)
    }

    fn wrong_key(_doc: &mut Document, _field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
        Ok(Some(Entry::Extent("wrong".to_string())))
    }

    fn fatal(_doc: &mut Document, _field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
        Err(ValueError::MissingValue {
            field: fields::CONTRIBUTION,
        })
    }

    #[rstest]
    #[case("260..", "260__", true)]
    #[case("260..", "2601_", true)]
    #[case("264.[ _0-3]", "264_4", false)]
    #[case("264.[_0-3]", "264_3", true)]
    #[case("(100|700)..", "700__", true)]
    #[case("001", "0011_", false)]
    #[case("leader", "leader", true)]
    fn test_tag_pattern(#[case] pattern: &'static str, #[case] key: &str, #[case] expected: bool) {
        assert_eq!(TagPattern::new(pattern).unwrap().matches(key), expected);
    }

    #[test]
    fn test_group_by_key_first_seen_order() {
        let fields = vec![
            Field::data("700", ' ', ' ').with_subfield('a', "1"),
            Field::data("500", ' ', ' ').with_subfield('a', "2"),
            Field::data("700", ' ', ' ').with_subfield('a', "3"),
        ];
        let groups = group_by_key(&fields);
        let keys: Vec<_> = groups.iter().map(|(k, g)| (k.as_str(), g.len())).collect();
        assert_eq!(keys, vec![("700__", 2), ("500__", 1)]);
    }

    #[test]
    fn test_dispatch_merges_results() {
        let rules = RuleSet::builder(Dialect::Marc21)
            .each("500..", DocKey::Notes, note_from_a)
            .each("505..", DocKey::ContentNote, direct_write)
            .single("300..", DocKey::Extent, last_extent)
            .each("300..", DocKey::Notes, note_from_a)
            .build()
            .unwrap();
        assert_eq!(rules.len(), 4);
        assert!(rules.handles("300__"));
        assert!(!rules.handles("245__"));

        let record = RawRecord::new()
            .with_field(Field::data("500", ' ', ' ').with_subfield('a', "first"))
            .with_field(Field::data("300", ' ', ' ').with_subfield('a', "1 vol."))
            .with_field(Field::data("505", ' ', ' ').with_subfield('a', "contents"))
            .with_field(Field::data("500", ' ', ' ').with_subfield('a', "second"))
            .with_field(Field::data("300", ' ', ' ').with_subfield('a', "2 vol."))
            .with_field(Field::data("245", ' ', ' ').with_subfield('a', "unhandled"));
        let mut ctx = context_for(&record);
        let mut doc = Document::new();
        rules
            .dispatch(&mut doc, &mut ctx, &record.dispatch_fields())
            .unwrap();

        assert_eq!(doc.notes, vec!["first", "second", "1 vol.", "2 vol."]);
        assert_eq!(doc.extent.as_deref(), Some("2 vol."));
        assert_eq!(doc.content_note, vec!["contents"]);
    }

    #[test]
    fn test_dispatch_rejects_mismatched_key() {
        let rules = RuleSet::builder(Dialect::Marc21)
            .each("500..", DocKey::Notes, wrong_key)
            .build()
            .unwrap();
        let record =
            RawRecord::new().with_field(Field::data("500", ' ', ' ').with_subfield('a', "x"));
        let mut ctx = context_for(&record);
        let mut doc = Document::new();
        rules
            .dispatch(&mut doc, &mut ctx, &record.dispatch_fields())
            .unwrap();
        assert_eq!(doc.extent, None);
    }

    #[test]
    fn test_dispatch_wraps_fatal_errors() {
        let rules = RuleSet::builder(Dialect::ReroDoc)
            .each("700..", DocKey::Contribution, fatal)
            .build()
            .unwrap();
        let record = RawRecord::new()
            .with_field(Field::control("001", "1234"))
            .with_field(Field::data("700", ' ', ' ').with_subfield('a', "Doe, John"));
        let mut ctx = context_for(&record);
        let mut doc = Document::new();
        let err = rules
            .dispatch(&mut doc, &mut ctx, &record.dispatch_fields())
            .unwrap_err();
        assert_eq!(err.bib_id, "1234");
        assert_eq!(err.key.as_deref(), Some("700__"));
        assert_eq!(err.dialect, Dialect::ReroDoc);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = RuleSet::builder(Dialect::Marc21)
            .each("(500", DocKey::Notes, note_from_a)
            .build();
        assert!(result.is_err());
    }
}
