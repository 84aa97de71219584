//! Archive ouverte UNIGE records.

use crate::Dialect;
use crate::dialects::common::{DEFAULT_LANGUAGE, NO_TITLE, local_identifier};
use crate::document::{DocKey, Entry, Identifier, IdentifierType, Label, Title};
use crate::engine::RuleSet;
use std::sync::LazyLock;

pub(crate) static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(Dialect::Unige)
        .each("001", DocKey::IdentifiedBy, |_, field, _| {
            local_identifier(field, "Archive ouverte UNIGE")
        })
        .each("0247.", DocKey::IdentifiedBy, |_, field, _| {
            let Some(value) = field.get_first('a') else {
                return Ok(None);
            };
            let identifier = match field.get_first('2') {
                Some("DOI") => Identifier::new(IdentifierType::Doi, value),
                Some("PMID") => Identifier::new(IdentifierType::Local, value).with_source("PMID"),
                _ => return Ok(None),
            };
            Ok(Some(Entry::IdentifiedBy(vec![identifier])))
        })
        .each("245..", DocKey::Title, |_, field, _| {
            let main_title = field.get_first('a').unwrap_or(NO_TITLE);
            let language = field.get_first('9').unwrap_or(DEFAULT_LANGUAGE);
            Ok(Some(Entry::Title(vec![Title {
                main_title: vec![Label::with_language(main_title, language)],
                ..Default::default()
            }])))
        })
        .build()
        .unwrap()
});
