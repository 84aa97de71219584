//! OAI-PMH Dublin Core records (edoc), handed over as a JSON tree.

use crate::context::RecordContext;
use crate::contribution::Role;
use crate::dialects::tree::{first_text, path, texts};
use crate::document::{
    Agent, AgentType, Contribution, Document, Identifier, IdentifierType, Label, Language,
    Subject, SubjectLabel, Title,
};
use crate::error::{ValueError, fields};
use crate::provision::{DatePrecision, DateTier, publication_mut};
use crate::regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const METADATA_PATH: &[&str] = &["record", "metadata", "oai_dc:dc"];
const HEADER_ID_PATH: &[&str] = &["record", "header", "identifier"];

const DEFAULT_TITLE: &str = "Default title";

const TYPE_MAPPINGS: &[(&str, &str)] = &[
    ("Book", "coar:c_2f33"),
    ("Book Section", "coar:c_3248"),
    ("Conference", "coar:c_c94f"),
    ("Workshop Item", "coar:c_c94f"),
    ("Research Data", "coar:c_ddb1"),
    ("Article", "coar:c_6501"),
    ("Newspaper", "coar:c_998f"),
    ("Magazine Article", "coar:c_998f"),
    ("Audiovisual Material & Event", "non_textual_object"),
    ("Preprint", "coar:c_816b"),
    ("Thesis", "coar:c_db06"),
    ("Working Paper", "coar:c_8042"),
];

const OTHER_TYPE: &str = "coar:c_1843";

/// Prefixes of typed `dc:identifier` values.
const IDENTIFIER_PREFIXES: &[(&str, IdentifierType, Option<&str>)] = &[
    ("info:doi/", IdentifierType::Doi, None),
    ("info:pmid/", IdentifierType::Local, Some("PMID")),
    ("urn:", IdentifierType::Urn, None),
];

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)\s:\s(.+)$").unwrap());
static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}$").unwrap());

pub(crate) fn record_id(value: &Value) -> Option<String> {
    first_text(value, HEADER_ID_PATH)
}

/// Languages of the record, `deu` and `fra` as their bibliographic codes,
/// English when none is given.
fn languages(dc: &Value) -> Vec<String> {
    let languages: Vec<String> = texts(dc, &["dc:language"])
        .into_iter()
        .map(|language| match language.as_str() {
            "deu" => "ger".to_string(),
            "fra" => "fre".to_string(),
            _ => language,
        })
        .collect();
    if languages.is_empty() {
        return vec!["eng".to_string()];
    }
    languages
}

fn identifier(value: &str) -> Identifier {
    IDENTIFIER_PREFIXES
        .iter()
        .find_map(|(prefix, kind, source)| {
            value.strip_prefix(prefix).map(|rest| {
                let identifier = Identifier::new(*kind, rest);
                match source {
                    Some(source) => identifier.with_source(*source),
                    None => identifier,
                }
            })
        })
        .unwrap_or_else(|| Identifier::new(IdentifierType::Identifier, value))
}

fn title(dc: &Value, language: &str) -> Title {
    let text = first_text(dc, &["dc:title"]);
    let (main_title, subtitle) = match text.as_deref().and_then(|t| TITLE_REGEX.captures(t)) {
        Some(caps) => (caps[1].to_string(), Some(caps[2].to_string())),
        None => (text.unwrap_or_else(|| DEFAULT_TITLE.to_string()), None),
    };
    Title {
        main_title: vec![Label::with_language(main_title, language)],
        subtitle: subtitle
            .map(|subtitle| Label::with_language(subtitle, language))
            .into_iter()
            .collect(),
        ..Default::default()
    }
}

fn document_type(dc: &Value) -> String {
    texts(dc, &["dc:type"])
        .iter()
        .find_map(|kind| {
            TYPE_MAPPINGS
                .iter()
                .find(|(key, _)| *key == kind.as_str())
                .map(|(_, document_type)| *document_type)
        })
        .unwrap_or(OTHER_TYPE)
        .to_string()
}

pub(crate) fn map(value: &Value, ctx: &mut RecordContext<'_>) -> Result<Document, ValueError> {
    let Some(dc) = path(value, METADATA_PATH).filter(|dc| dc.is_object()) else {
        return Err(ValueError::MissingValue {
            field: fields::METADATA,
        });
    };
    let languages = languages(dc);
    let language = languages[0].clone();
    let mut doc = Document::new();

    doc.identified_by.extend(
        record_id(value)
            .map(|id| Identifier::new(IdentifierType::Local, id).with_source("edoc")),
    );
    doc.identified_by
        .extend(texts(dc, &["dc:identifier"]).iter().map(|id| identifier(id)));

    doc.language = languages.into_iter().map(Language::new).collect();
    doc.title.push(title(dc, &language));

    if let Some(date) = first_text(dc, &["dc:date"]).filter(|date| YEAR_REGEX.is_match(date)) {
        publication_mut(&mut doc);
        ctx.offer_start_date(DateTier::ModernPublication, &date, DatePrecision::Day);
    }

    doc.document_type = Some(document_type(dc));
    doc.abstracts = texts(dc, &["dc:description"])
        .into_iter()
        .map(|text| Label::with_language(text, language.as_str()))
        .collect();

    let subjects = texts(dc, &["dc:subject"]);
    if !subjects.is_empty() {
        doc.subjects.push(Subject {
            label: SubjectLabel {
                language: Some(language.clone()),
                value: subjects,
            },
            source: None,
        });
    }

    for (key, role) in [("dc:creator", Role::Creator), ("dc:contributor", Role::Contributor)] {
        doc.contribution.extend(
            texts(dc, &[key])
                .into_iter()
                .map(|name| Contribution::new(Agent::new(AgentType::Person, name), role)),
        );
    }
    Ok(doc)
}
