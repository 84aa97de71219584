//! OpenAIRE (datacite) records from BORIS, handed over as a JSON tree.

use crate::context::RecordContext;
use crate::dialects::common::DEFAULT_LANGUAGE;
use crate::dialects::tree::{as_list, attr, path, text};
use crate::document::{Document, Identifier, IdentifierType, Label, Title};
use crate::error::{ValueError, fields};
use serde_json::Value;

const RESOURCE_PATH: &[&str] = &["record", "metadata", "resource"];

fn resource(value: &Value) -> Option<&Value> {
    path(value, RESOURCE_PATH).filter(|resource| resource.is_object())
}

pub(crate) fn record_id(value: &Value) -> Option<String> {
    resource(value)
        .and_then(|resource| resource.get("datacite:identifier"))
        .and_then(text)
}

fn identifiers(resource: &Value) -> Vec<Identifier> {
    let mut identifiers: Vec<Identifier> = resource
        .get("datacite:identifier")
        .and_then(text)
        .map(|id| Identifier::new(IdentifierType::Local, id).with_source("BORIS"))
        .into_iter()
        .collect();

    let alternates = as_list(path(
        resource,
        &["datacite:alternateIdentifiers", "datacite:alternateIdentifier"],
    ));
    identifiers.extend(
        alternates
            .into_iter()
            .filter(|identifier| attr(identifier, "identifierType") == Some("DOI"))
            .filter_map(text)
            .map(|doi| Identifier::new(IdentifierType::Doi, doi)),
    );

    let related = as_list(path(
        resource,
        &["datacite:relatedIdentifiers", "datacite:relatedIdentifier"],
    ));
    identifiers.extend(
        related
            .into_iter()
            .filter(|identifier| {
                attr(identifier, "relationType") == Some("IsVersionOf")
                    && attr(identifier, "relatedIdentifierType") == Some("PMID")
            })
            .filter_map(text)
            .map(|pmid| Identifier::new(IdentifierType::Local, pmid).with_source("PMID")),
    );
    identifiers
}

fn titles(resource: &Value) -> Vec<Title> {
    as_list(path(resource, &["datacite:titles", "datacite:title"]))
        .into_iter()
        .filter_map(|title| {
            let language = attr(title, "xml:lang").unwrap_or(DEFAULT_LANGUAGE);
            text(title).map(|value| Title {
                main_title: vec![Label::with_language(value, language)],
                ..Default::default()
            })
        })
        .collect()
}

pub(crate) fn map(value: &Value, _ctx: &mut RecordContext<'_>) -> Result<Document, ValueError> {
    let resource = resource(value).ok_or(ValueError::MissingValue {
        field: fields::METADATA,
    })?;
    let mut doc = Document::new();
    doc.identified_by = identifiers(resource);
    doc.title = titles(resource);
    Ok(doc)
}
