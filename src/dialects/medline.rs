//! Medline citations, as returned by the citation API.

use crate::context::RecordContext;
use crate::contribution::Role;
use crate::dialects::citation::{base_document, language};
use crate::dialects::tree::{as_list, text, texts};
use crate::document::{
    Agent, AgentType, Contribution, Document, HostDocument, Identifier, IdentifierType, Label,
    PartOf, Statement, StatementType, Subject, SubjectLabel, Title,
};
use crate::error::ValueError;
use crate::provision::{DatePrecision, DateTier, publication_mut};
use crate::regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const UNKNOWN_TITLE: &str = "Unknown title";

static MESH_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.*:(.*)$").unwrap());

/// PubMed id, or the DOI for citations without one.
pub(crate) fn record_id(value: &Value) -> Option<String> {
    value
        .get("pmid")
        .and_then(text)
        .or_else(|| crate::dialects::citation::record_id(value))
}

fn subject(language: &str, value: String, source: Option<&str>) -> Subject {
    Subject {
        label: SubjectLabel {
            language: Some(language.to_string()),
            value: vec![value],
        },
        source: source.map(str::to_string),
    }
}

fn subjects(value: &Value, language: &str) -> Vec<Subject> {
    let keywords = texts(value, &["keywords"])
        .into_iter()
        .map(|keyword| subject(language, keyword, None));
    let mesh_terms = texts(value, &["mesh_terms"]).into_iter().filter_map(|term| {
        MESH_REGEX
            .captures(&term)
            .map(|caps| subject(language, caps[1].to_string(), Some("MeSH")))
    });
    keywords.chain(mesh_terms).collect()
}

/// Authors in order, paired with the affiliation at the same position.
fn contributions(value: &Value) -> Vec<Contribution> {
    let affiliations: Vec<Option<String>> = as_list(value.get("affiliations"))
        .into_iter()
        .map(text)
        .collect();
    as_list(value.get("authors"))
        .into_iter()
        .enumerate()
        .filter_map(|(index, author)| {
            let name = text(author).filter(|name| !name.is_empty())?;
            let mut contribution =
                Contribution::new(Agent::new(AgentType::Person, name), Role::Creator);
            contribution.affiliation = affiliations.get(index).cloned().flatten();
            Some(contribution)
        })
        .collect()
}

pub(crate) fn map(value: &Value, ctx: &mut RecordContext<'_>) -> Result<Document, ValueError> {
    let language = language(value, ctx);
    let mut doc = base_document(value, &language);

    let title = value
        .get("title")
        .and_then(text)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    doc.title.push(Title {
        main_title: vec![Label::with_language(title, language.as_str())],
        ..Default::default()
    });

    doc.identified_by.extend(
        value
            .get("pmid")
            .and_then(text)
            .map(|pmid| Identifier::new(IdentifierType::Local, pmid).with_source("PMID")),
    );

    doc.abstracts.extend(
        value
            .get("abstract")
            .and_then(text)
            .filter(|text| !text.is_empty())
            .map(|text| Label::with_language(text, language.as_str())),
    );
    doc.subjects = subjects(value, &language);
    doc.contribution = contributions(value);

    let pubyear = value.get("pubyear").and_then(text);
    if let Some(year) = &pubyear {
        ctx.offer_start_date(DateTier::ModernPublication, year, DatePrecision::Day);
    }
    if let Some(entrez_date) = value.get("entrez_date").and_then(text) {
        publication_mut(&mut doc)
            .statement
            .push(Statement::single(StatementType::Date, entrez_date));
    }

    if let Some(journal) = value.get("journal").and_then(text) {
        doc.part_of.push(PartOf {
            numbering_year: pubyear,
            document: HostDocument {
                title: Some(journal),
                ..Default::default()
            },
            ..Default::default()
        });
    }
    Ok(doc)
}
