//! Crossref works, as returned by the citation API.

use crate::context::RecordContext;
use crate::contribution::Role;
use crate::dialects::citation::{base_document, language};
use crate::dialects::tree::{as_list, path, text, texts};
use crate::document::{
    Agent, AgentType, Contribution, Document, HostDocument, HostPublication, Identifier,
    IdentifierType, Label, PartOf, Statement, StatementType, Subject,
    SubjectLabel, Title,
};
use crate::error::ValueError;
use crate::provision::{DatePrecision, DateTier, publication_mut};
use crate::regex::Regex;
use crate::utils::remove_html;
use serde_json::Value;
use std::sync::LazyLock;

pub(crate) use crate::dialects::citation::record_id;

static ORCID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".*/(.*)$").unwrap());

/// First `date-parts` entry of a date object, zero padded (`2020-05-03`).
fn date_parts(value: &Value, key: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = as_list(path(value, &[key, "date-parts"]))
        .first()
        .map(|first| as_list(Some(*first)))?
        .into_iter()
        .filter_map(text)
        .enumerate()
        .map(|(index, part)| match index {
            0 => part,
            _ => format!("{:0>2}", part),
        })
        .collect();
    (!parts.is_empty()).then_some(parts)
}

fn contribution(author: &Value) -> Option<Contribution> {
    let given = author.get("given").and_then(text)?;
    let family = author.get("family").and_then(text).unwrap_or_default();
    let mut agent = Agent::new(AgentType::Person, format!("{}, {}", family, given));
    agent.identified_by = author
        .get("ORCID")
        .and_then(text)
        .and_then(|orcid| ORCID_REGEX.captures(&orcid).map(|caps| caps[1].to_string()))
        .filter(|orcid| !orcid.is_empty())
        .map(|orcid| Identifier::new(IdentifierType::Local, orcid).with_source("ORCID"));

    let mut contribution = Contribution::new(agent, Role::Creator);
    contribution.affiliation = as_list(author.get("affiliation"))
        .last()
        .and_then(|affiliation| affiliation.get("name"))
        .and_then(text);
    Some(contribution)
}

fn part_of(value: &Value) -> Option<PartOf> {
    let title = as_list(value.get("container-title")).into_iter().find_map(text)?;
    let issued = date_parts(value, "issued");

    let identified_by = as_list(value.get("issn-type"))
        .into_iter()
        .filter(|issn| issn.get("type").and_then(Value::as_str) == Some("electronic"))
        .filter_map(|issn| issn.get("value").and_then(text))
        .map(|issn| Identifier::new(IdentifierType::Issn, issn))
        .last()
        .into_iter()
        .collect();

    Some(PartOf {
        numbering_year: issued.as_ref().map(|parts| parts[0].clone()),
        numbering_volume: value.get("volume").and_then(text),
        numbering_issue: path(value, &["journal-issue", "issue"]).and_then(text),
        numbering_pages: value.get("page").and_then(text),
        document: HostDocument {
            title: Some(title),
            publication: Some(HostPublication {
                statement: value.get("publisher").and_then(text),
                start_date: issued.map(|parts| parts.join("-")),
            }),
            identified_by,
            ..Default::default()
        },
    })
}

pub(crate) fn map(value: &Value, ctx: &mut RecordContext<'_>) -> Result<Document, ValueError> {
    let language = language(value, ctx);
    let mut doc = base_document(value, &language);

    doc.title = texts(value, &["title"])
        .into_iter()
        .map(|title| Title {
            main_title: vec![Label::with_language(title, language.as_str())],
            ..Default::default()
        })
        .collect();

    doc.identified_by.extend(
        texts(value, &["ISSN"])
            .into_iter()
            .next()
            .map(|issn| Identifier::new(IdentifierType::Issn, issn)),
    );

    doc.abstracts.extend(
        value
            .get("abstract")
            .and_then(text)
            .map(|text| Label::with_language(remove_html(&text), language.as_str())),
    );

    doc.subjects = texts(value, &["subject"])
        .into_iter()
        .map(|subject| Subject {
            label: SubjectLabel {
                language: Some(language.clone()),
                value: vec![subject],
            },
            source: None,
        })
        .collect();

    doc.contribution = as_list(value.get("author"))
        .into_iter()
        .filter_map(contribution)
        .collect();

    if let Some(parts) = date_parts(value, "published-online") {
        let publication = publication_mut(&mut doc);
        publication
            .statement
            .push(Statement::single(StatementType::Date, parts.join("-")));
        ctx.offer_start_date(DateTier::ModernPublication, &parts[0], DatePrecision::Day);
    }

    doc.part_of.extend(part_of(value));
    Ok(doc)
}
