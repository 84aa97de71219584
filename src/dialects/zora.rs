//! ZORA (University of Zurich repository) records.

use crate::Dialect;
use crate::context::RecordContext;
use crate::contribution::{Role, RoleResolver};
use crate::dialects::common::{
    NO_TITLE, abstract_from_520, languages_from_041, local_identifier, title_with_language,
};
use crate::document::{
    Agent, AgentType, Contribution, Dissertation, DocKey, Document, Entry, HostDocument,
    Identifier, IdentifierType, PartOf,
};
use crate::engine::{HandlerResult, RuleSet};
use crate::provision::{DatePrecision, DateTier};
use crate::record::Field;
use crate::regex::Regex;
use std::sync::LazyLock;

static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((\d{4})\)$").unwrap());
static VOLUME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Bd\.\s(\d+)").unwrap());
static ISSUE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Nr\.\s(\d+)").unwrap());
static PAGES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"S\.\s(.+)\s\(").unwrap());
static ORCID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(orcid\)(.*)$").unwrap());
static PUBLICATION_YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").unwrap());

/// Types keyed by 655 `$2` source and `$a` term.
const TYPE_MAPPINGS: &[(&str, &str, &str)] = &[
    ("local", "Herausgegebenes wissenschaftliches Werk", "coar:c_2f33"),
    ("local", "Monografie", "coar:c_2f33"),
    ("local", "Buchkapitel", "coar:c_3248"),
    ("local", "Konferenzbeitrag", "coar:c_5794"),
    ("local", "Artikel", "coar:c_6501"),
    ("local", "Zeitungsartikel", "coar:c_998f"),
    ("local", "Working Paper", "coar:c_8042"),
    ("gnd-content", "Forschungsbericht", "coar:c_18ws"),
];

/// University theses (`gnd-content` "Hochschulschrift") keyed by 502$b.
const THESIS_MAPPINGS: &[(&str, &str)] = &[
    ("Dissertation", "coar:c_db06"),
    ("Masterarbeit", "coar:c_bdcc"),
    ("Habilitation", "coar:c_46ec"),
];

const OTHER_TYPE: &str = "coar:c_1843";

pub(crate) static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(Dialect::Zora)
        .each("001", DocKey::IdentifiedBy, |_, field, _| {
            local_identifier(field, "ZORA")
        })
        .each("0247.", DocKey::IdentifiedBy, identifier)
        .each("041..", DocKey::Language, languages_from_041)
        .each("245..", DocKey::Title, |_, field, _| {
            Ok(title_with_language(field, Some(NO_TITLE)).map(|title| Entry::Title(vec![title])))
        })
        .each("264..", DocKey::ProvisionActivity, |_, field, ctx| {
            if let Some(year) = field
                .get_first('c')
                .filter(|year| PUBLICATION_YEAR_REGEX.is_match(year))
            {
                ctx.offer_start_date(DateTier::ModernPublication, year, DatePrecision::Day);
            }
            Ok(None)
        })
        .single("502..", DocKey::Dissertation, dissertation)
        .each("520..", DocKey::Abstracts, abstract_from_520)
        .single("655..", DocKey::DocumentType, document_type)
        .each("[17]00..", DocKey::Contribution, contribution)
        .single("773..", DocKey::PartOf, host_item)
        .build()
        .unwrap()
});

/// 024 typed by `$2`: DOI, PubMed id as a local identifier, else generic.
fn identifier(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(value) = field.get_first('a') else {
        return Ok(None);
    };
    let identifier = match field.get_first('2') {
        Some("doi") => Identifier::new(IdentifierType::Doi, value),
        Some("pmid") => Identifier::new(IdentifierType::Local, value).with_source("PMID"),
        _ => Identifier::new(IdentifierType::Identifier, value),
    };
    Ok(Some(Entry::IdentifiedBy(vec![identifier])))
}

fn dissertation(_doc: &mut Document, fields: &[&Field], _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(field) = fields.iter().find(|f| f.has_subfield('b')) else {
        return Ok(None);
    };
    Ok(Some(Entry::Dissertation(Dissertation {
        degree: field.get_first('b').map(String::from),
        granting_institution: field.get_first('c').map(String::from),
        date: field.get_first('d').map(String::from),
        jury_note: None,
    })))
}

/// First 655 carrying both a term and a source.
fn document_type(
    _doc: &mut Document,
    fields: &[&Field],
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let Some((source, term)) = fields
        .iter()
        .find_map(|f| f.get_first('2').zip(f.get_first('a')))
    else {
        return Ok(None);
    };

    let mapped = TYPE_MAPPINGS
        .iter()
        .find(|(s, t, _)| *s == source && *t == term)
        .map(|(_, _, document_type)| *document_type);
    let thesis = || {
        let degree = ctx.record.first_subfield("502", 'b')?;
        THESIS_MAPPINGS
            .iter()
            .find(|(key, _)| *key == degree.trim())
            .map(|(_, document_type)| *document_type)
    };
    let document_type = match (source, term) {
        ("gnd-content", "Hochschulschrift") => thesis(),
        _ => mapped,
    };
    Ok(Some(Entry::DocumentType(
        document_type.unwrap_or(OTHER_TYPE).to_string(),
    )))
}

/// 100/700: `$4 aut` is the creator, ORCID from `$0`.
fn contribution(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(name) = field.get_first('a') else {
        return Ok(None);
    };
    let mut agent = Agent::new(AgentType::Person, name);
    agent.identified_by = field
        .get_first('0')
        .and_then(|id| ORCID_REGEX.captures(id))
        .map(|caps| Identifier::new(IdentifierType::Local, &caps[1]).with_source("ORCID"));

    let role = RoleResolver::new(ctx.reference)
        .with_default(Role::Creator)
        .resolve(&field.get_all('4'), None)?;
    Ok(Some(Entry::Contribution(vec![Contribution::new(agent, role)])))
}

/// 773 of the first occurrence, numbering in German notation
/// (`Bd. 12, Nr. 3, S. 45-67 (2019)`).
fn host_item(_doc: &mut Document, fields: &[&Field], _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(field) = fields.first() else {
        return Ok(None);
    };
    let Some(title) = field.get_first('t') else {
        return Ok(None);
    };
    let mut part_of = PartOf {
        document: HostDocument {
            title: Some(title.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    if let Some(numbering) = field.get_first('g') {
        let capture = |regex: &Regex| regex.captures(numbering).map(|caps| caps[1].to_string());
        part_of.numbering_year = capture(&*YEAR_REGEX);
        part_of.numbering_volume = capture(&*VOLUME_REGEX);
        part_of.numbering_issue = capture(&*ISSUE_REGEX);
        part_of.numbering_pages = capture(&*PAGES_REGEX);
        if part_of.numbering_year.is_none() {
            return Ok(None);
        }
    }
    Ok(Some(Entry::PartOf(vec![part_of])))
}
