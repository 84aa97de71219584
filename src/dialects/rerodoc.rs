//! RERO DOC legacy records.
//!
//! The record's 980 field carries both the owning organisation (`$b`) and
//! the document type (`$a|$f`), which also drives the role of contributors
//! without an explicit role.

use crate::Dialect;
use crate::context::RecordContext;
use crate::contribution::{Role, RoleResolver, controlled_affiliations, extract_date};
use crate::dialects::common::{
    abstract_from_520, description_from_300, file_from_856, languages_from_041, local_identifier,
    other_edition_from_775, series_from_490, subjects_from_600_695, title_with_language,
};
use crate::dialects::marc21::title_246;
use crate::document::{
    Agent, AgentType, Classification, ClassificationType, Contribution, DocKey, Document,
    EditionStatement, Entry, HostDocument, HostPublication, Identifier, IdentifierType, Label,
    PartOf, ProvisionActivity, ProvisionType, Statement, StatementType, UsagePolicy,
};
use crate::engine::{HandlerResult, RuleSet};
use crate::error::ValueError;
use crate::provision::{DatePrecision, DateTier, split_years};
use crate::record::Field;
use crate::regex::Regex;
use crate::registry::EntityKind;
use crate::utils::remove_trailing_punctuation;
use std::sync::LazyLock;
use tracing::warn;

/// Document types keyed by `980$a|980$f`.
const TYPE_MAPPINGS: &[(&str, &str)] = &[
    ("PREPRINT|", "coar:c_816b"),
    ("POSTPRINT|ART_JOURNAL", "coar:c_6501"),
    ("POSTPRINT|ART_INBOOK", "coar:c_3248"),
    ("POSTPRINT|ART_INPROC", "coar:c_5794"),
    ("BOOK|", "coar:c_2f33"),
    ("DISSERTATION|DISS_MASTER", "coar:c_bdcc"),
    ("DISSERTATION|DISS_BACHELOR", "coar:c_7a1f"),
    ("DISSERTATION|DISS_CONT_EDU", "coar:c_46ec"),
    ("THESIS|TH_PHD", "coar:c_db06"),
    ("THESIS|TH_HABILIT", "coar:c_46ec"),
    ("MAP|", "coar:c_12cc"),
    ("REPORT|", "coar:c_18ws"),
    ("NEWSPAPER|", "coar:c_2fe3"),
    ("JOURNAL|", "coar:c_0640"),
    ("PRINT_MEDIA|", "coar:c_2fe3"),
    ("AUDIO|", "coar:c_18cc"),
    ("IMAGE|", "coar:c_ecc8"),
    ("PARTITION|", "coar:c_18cw"),
];

/// Role labels found in 700$e.
const ROLE_LABELS: &[(&str, Role)] = &[
    ("Dir.", Role::DegreeSupervisor),
    ("Codir.", Role::DegreeSupervisor),
    ("Libr./Impr.", Role::Printer),
    ("joint author", Role::Creator),
];

/// Role of 700 contributors without `$e`, keyed by 980$a.
const TYPE_ROLES: &[(&str, Role)] = &[
    ("PREPRINT", Role::Creator),
    ("POSTPRINT", Role::Creator),
    ("DISSERTATION", Role::Creator),
    ("REPORT", Role::Creator),
    ("BOOK", Role::Contributor),
    ("THESIS", Role::Contributor),
    ("MAP", Role::Contributor),
    ("JOURNAL", Role::Contributor),
    ("PARTITION", Role::Contributor),
    ("AUDIO", Role::Contributor),
    ("IMAGE", Role::Contributor),
];

/// Document types whose records may lack a provision activity.
const OPTIONAL_PROVISION_TYPES: &[&str] = &[
    "coar:c_beb9",
    "coar:c_6501",
    "coar:c_998f",
    "coar:c_dcae04bc",
    "coar:c_3e5a",
    "coar:c_5794",
    "coar:c_6670",
];

pub const DEFAULT_LICENSE: &str = "License undefined";

/// Organisation whose records default to a Creative Commons license.
const CC_ORGANISATION: &str = "hepbejune";
const CC_LICENSE: &str = "CC BY-NC-SA";

static DISSERTATION_NOTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<degree>[^:]+?)\s*:\s*(?P<institution>.+?),\s*(?P<date>[0-9]{4})\b").unwrap()
});

pub(crate) static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(Dialect::ReroDoc)
        .single("980..", DocKey::DocumentType, type_and_organisation)
        .each("001", DocKey::IdentifiedBy, |_, field, _| {
            local_identifier(field, "RERO DOC")
        })
        .each(
            "020..|0247.|027..|035..|037..|088..|091..",
            DocKey::IdentifiedBy,
            identifiers,
        )
        .each("041..", DocKey::Language, languages_from_041)
        .each("245..", DocKey::Title, |_, field, _| {
            Ok(title_with_language(field, None).map(|title| Entry::Title(vec![title])))
        })
        .each("246..", DocKey::Title, title_246)
        .single("250..", DocKey::EditionStatement, edition_statement)
        .each("260..", DocKey::ProvisionActivity, provision_activity)
        .single("269..", DocKey::ProvisionActivity, alternate_date)
        .single("300..", DocKey::Formats, description_from_300)
        .each("490..", DocKey::Series, series_from_490)
        .each("500..", DocKey::Notes, |_, field, _| {
            Ok(field
                .get_first('a')
                .map(|note| Entry::Notes(vec![note.trim().to_string()])))
        })
        .each("505..", DocKey::ContentNote, |_, field, _| {
            Ok(field
                .get_first('a')
                .map(|note| Entry::ContentNote(vec![note.trim().to_string()])))
        })
        .single("502..", DocKey::Dissertation, dissertation)
        .single("508..", DocKey::Dissertation, jury_note)
        .each("520..", DocKey::Abstracts, abstract_from_520)
        .single("540..", DocKey::UsageAndAccessPolicy, usage_policy)
        .each("600..|695..", DocKey::Subjects, subjects_from_600_695)
        .each("080..|084..", DocKey::Classification, classification)
        .each("(100|700|710|711)..", DocKey::Contribution, contribution)
        .each("773..", DocKey::PartOf, part_of)
        .each("775..", DocKey::OtherEdition, other_edition_from_775)
        .each("856..", DocKey::Files, file_from_856)
        .each("982..", DocKey::Collections, collection)
        .build()
        .unwrap()
});

/// Organisation code and subdivision name from a 980$b value.
fn organisation_code(code: &str) -> (String, Option<&'static str>) {
    match code.trim().to_lowercase().as_str() {
        "unisi" => ("usi".to_string(), None),
        "bpuge" => ("vge".to_string(), Some("Bibliothèque de Genève")),
        "mhnge" => ("vge".to_string(), Some("Muséum d'histoire naturelle")),
        other => (other.to_string(), None),
    }
}

/// Organisation of the record, from the first 980$b.
fn record_organisation(ctx: &RecordContext<'_>) -> Option<String> {
    ctx.record
        .first_subfield("980", 'b')
        .map(|code| organisation_code(code).0)
}

/// Document type of the record (980$a).
fn record_type<'r>(ctx: &RecordContext<'r>) -> Option<&'r str> {
    ctx.record.first_subfield("980", 'a')
}

fn type_and_organisation(
    doc: &mut Document,
    fields: &[&Field],
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let Some(field) = fields.first() else {
        return Ok(None);
    };

    if let Some(code) = field.get_first('b') {
        let (organisation, subdivision) = organisation_code(code);
        doc.organisation = vec![ctx.registry.organisation(&organisation)];
        if let Some(name) = subdivision {
            let subdivision = ctx.entity(EntityKind::Subdivision, &organisation, name);
            doc.subdivisions.push(subdivision);
        }
    }

    if field.get_first('a').is_none() && field.get_first('f').is_none() {
        return Ok(None);
    }
    let key = format!(
        "{}|{}",
        field.get_first('a').unwrap_or_default(),
        field.get_first('f').unwrap_or_default()
    );
    match TYPE_MAPPINGS.iter().find(|(k, _)| *k == key) {
        Some((_, document_type)) => Ok(Some(Entry::DocumentType(document_type.to_string()))),
        None => {
            warn!(bib_id = %ctx.bib_id, key = %key, "document type not found in mapping");
            Ok(None)
        }
    }
}

fn identifiers(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(value) = field.get_first('a').map(str::trim) else {
        return Ok(None);
    };
    let identifier = match field.tag.as_str() {
        "020" => Identifier::new(IdentifierType::Isbn, value),
        "024" if field.get_first('2') == Some("urn") => Identifier::new(IdentifierType::Urn, value),
        "027" => Identifier::new(IdentifierType::Strn, value),
        "035" => Identifier::new(IdentifierType::Local, value).with_source("RERO"),
        "037" => {
            let value = value.replace("swissbib.ch:", "");
            Identifier::new(IdentifierType::Local, value.trim()).with_source("Swissbib")
        }
        "088" => Identifier::new(IdentifierType::ReportNumber, value),
        "091" if field.get_first('b') == Some("pmid") => {
            Identifier::new(IdentifierType::Pmid, value)
        }
        _ => return Ok(None),
    };
    if identifier.value.is_empty() {
        return Ok(None);
    }
    Ok(Some(Entry::IdentifiedBy(vec![identifier])))
}

/// 250: first occurrence with both designation and responsibility.
fn edition_statement(
    _doc: &mut Document,
    fields: &[&Field],
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    Ok(fields.iter().find_map(|field| {
        let (Some(designation), Some(responsibility)) = (field.get_first('a'), field.get_first('b'))
        else {
            return None;
        };
        Some(Entry::EditionStatement(EditionStatement {
            edition_designation: vec![Label::new(designation.trim())],
            responsibility: vec![Label::new(responsibility.trim())],
        }))
    }))
}

/// 260: publication when dated, manufacture from `$e` and `$f`.
fn provision_activity(
    _doc: &mut Document,
    field: &Field,
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let mut activities = Vec::new();

    if let Some(date) = field.get_first('c') {
        let mut publication = ProvisionActivity::new(ProvisionType::Publication);
        if let Some(place) = field.get_first('a') {
            publication.statement.push(Statement::single(
                StatementType::Place,
                remove_trailing_punctuation(place),
            ));
        }
        if let Some(agent) = field.get_first('b') {
            publication.statement.push(Statement::single(
                StatementType::Agent,
                remove_trailing_punctuation(agent),
            ));
        }
        publication
            .statement
            .push(Statement::single(StatementType::Date, date.trim()));

        let (start, end) = split_years(date);
        if let Some(start) = start {
            ctx.offer_start_date(DateTier::LegacyPublication, &start, DatePrecision::Day);
        }
        publication.end_date = end;
        activities.push(publication);
    }

    if field.has_subfield('e') || field.has_subfield('f') {
        let mut manufacture = ProvisionActivity::new(ProvisionType::Manufacture);
        if let Some(place) = field.get_first('e') {
            manufacture.statement.push(Statement::single(
                StatementType::Place,
                remove_trailing_punctuation(place),
            ));
        }
        if let Some(agent) = field.get_first('f') {
            manufacture
                .statement
                .push(Statement::single(StatementType::Agent, agent.trim()));
        }
        activities.push(manufacture);
    }

    Ok((!activities.is_empty()).then_some(Entry::ProvisionActivity(activities)))
}

fn alternate_date(
    _doc: &mut Document,
    fields: &[&Field],
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    for date in fields.iter().filter_map(|f| f.get_first('c')) {
        ctx.offer_start_date(DateTier::AlternateDate, date, DatePrecision::Day);
    }
    Ok(None)
}

/// 502: degree of the last occurrence. A `degree : institution, year` note
/// is decomposed; `$9` offers a start date.
fn dissertation(
    doc: &mut Document,
    fields: &[&Field],
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    if let Some(degree) = fields.iter().rev().find_map(|f| f.get_first('a')) {
        let dissertation = doc.dissertation.get_or_insert_default();
        match DISSERTATION_NOTE_REGEX.captures(degree.trim()) {
            Some(caps) => {
                dissertation.degree = Some(caps["degree"].trim().to_string());
                dissertation.granting_institution = Some(caps["institution"].trim().to_string());
                dissertation.date = Some(caps["date"].to_string());
            }
            None => dissertation.degree = Some(degree.trim().to_string()),
        }
    }

    for date in fields.iter().filter_map(|f| f.get_first('9')) {
        ctx.offer_start_date(DateTier::Dissertation, date, DatePrecision::Day);
    }
    Ok(None)
}

/// 508: jury note of the last occurrence.
fn jury_note(doc: &mut Document, fields: &[&Field], _ctx: &mut RecordContext<'_>) -> HandlerResult {
    if let Some(note) = fields.iter().rev().find_map(|f| f.get_first('a')) {
        doc.dissertation.get_or_insert_default().jury_note = Some(note.trim().to_string());
    }
    Ok(None)
}

/// 540: label of the last occurrence. The license is set after dispatch.
fn usage_policy(
    _doc: &mut Document,
    fields: &[&Field],
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    Ok(fields.iter().rev().find_map(|f| f.get_first('a')).map(|label| {
        Entry::UsageAndAccessPolicy(UsagePolicy {
            label: Some(label.trim().to_string()),
            license: DEFAULT_LICENSE.to_string(),
        })
    }))
}

fn classification(
    _doc: &mut Document,
    field: &Field,
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let Some(portion) = field.get_first('a') else {
        return Ok(None);
    };
    let kind = match field.tag.as_str() {
        "080" => ClassificationType::Udc,
        _ if field.get_first('2') == Some("ddc") => ClassificationType::Ddc,
        _ => return Ok(None),
    };
    Ok(Some(Entry::Classification(vec![Classification {
        kind,
        classification_portion: portion.trim().to_string(),
        assigner: None,
    }])))
}

fn contribution(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(name) = field.get_first('a') else {
        return Ok(None);
    };

    let contribution = match field.tag.as_str() {
        "100" | "700" => {
            let role = match field.tag.as_str() {
                "100" => Role::Creator,
                _ => RoleResolver::new(ctx.reference)
                    .with_labels(ROLE_LABELS)
                    .with_type_roles(TYPE_ROLES)
                    .resolve(&field.get_all('e'), record_type(ctx))?,
            };
            let mut agent = Agent::new(AgentType::Person, name.trim());
            (agent.date_of_birth, agent.date_of_death) = extract_date(field.get_first('d'))?;

            let mut contribution = Contribution::new(agent, role);
            if let Some(affiliation) = field.get_first('u') {
                contribution.affiliation = Some(affiliation.trim().to_string());
                contribution.controlled_affiliation =
                    controlled_affiliations(ctx.reference, affiliation);
            }
            contribution
        }
        "710" => Contribution::new(
            Agent::new(AgentType::Organization, name.trim()),
            Role::Contributor,
        ),
        _ => {
            let mut agent = Agent::new(AgentType::Meeting, name.trim());
            agent.place = field.get_first('c').map(|c| c.trim().to_string());
            agent.date = field.get_first('d').map(|d| d.trim().to_string());
            agent.number = field.get_first('n').map(|n| n.trim().to_string());
            Contribution::new(agent, Role::Creator)
        }
    };
    Ok(Some(Entry::Contribution(vec![contribution])))
}

/// 773: `$g` is `year/volume/issue/pages`.
fn part_of(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(numbering) = field.get_first('g') else {
        return Ok(None);
    };
    let mut parts = numbering.split('/').map(str::trim);
    let Some(year) = parts.next().filter(|year| !year.is_empty()) else {
        return Ok(None);
    };
    let mut next_part = || parts.next().filter(|p| !p.is_empty()).map(String::from);
    let volume = next_part();
    let issue = next_part();
    let pages = next_part().filter(|pages| pages != "-");

    let mut document = HostDocument {
        title: field.get_first('t').map(|t| t.trim().to_string()),
        contribution: field
            .get_first('c')
            .map(|c| {
                c.split(';')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        ..Default::default()
    };

    let in_book = ctx.record.first_subfield("980", 'f') == Some("ART_INBOOK");
    let statement = field.get_first('d').map(|d| d.trim().to_string());
    if statement.is_some() || in_book {
        document.publication = Some(HostPublication {
            statement,
            start_date: in_book.then(|| year.to_string()),
        });
    }

    ctx.offer_start_date(DateTier::HostItem, year, DatePrecision::Day);

    Ok(Some(Entry::PartOf(vec![PartOf {
        numbering_year: Some(year.to_string()),
        numbering_volume: volume,
        numbering_issue: issue,
        numbering_pages: pages,
        document,
    }])))
}

/// 982: collection owned by the record's organisation.
fn collection(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(name) = field.get_first('a') else {
        return Ok(None);
    };
    let Some(organisation) = record_organisation(ctx) else {
        warn!(bib_id = %ctx.bib_id, collection = name, "collection without organisation skipped");
        return Ok(None);
    };
    let reference = ctx.entity(EntityKind::Collection, &organisation, name.trim());
    Ok(Some(Entry::Collections(vec![reference])))
}

/// Sets the default license and checks the provision activity.
pub(crate) fn finish(doc: &mut Document, ctx: &mut RecordContext<'_>) -> Result<(), ValueError> {
    if doc.usage_and_access_policy.is_none() {
        let cc_organisation = ctx.registry.organisation(CC_ORGANISATION);
        let license = match doc.organisation.first() {
            Some(organisation) if *organisation == cc_organisation => CC_LICENSE,
            _ => DEFAULT_LICENSE,
        };
        doc.usage_and_access_policy = Some(UsagePolicy {
            label: None,
            license: license.to_string(),
        });
    }

    let optional = doc
        .document_type
        .as_deref()
        .is_some_and(|document_type| OPTIONAL_PROVISION_TYPES.contains(&document_type));
    if doc.provision_activity.is_empty() && !optional {
        warn!(bib_id = %ctx.bib_id, "no provision activity found in record");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::tests::transform_marc;
    use crate::error::{RecordError, TransformError};
    use crate::record::RawRecord;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    fn with_type(a: &str, f: Option<&str>) -> Field {
        let field = Field::data("980", ' ', ' ').with_subfield('a', a);
        match f {
            Some(f) => field.with_subfield('f', f),
            None => field,
        }
    }

    #[test]
    fn test_lausanne_imprint() {
        let record = RawRecord::new().with_field(
            Field::data("260", ' ', ' ')
                .with_subfield('a', "Lausanne :")
                .with_subfield('b', "Imprint,")
                .with_subfield('c', "1798-1799"),
        );
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(
            doc.to_json().unwrap()["provisionActivity"],
            json!([{
                "type": "bf:Publication",
                "startDate": "1798",
                "endDate": "1799",
                "statement": [
                    {"type": "bf:Place", "label": [{"value": "Lausanne"}]},
                    {"type": "bf:Agent", "label": [{"value": "Imprint"}]},
                    {"type": "Date", "label": [{"value": "1798-1799"}]}
                ]
            }])
        );
    }

    #[test]
    fn test_single_dated_publication() {
        let record = RawRecord::new()
            .with_field(Field::data("260", ' ', ' ').with_subfield('a', "Lausanne").with_subfield('c', "1995"))
            .with_field(Field::data("260", ' ', ' ').with_subfield('a', "Genève").with_subfield('c', "2001"))
            .with_field(Field::data("269", ' ', ' ').with_subfield('c', "1966"))
            .with_field(Field::data("773", ' ', ' ').with_subfield('g', "2015/3"));
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();

        let dates: Vec<Option<&str>> = doc
            .provision_activity
            .iter()
            .map(|p| p.start_date.as_deref())
            .collect();
        assert_eq!(dates, vec![None, Some("2001")]);
        assert_eq!(
            doc.to_json().unwrap()["partOf"][0]["numberingYear"],
            json!("2015")
        );
    }

    #[test]
    fn test_manufacture() {
        let record = RawRecord::new().with_field(
            Field::data("260", ' ', ' ')
                .with_subfield('e', "Bienne :")
                .with_subfield('f', "Gassmann"),
        );
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(doc.provision_activity.len(), 1);
        assert_eq!(doc.provision_activity[0].kind, ProvisionType::Manufacture);
        assert_eq!(
            doc.provision_activity[0].statement,
            vec![
                Statement::single(StatementType::Place, "Bienne"),
                Statement::single(StatementType::Agent, "Gassmann"),
            ]
        );
    }

    #[rstest]
    #[case::legacy_publication_first(
        vec![
            Field::data("260", ' ', ' ').with_subfield('a', "Lausanne").with_subfield('c', "1798-1799"),
            Field::data("773", ' ', ' ').with_subfield('g', "2015///"),
            Field::data("269", ' ', ' ').with_subfield('c', "1966"),
            Field::data("502", ' ', ' ').with_subfield('a', "Thèse 1").with_subfield('9', "2020"),
        ],
        "1798"
    )]
    #[case::alternate_date(
        vec![
            Field::data("269", ' ', ' ').with_subfield('c', "1966"),
            Field::data("502", ' ', ' ').with_subfield('a', "Thèse 1").with_subfield('9', "2020"),
            Field::data("773", ' ', ' ').with_subfield('g', "2015///"),
        ],
        "1966"
    )]
    #[case::dissertation_over_host_item(
        vec![
            Field::data("502", ' ', ' ').with_subfield('a', "Thèse 1").with_subfield('9', "2020"),
            Field::data("773", ' ', ' ').with_subfield('g', "2015///"),
        ],
        "2020"
    )]
    #[case::host_item(
        vec![Field::data("773", ' ', ' ').with_subfield('g', "2015///")],
        "2015"
    )]
    #[case::full_date(
        vec![Field::data("502", ' ', ' ').with_subfield('a', "Thèse 1").with_subfield('9', "2020-09-09")],
        "2020-09-09"
    )]
    fn test_start_date_priorities(#[case] fields: Vec<Field>, #[case] expected: &str) {
        let mut record = RawRecord::new();
        for field in fields {
            record.push(field);
        }
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        let dated: Vec<_> = doc
            .provision_activity
            .iter()
            .filter_map(|p| p.start_date.as_deref())
            .collect();
        assert_eq!(dated, vec![expected]);
    }

    #[test]
    fn test_invalid_dissertation_date() {
        let record = RawRecord::new().with_field(
            Field::data("502", ' ', ' ')
                .with_subfield('a', "Thèse 1")
                .with_subfield('9', "2010-2020"),
        );
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert!(doc.provision_activity.is_empty());
    }

    #[test]
    fn test_dissertation_decomposition() {
        let record = RawRecord::new()
            .with_field(Field::data("502", ' ', ' ').with_subfield('a', "Thèse 1"))
            .with_field(
                Field::data("502", ' ', ' ')
                    .with_subfield('a', "Thèse de doctorat : Université de Fribourg, 2010 ; Nr. 1671"),
            )
            .with_field(Field::data("508", ' ', ' ').with_subfield('a', "Magna cum laude"));
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(
            doc.to_json().unwrap()["dissertation"],
            json!({
                "degree": "Thèse de doctorat",
                "grantingInstitution": "Université de Fribourg",
                "date": "2010",
                "jury_note": "Magna cum laude"
            })
        );
    }

    #[rstest]
    #[case(Some("Dir."), None, Role::DegreeSupervisor)]
    #[case(Some("Codir."), None, Role::DegreeSupervisor)]
    #[case(Some("Libr./Impr."), None, Role::Printer)]
    #[case(Some("joint author"), Some("BOOK"), Role::Creator)]
    #[case(None, Some("POSTPRINT"), Role::Creator)]
    #[case(None, Some("THESIS"), Role::Contributor)]
    fn test_contributor_role(
        #[case] label: Option<&str>,
        #[case] document_type: Option<&str>,
        #[case] expected: Role,
    ) {
        let mut contributor = Field::data("700", ' ', ' ').with_subfield('a', "Piguet, Etienne");
        if let Some(label) = label {
            contributor.push_subfield('e', label);
        }
        let mut record = RawRecord::new().with_field(contributor);
        if let Some(document_type) = document_type {
            record.push(with_type(document_type, None));
        }
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(doc.contribution[0].role, vec![expected]);
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("Translator"), Some("Translator"))]
    fn test_no_role(#[case] label: Option<&str>, #[case] expected_label: Option<&str>) {
        let mut contributor = Field::data("700", ' ', ' ').with_subfield('a', "Piguet, Etienne");
        if let Some(label) = label {
            contributor.push_subfield('e', label);
        }
        let record = RawRecord::new()
            .with_field(Field::control("001", "R1"))
            .with_field(contributor)
            .with_field(with_type("NEWSPAPER", None));

        let result = transform_marc(Dialect::ReroDoc, record);
        let Err(TransformError::Record(RecordError {
            bib_id, key, error, ..
        })) = result
        else {
            panic!("expected a record error");
        };
        assert_eq!(bib_id, "R1");
        assert_eq!(key.as_deref(), Some("700__"));
        assert_eq!(
            error,
            ValueError::NoRole {
                field: crate::error::fields::CONTRIBUTION,
                label: expected_label.map(String::from),
            }
        );
    }

    #[test]
    fn test_bern_affiliation() {
        let record = RawRecord::new().with_field(
            Field::data("100", ' ', ' ')
                .with_subfield('a', "Romagnani, Andrea")
                .with_subfield('d', "1980-2010")
                .with_subfield('u', "University of Bern, Switzerland"),
        );
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(
            doc.to_json().unwrap()["contribution"],
            json!([{
                "agent": {
                    "type": "bf:Person",
                    "preferred_name": "Romagnani, Andrea",
                    "date_of_birth": "1980",
                    "date_of_death": "2010"
                },
                "role": ["cre"],
                "affiliation": "University of Bern, Switzerland",
                "controlledAffiliation": ["Uni of Bern"]
            }])
        );
    }

    #[test]
    fn test_bad_contributor_date_is_fatal() {
        let record = RawRecord::new().with_field(
            Field::data("100", ' ', ' ')
                .with_subfield('a', "Romagnani, Andrea")
                .with_subfield('d', "zzzz"),
        );
        let result = transform_marc(Dialect::ReroDoc, record);
        assert!(matches!(
            result,
            Err(TransformError::Record(RecordError {
                error: ValueError::BadDate { .. },
                ..
            }))
        ));
    }

    #[rstest]
    #[case("PREPRINT", None, Some("coar:c_816b"))]
    #[case("POSTPRINT", Some("ART_INBOOK"), Some("coar:c_3248"))]
    #[case("THESIS", Some("TH_HABILIT"), Some("coar:c_46ec"))]
    #[case("POSTPRINT", Some("UNKNOWN"), None)]
    fn test_document_type(
        #[case] a: &str,
        #[case] f: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let record = RawRecord::new().with_field(with_type(a, f));
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(doc.document_type.as_deref(), expected);
    }

    #[rstest]
    #[case("TEST", "test", 0)]
    #[case("UNISI", "usi", 0)]
    #[case("BPUGE", "vge", 1)]
    #[case("MHNGE", "vge", 1)]
    fn test_organisation(#[case] code: &str, #[case] expected: &str, #[case] subdivisions: usize) {
        let record =
            RawRecord::new().with_field(Field::data("980", ' ', ' ').with_subfield('b', code));
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(
            doc.organisation[0].href,
            format!("https://sonar.ch/api/organisations/{}", expected)
        );
        assert_eq!(doc.subdivisions.len(), subdivisions);
    }

    #[test]
    fn test_collections_need_organisation() {
        let orphan =
            RawRecord::new().with_field(Field::data("982", ' ', ' ').with_subfield('a', "Treize étoiles"));
        assert!(transform_marc(Dialect::ReroDoc, orphan).unwrap().collections.is_empty());

        let record = RawRecord::new()
            .with_field(Field::data("982", ' ', ' ').with_subfield('a', "Collection 1"))
            .with_field(Field::data("982", ' ', ' ').with_subfield('a', "Collection 2"))
            .with_field(Field::data("982", ' ', ' ').with_subfield('a', "Collection 1"))
            .with_field(Field::data("980", ' ', ' ').with_subfield('b', "test-org"));
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(doc.collections.len(), 3);
        assert_eq!(doc.collections[0], doc.collections[2]);
        assert_ne!(doc.collections[0], doc.collections[1]);
    }

    #[rstest]
    #[case(None, None, DEFAULT_LICENSE)]
    #[case(Some("Springer-Verlag Berlin"), None, DEFAULT_LICENSE)]
    #[case(None, Some("HEPBEJUNE"), CC_LICENSE)]
    fn test_usage_policy(
        #[case] label: Option<&str>,
        #[case] organisation: Option<&str>,
        #[case] license: &str,
    ) {
        let mut record = RawRecord::new();
        if let Some(label) = label {
            record.push(Field::data("540", ' ', ' ').with_subfield('a', label));
        }
        if let Some(organisation) = organisation {
            record.push(Field::data("980", ' ', ' ').with_subfield('b', organisation));
        }
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(
            doc.usage_and_access_policy,
            Some(UsagePolicy {
                label: label.map(String::from),
                license: license.to_string(),
            })
        );
    }

    #[test]
    fn test_part_of() {
        let record = RawRecord::new()
            .with_field(with_type("POSTPRINT", Some("ART_INBOOK")))
            .with_field(
                Field::data("773", ' ', ' ')
                    .with_subfield('c', "Müller, Hans;Meier, Anna;")
                    .with_subfield('d', "Bern : Stämpfli")
                    .with_subfield('g', "2019/12/3/-")
                    .with_subfield('t', "Mélanges"),
            );
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(
            doc.to_json().unwrap()["partOf"],
            json!([{
                "numberingYear": "2019",
                "numberingVolume": "12",
                "numberingIssue": "3",
                "document": {
                    "title": "Mélanges",
                    "contribution": ["Müller, Hans", "Meier, Anna"],
                    "publication": {"statement": "Bern : Stämpfli", "startDate": "2019"}
                }
            }])
        );
    }

    #[test]
    fn test_identifiers() {
        let record = RawRecord::new()
            .with_field(Field::control("001", "328028"))
            .with_field(
                Field::data("024", '7', ' ')
                    .with_subfield('a', "urn:nbn:ch:rero-002-118667")
                    .with_subfield('2', "urn"),
            )
            .with_field(
                Field::data("024", '7', ' ')
                    .with_subfield('a', "10.1/xyz")
                    .with_subfield('2', "doi"),
            )
            .with_field(Field::data("037", ' ', ' ').with_subfield('a', "swissbib.ch:(NATIONALLICENCE)springer-10.1007/s00145-007-0612-7"))
            .with_field(
                Field::data("091", ' ', ' ')
                    .with_subfield('a', "20827771")
                    .with_subfield('b', "pmid"),
            );
        let doc = transform_marc(Dialect::ReroDoc, record).unwrap();
        assert_eq!(
            doc.to_json().unwrap()["identifiedBy"],
            json!([
                {"type": "bf:Local", "source": "RERO DOC", "value": "328028"},
                {"type": "bf:Urn", "value": "urn:nbn:ch:rero-002-118667"},
                {"type": "bf:Local", "source": "Swissbib", "value": "(NATIONALLICENCE)springer-10.1007/s00145-007-0612-7"},
                {"type": "pmid", "value": "20827771"}
            ])
        );
    }
}
