//! ArODES (HES-SO repository) records.
//!
//! Dates are month precision (`2020-03` becomes `2020-03-01`). Host items
//! without numbering take the publication year once dates are applied.

use crate::Dialect;
use crate::context::RecordContext;
use crate::contribution::Role;
use crate::dialects::common::{
    DEFAULT_LANGUAGE, NO_TITLE, abstract_from_520, languages_from_041, local_identifier,
    subject_for_language, title_with_language,
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
use tracing::debug;

const TYPE_MAPPINGS: &[(&str, &str)] = &[
    ("livre", "coar:c_2f33"),
    ("chapitre", "coar:c_3248"),
    ("conference", "coar:c_5794"),
    ("scientifique", "coar:c_6501"),
    ("professionnel", "coar:c_3e5a"),
    ("rapport", "coar:c_18ws"),
    ("THESES", "coar:c_db06"),
];

const OTHER_TYPE: &str = "coar:c_1843";

const OA_STATUS: &[&str] = &["green", "gold", "hybrid", "bronze", "closed"];

static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})").unwrap());
static VOLUME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"vol\.\s(\d+)").unwrap());
static ISSUE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"no\.\s(\d+)").unwrap());
static PAGES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"pp\.\s([0-9\-–]+)").unwrap());

pub(crate) static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(Dialect::Arodes)
        .each("001", DocKey::IdentifiedBy, |_, field, _| {
            local_identifier(field, "ArODES")
        })
        .each("0247.", DocKey::IdentifiedBy, |_, field, _| {
            Ok(match (field.get_first('a'), field.get_first('2')) {
                (Some(doi), Some("DOI")) => Some(Entry::IdentifiedBy(vec![Identifier::new(
                    IdentifierType::Doi,
                    doi,
                )])),
                _ => None,
            })
        })
        .each("041..", DocKey::Language, languages_from_041)
        .each("245..", DocKey::Title, |_, field, _| {
            Ok(title_with_language(field, Some(NO_TITLE)).map(|title| Entry::Title(vec![title])))
        })
        .single("260..", DocKey::ProvisionActivity, |_, fields, ctx| {
            offer_month_date(fields, 'c', DateTier::LegacyPublication, ctx)
        })
        .single("269..", DocKey::ProvisionActivity, |_, fields, ctx| {
            offer_month_date(fields, 'a', DateTier::AlternateDate, ctx)
        })
        .single("502..", DocKey::Dissertation, |_, fields, _| {
            Ok(fields.iter().find_map(|f| f.get_first('b')).map(|degree| {
                Entry::Dissertation(Dissertation {
                    degree: Some(degree.to_string()),
                    ..Default::default()
                })
            }))
        })
        .each("520..", DocKey::Abstracts, abstract_from_520)
        .each("653..", DocKey::Subjects, subjects)
        .each("700..", DocKey::Contribution, contribution)
        .single("773..", DocKey::PartOf, host_item)
        .single("906..", DocKey::OaStatus, oa_status)
        .single("980..", DocKey::DocumentType, document_type)
        .build()
        .unwrap()
});

/// Offers the first `code` value of the fields as a month precision date.
fn offer_month_date(
    fields: &[&Field],
    code: char,
    tier: DateTier,
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    if let Some(date) = fields.iter().find_map(|f| f.get_first(code)) {
        ctx.offer_start_date(tier, date, DatePrecision::Month);
    }
    Ok(None)
}

/// 653: keywords grouped by `$9` language.
fn subjects(doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    if let Some(subject) = field.get_first('a') {
        let language = field.get_first('9').unwrap_or(DEFAULT_LANGUAGE);
        subject_for_language(doc, language)
            .label
            .value
            .push(subject.to_string());
    }
    Ok(None)
}

fn contribution(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(name) = field.get_first('a') else {
        return Ok(None);
    };
    let mut contribution = Contribution::new(Agent::new(AgentType::Person, name), Role::Contributor);
    contribution.affiliation = field.get_first('u').map(String::from);
    Ok(Some(Entry::Contribution(vec![contribution])))
}

/// 773 of the first occurrence. Without `$g` the year is filled in from the
/// start date later; a `$g` without a year drops the host item.
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

fn oa_status(_doc: &mut Document, fields: &[&Field], ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(status) = fields.first().and_then(|f| f.get_first('a')) else {
        return Ok(None);
    };
    let status = status.to_lowercase();
    if !OA_STATUS.contains(&status.as_str()) {
        debug!(bib_id = %ctx.bib_id, status = %status, "unknown open access status");
        return Ok(None);
    }
    Ok(Some(Entry::OaStatus(status)))
}

/// 980$a of the first occurrence, unknown values map to "other".
fn document_type(
    _doc: &mut Document,
    fields: &[&Field],
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    Ok(fields.iter().find_map(|f| f.get_first('a')).map(|code| {
        let document_type = TYPE_MAPPINGS
            .iter()
            .find(|(key, _)| *key == code)
            .map_or(OTHER_TYPE, |(_, document_type)| *document_type);
        Entry::DocumentType(document_type.to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::tests::transform_marc;
    use crate::document::Label;
    use crate::record::RawRecord;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    fn base_record() -> RawRecord {
        RawRecord::new().with_field(Field::control("001", "111"))
    }

    #[rstest]
    #[case("livre", "coar:c_2f33")]
    #[case("chapitre", "coar:c_3248")]
    #[case("conference", "coar:c_5794")]
    #[case("scientifique", "coar:c_6501")]
    #[case("professionnel", "coar:c_3e5a")]
    #[case("rapport", "coar:c_18ws")]
    #[case("THESES", "coar:c_db06")]
    #[case("unknown", "coar:c_1843")]
    fn test_document_type(#[case] code: &str, #[case] expected: &str) {
        let record = base_record()
            .with_field(Field::data("980", ' ', ' ').with_subfield('a', code))
            .with_field(Field::data("980", ' ', ' ').with_subfield('a', "livre"));
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        assert_eq!(doc.document_type.as_deref(), Some(expected));
    }

    #[rstest]
    #[case(Some("2020-03"), None, Some("2020-03-01"))]
    #[case(None, Some("2019-11"), Some("2019-11-01"))]
    #[case(Some("2020-03"), Some("2019-11"), Some("2019-11-01"))]
    #[case(Some("2020-3"), None, None)]
    fn test_start_date(
        #[case] field_269: Option<&str>,
        #[case] field_260: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let mut record = base_record();
        if let Some(date) = field_260 {
            record.push(Field::data("260", ' ', ' ').with_subfield('c', date));
        }
        if let Some(date) = field_269 {
            record.push(Field::data("269", ' ', ' ').with_subfield('a', date));
        }
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        assert_eq!(
            doc.publication().and_then(|p| p.start_date.as_deref()),
            expected
        );
    }

    #[test]
    fn test_host_item_numbering() {
        let record = base_record().with_field(
            Field::data("773", ' ', ' ')
                .with_subfield('t', "Revue médicale suisse")
                .with_subfield('g', "2019, vol. 15, no. 3, pp. 120-125"),
        );
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        assert_eq!(
            doc.to_json().unwrap()["partOf"],
            json!([{
                "numberingYear": "2019",
                "numberingVolume": "15",
                "numberingIssue": "3",
                "numberingPages": "120-125",
                "document": {"title": "Revue médicale suisse"}
            }])
        );
    }

    #[rstest]
    #[case(Some("2018-05"), Some("2018"))]
    #[case(None, None)]
    fn test_host_item_year_from_start_date(
        #[case] date: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let mut record = base_record()
            .with_field(Field::data("773", ' ', ' ').with_subfield('t', "Revue médicale suisse"));
        if let Some(date) = date {
            record.push(Field::data("269", ' ', ' ').with_subfield('a', date));
        }
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        assert_eq!(
            doc.part_of.first().and_then(|p| p.numbering_year.as_deref()),
            expected
        );
    }

    #[test]
    fn test_single_dated_publication_feeds_host_year() {
        let record = base_record()
            .with_field(Field::data("260", ' ', ' ').with_subfield('c', "2019-11"))
            .with_field(Field::data("269", ' ', ' ').with_subfield('a', "2020-03"))
            .with_field(Field::data("773", ' ', ' ').with_subfield('t', "Revue médicale suisse"));
        let doc = transform_marc(Dialect::Arodes, record).unwrap();

        let json = doc.to_json().unwrap();
        assert_eq!(
            json["provisionActivity"],
            json!([{"type": "bf:Publication", "startDate": "2019-11-01"}])
        );
        assert_eq!(json["partOf"][0]["numberingYear"], json!("2019"));
    }

    #[test]
    fn test_host_item_without_year_is_dropped() {
        let record = base_record()
            .with_field(Field::data("269", ' ', ' ').with_subfield('a', "2018-05"))
            .with_field(
                Field::data("773", ' ', ' ')
                    .with_subfield('t', "Revue médicale suisse")
                    .with_subfield('g', "vol. 15"),
            );
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        assert!(doc.part_of.is_empty());
    }

    #[test]
    fn test_subjects_grouped_by_language() {
        let record = base_record()
            .with_field(
                Field::data("653", ' ', ' ')
                    .with_subfield('9', "fre")
                    .with_subfield('a', "santé"),
            )
            .with_field(Field::data("653", ' ', ' ').with_subfield('a', "health"))
            .with_field(
                Field::data("653", ' ', ' ')
                    .with_subfield('9', "fre")
                    .with_subfield('a', "soins"),
            );
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        assert_eq!(
            doc.to_json().unwrap()["subjects"],
            json!([
                {"label": {"language": "fre", "value": ["santé", "soins"]}},
                {"label": {"language": "eng", "value": ["health"]}}
            ])
        );
    }

    #[rstest]
    #[case("Gold", Some("gold"))]
    #[case("closed", Some("closed"))]
    #[case("unknown", None)]
    fn test_oa_status(#[case] status: &str, #[case] expected: Option<&str>) {
        let record = base_record().with_field(Field::data("906", ' ', ' ').with_subfield('a', status));
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        assert_eq!(doc.oa_status.as_deref(), expected);
    }

    #[test]
    fn test_record() {
        let record = base_record()
            .with_field(
                Field::data("024", '7', ' ')
                    .with_subfield('a', "10.1234/abc")
                    .with_subfield('2', "DOI"),
            )
            .with_field(
                Field::data("024", '7', ' ')
                    .with_subfield('a', "123456")
                    .with_subfield('2', "PMID"),
            )
            .with_field(Field::data("041", ' ', ' ').with_subfield('a', "fre"))
            .with_field(Field::data("245", ' ', ' ').with_subfield('b', "sous-titre"))
            .with_field(
                Field::data("520", ' ', ' ')
                    .with_subfield('a', "Résumé")
                    .with_subfield('9', "fre"),
            )
            .with_field(Field::data("502", ' ', ' ').with_subfield('b', "Master of Science"))
            .with_field(
                Field::data("700", ' ', ' ')
                    .with_subfield('a', "Dupont, Jean")
                    .with_subfield('u', "HES-SO Valais"),
            );
        let doc = transform_marc(Dialect::Arodes, record).unwrap();
        let json = doc.to_json().unwrap();

        assert_eq!(
            json["identifiedBy"],
            json!([
                {"type": "bf:Local", "source": "ArODES", "value": "111"},
                {"type": "bf:Doi", "value": "10.1234/abc"}
            ])
        );
        assert_eq!(doc.title[0].main_title, vec![Label::with_language(NO_TITLE, "eng")]);
        assert_eq!(doc.abstracts, vec![Label::with_language("Résumé", "fre")]);
        assert_eq!(json["dissertation"], json!({"degree": "Master of Science"}));
        assert_eq!(
            json["contribution"],
            json!([{
                "agent": {"type": "bf:Person", "preferred_name": "Dupont, Jean"},
                "role": ["ctb"],
                "affiliation": "HES-SO Valais"
            }])
        );
        assert_eq!(json["language"], json!([{"type": "bf:Language", "value": "fre"}]));
    }
}
