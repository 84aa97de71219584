//! Generic MARC 21 (legacy catalogue records).
//!
//! Provision activities follow the 260/264 second indicator. The 008 date is
//! offered once per record; a transcribed `$c` year outranks it, and a 264
//! publication year outranks a 260 one whatever the field order. Only one
//! publication ends up dated.

use crate::Dialect;
use crate::context::RecordContext;
use crate::contribution::{
    Role, RoleResolver, controlled_affiliations, extract_date, join_name,
};
use crate::dialects::common::{
    DEFAULT_LANGUAGE, abstract_from_520, description_from_300, file_from_856, local_identifier,
    other_edition_from_775, series_from_490, subjects_from_600_695,
};
use crate::document::{
    Agent, AgentType, Contribution, Dissertation, DocKey, Document, EditionStatement, Entry,
    HostDocument, Identifier, IdentifierType, Label, Language, PartOf, ProvisionActivity,
    ProvisionType, StatementType, Title,
};
use crate::engine::{HandlerResult, RuleSet};
use crate::identifier;
use crate::provision::{
    DatePrecision, DateTier, build_statement, date_statement, leading_year, place_from_context,
};
use crate::record::Field;
use crate::utils::remove_trailing_punctuation;
use itertools::Itertools;
use std::sync::LazyLock;

/// Note of publications whose 008 dates are questionable or unknown.
pub const UNCERTAIN_DATE_NOTE: &str = "Date(s) incertaine(s) ou inconnue(s)";

pub(crate) static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(Dialect::Marc21)
        .each("001", DocKey::IdentifiedBy, |_, field, _| {
            local_identifier(field, "RERO DOC")
        })
        .each(
            "0(20|22|24|27|28|35|37|88)..",
            DocKey::IdentifiedBy,
            identifiers,
        )
        .single("041..", DocKey::Language, languages)
        .each("245..", DocKey::Title, title_245)
        .each("246..", DocKey::Title, title_246)
        .each("250..", DocKey::EditionStatement, edition_statement)
        .each("260..|264.[_0-3]", DocKey::ProvisionActivity, provision_activity)
        .single("269..", DocKey::ProvisionActivity, alternate_date)
        .single("300..", DocKey::Formats, description_from_300)
        .each("490..", DocKey::Series, series_from_490)
        .each("500..", DocKey::Notes, notes)
        .single("502..", DocKey::Dissertation, dissertation)
        .each("520..", DocKey::Abstracts, abstract_from_520)
        .each("600..|695..", DocKey::Subjects, subjects_from_600_695)
        .each("(100|700|710|711)..", DocKey::Contribution, contribution)
        .single("773..", DocKey::PartOf, part_of)
        .each("775..", DocKey::OtherEdition, other_edition_from_775)
        .each("856..", DocKey::Files, file_from_856)
        .build()
        .unwrap()
});

fn identifiers(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let identifiers = identifier::from_field(field);
    Ok((!identifiers.is_empty()).then_some(Entry::IdentifiedBy(identifiers)))
}

/// 008 language first, then every 041$a, without duplicates.
fn languages(_doc: &mut Document, _fields: &[&Field], ctx: &mut RecordContext<'_>) -> HandlerResult {
    let languages: Vec<Language> = std::iter::once(ctx.lang_008.as_str())
        .chain(ctx.languages_a.iter().map(String::as_str))
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unique()
        .map(Language::new)
        .collect();
    Ok((!languages.is_empty()).then_some(Entry::Language(languages)))
}

/// Labels of the first `code` subfield, with its alternate graphic value.
fn alternate_labels(field: &Field, ctx: &RecordContext<'_>, code: char) -> Vec<Label> {
    field
        .subfields()
        .iter()
        .position(|s| s.code == code && !s.value.trim().is_empty())
        .map(|index| ctx.label_with_alternate(field, index, remove_trailing_punctuation))
        .unwrap_or_default()
}

fn title_245(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let mut main_title = alternate_labels(field, ctx, 'a');
    if main_title.is_empty() {
        return Ok(None);
    }
    let language = field.get_first('9').unwrap_or(DEFAULT_LANGUAGE);
    main_title[0].language = Some(language.to_string());

    let mut subtitle = alternate_labels(field, ctx, 'b');
    if let Some(first) = subtitle.first_mut() {
        first.language = Some(language.to_string());
    }

    Ok(Some(Entry::Title(vec![Title {
        main_title,
        subtitle,
        ..Default::default()
    }])))
}

/// 246 adds a main title to the last title.
pub(crate) fn title_246(
    doc: &mut Document,
    field: &Field,
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let Some(main_title) = field.get_first('a') else {
        return Ok(None);
    };
    let language = field.get_first('9').unwrap_or(DEFAULT_LANGUAGE);
    if doc.title.is_empty() {
        doc.title.push(Title::default());
    }
    if let Some(title) = doc.title.last_mut() {
        title
            .main_title
            .push(Label::with_language(main_title, language));
    }
    Ok(None)
}

fn edition_statement(
    _doc: &mut Document,
    field: &Field,
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let edition = EditionStatement {
        edition_designation: alternate_labels(field, ctx, 'a'),
        responsibility: alternate_labels(field, ctx, 'b'),
    };
    if edition.edition_designation.is_empty() && edition.responsibility.is_empty() {
        return Ok(None);
    }
    Ok(Some(Entry::EditionStatement(edition)))
}

fn provision_type(field: &Field) -> ProvisionType {
    if field.tag == "260" {
        return ProvisionType::Publication;
    }
    match field.ind2 {
        '0' => ProvisionType::Production,
        '2' => ProvisionType::Distribution,
        '3' => ProvisionType::Manufacture,
        _ => ProvisionType::Publication,
    }
}

fn provision_activity(
    _doc: &mut Document,
    field: &Field,
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let kind = provision_type(field);
    let mut activity = ProvisionActivity::new(kind);

    if kind == ProvisionType::Publication {
        if !ctx.has_start_date(DateTier::ControlField)
            && let Some(date1) = ctx.date1.clone()
        {
            ctx.offer_start_date(DateTier::ControlField, &date1, DatePrecision::Day);
        }
        activity.end_date = ctx
            .date2
            .clone()
            .filter(|date| date.chars().all(|c| c.is_ascii_digit()));
        if matches!(ctx.date_type, Some('q' | 'n')) {
            activity.note = Some(UNCERTAIN_DATE_NOTE.to_string());
        }
        activity.place.extend(place_from_context(ctx));

        if let Some(year) = field.get_first('c').and_then(leading_year) {
            let tier = match field.tag.as_str() {
                "260" => DateTier::LegacyPublication,
                _ => DateTier::ModernPublication,
            };
            ctx.offer_start_date(tier, year, DatePrecision::Day);
        }
    }

    activity.statement = build_statement(
        field,
        ctx,
        &[('a', StatementType::Place), ('b', StatementType::Agent)],
    );
    activity.statement.extend(date_statement(field, ctx, 'c'));

    Ok(Some(Entry::ProvisionActivity(vec![activity])))
}

/// 269: date of the last occurrence.
fn alternate_date(
    _doc: &mut Document,
    fields: &[&Field],
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    if let Some(date) = fields.iter().rev().find_map(|f| f.get_first('c')) {
        ctx.offer_start_date(DateTier::AlternateDate, date, DatePrecision::Day);
    }
    Ok(None)
}

fn notes(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let notes: Vec<String> = field
        .get_all('a')
        .into_iter()
        .map(|a| a.trim().to_string())
        .collect();
    Ok((!notes.is_empty()).then_some(Entry::Notes(notes)))
}

/// 502: the last occurrence wins.
fn dissertation(
    _doc: &mut Document,
    fields: &[&Field],
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let Some(field) = fields.last() else {
        return Ok(None);
    };
    let dissertation = Dissertation {
        degree: field.get_first('a').map(remove_trailing_punctuation),
        granting_institution: field.get_first('c').map(remove_trailing_punctuation),
        date: field.get_first('d').map(|d| d.trim().to_string()),
        jury_note: None,
    };
    if let Some(date) = dissertation.date.as_deref() {
        ctx.offer_start_date(DateTier::Dissertation, date, DatePrecision::Day);
    }
    Ok(Some(Entry::Dissertation(dissertation)))
}

fn contribution(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(name) = field.get_first('a') else {
        return Ok(None);
    };
    let (kind, separator) = match field.tag.as_str() {
        "710" => (AgentType::Organization, ". "),
        "711" => (AgentType::Meeting, ". "),
        _ => (AgentType::Person, " "),
    };
    let name = remove_trailing_punctuation(&join_name(
        &remove_trailing_punctuation(name),
        field.get_all('b').into_iter().map(str::trim),
        separator,
    ));
    let mut agent = Agent::new(kind, name);

    match kind {
        AgentType::Person => {
            (agent.date_of_birth, agent.date_of_death) = extract_date(field.get_first('d'))?;
        }
        AgentType::Meeting => {
            agent.place = field.get_first('c').map(remove_trailing_punctuation);
            agent.date = field.get_first('d').map(remove_trailing_punctuation);
            agent.number = field.get_first('n').map(remove_trailing_punctuation);
        }
        AgentType::Organization => {}
    }

    let default = match field.tag.as_str() {
        "100" => Role::Creator,
        _ => Role::Contributor,
    };
    let role = RoleResolver::new(ctx.reference)
        .with_default(default)
        .resolve(&field.get_all('4'), None)?;

    let mut contribution = Contribution::new(agent, role);
    if let Some(affiliation) = field.get_first('u') {
        contribution.affiliation = Some(affiliation.trim().to_string());
        contribution.controlled_affiliation = controlled_affiliations(ctx.reference, affiliation);
    }
    Ok(Some(Entry::Contribution(vec![contribution])))
}

/// 773: host title, identifiers and numbering year of the first occurrence.
fn part_of(_doc: &mut Document, fields: &[&Field], ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(field) = fields.iter().find(|f| f.has_subfield('t')) else {
        return Ok(None);
    };

    let mut identified_by: Vec<Identifier> = field
        .get_all('x')
        .into_iter()
        .map(|issn| Identifier::new(IdentifierType::Issn, issn.trim()))
        .collect();
    identified_by.extend(
        field
            .get_all('z')
            .into_iter()
            .map(|isbn| Identifier::new(IdentifierType::Isbn, isbn.trim())),
    );

    let year = field.get_first('g').and_then(leading_year).map(String::from);
    if let Some(year) = year.as_deref() {
        ctx.offer_start_date(DateTier::HostItem, year, DatePrecision::Day);
    }

    Ok(Some(Entry::PartOf(vec![PartOf {
        numbering_year: year,
        document: HostDocument {
            title: field.get_first('t').map(remove_trailing_punctuation),
            identified_by,
            ..Default::default()
        },
        ..Default::default()
    }])))
}
