//! Swisscovery union catalogue records (SRU).
//!
//! Document types are derived from the leader, refined by 502 keywords for
//! theses. The 008 dates seed the publication; a 264 publication year
//! outranks them.

use crate::Dialect;
use crate::context::RecordContext;
use crate::contribution::{Role, RoleResolver, extract_date, join_name};
use crate::dialects::common::{
    DEFAULT_LANGUAGE, description_from_300, file_from_856, local_identifier, series_from_490,
};
use crate::document::{
    Agent, AgentType, Contribution, Dissertation, DocKey, Document, EditionStatement, Entry,
    HostDocument, Identifier, IdentifierType, Label, Language, PartOf, ProvisionActivity,
    ProvisionType, StatementType, Title,
};
use crate::engine::{HandlerResult, RuleSet};
use crate::provision::{
    DatePrecision, DateTier, build_statement, date_statement, leading_year, publication_mut,
};
use crate::record::Field;
use crate::regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static PAGES_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*S\.\s([0-9\-]+).*$").unwrap());

static YEAR_REGEXES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^yr:([0-9]{4})$").unwrap(),
        Regex::new(r"^.*\(([0-9]{4})\).*$").unwrap(),
    ]
});

static VOLUME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.*Vol\.\s([0-9]+).*$").unwrap());

static ISSUE_REGEXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)^no:([0-9]+)$").unwrap(),
        Regex::new(r"(?i)^.*No\s([0-9]+).*$").unwrap(),
        Regex::new(r"(?i)^.*Nr\.\s([0-9]+).*$").unwrap(),
    ]
});

static END_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}$").unwrap());

pub(crate) static RULES: LazyLock<RuleSet> = LazyLock::new(|| {
    RuleSet::builder(Dialect::Sru)
        .each("leader", DocKey::DocumentType, document_type)
        .each("001", DocKey::IdentifiedBy, |_, field, _| {
            local_identifier(field, "swisscovery")
        })
        .each("008", DocKey::Language, control_field)
        .each("020..", DocKey::IdentifiedBy, |_, field, _| {
            Ok(field
                .get_first('a')
                .map(|isbn| Entry::IdentifiedBy(vec![Identifier::new(IdentifierType::Isbn, isbn)])))
        })
        .each("022..", DocKey::IdentifiedBy, issn)
        .each("024..", DocKey::IdentifiedBy, standard_number)
        .each("027..", DocKey::IdentifiedBy, |_, field, _| {
            Ok(field
                .get_first('a')
                .map(|strn| Entry::IdentifiedBy(vec![Identifier::new(IdentifierType::Strn, strn)])))
        })
        .each("088..", DocKey::IdentifiedBy, |_, field, _| {
            Ok(field.get_first('a').map(|number| {
                Entry::IdentifiedBy(vec![Identifier::new(IdentifierType::ReportNumber, number)])
            }))
        })
        .each("245..", DocKey::Title, title)
        .each("250..", DocKey::EditionStatement, edition_statement)
        .each("264.1", DocKey::ProvisionActivity, publication)
        .each("264.3", DocKey::ProvisionActivity, manufacture)
        .single("300..", DocKey::Formats, description_from_300)
        .single("300..", DocKey::AdditionalMaterials, |_, fields, _| {
            Ok(fields
                .iter()
                .find_map(|f| f.get_first('e'))
                .map(|e| Entry::AdditionalMaterials(e.trim().to_string())))
        })
        .each("490..", DocKey::Series, series_from_490)
        .each("(500|504|508|510|511|530|545|555)..", DocKey::Notes, |_, field, _| {
            Ok(field.get_first('a').map(|a| Entry::Notes(vec![a.to_string()])))
        })
        .single("502..", DocKey::Dissertation, dissertation)
        .each("505..", DocKey::ContentNote, |_, field, _| {
            Ok(field.get_first('a').map(|a| Entry::ContentNote(vec![a.to_string()])))
        })
        .each("520..", DocKey::Abstracts, |doc, field, _| {
            Ok(field.get_first('a').map(|text| {
                Entry::Abstracts(vec![Label::with_language(text, record_language(doc))])
            }))
        })
        .each("(100|700|710|711)..", DocKey::Contribution, contribution)
        .each("773..", DocKey::PartOf, host_item)
        .each("(800|830)..", DocKey::PartOf, series_host)
        .each("856..", DocKey::Files, file_from_856)
        .build()
        .unwrap()
});

/// Language of the record's first language entry.
fn record_language(doc: &Document) -> String {
    doc.language
        .first()
        .map(|language| language.value.clone())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// Whether one of the 502 `$a`/`$b` values contains a keyword.
fn mentions(field: &Field, keywords: &[&str]) -> bool {
    ['a', 'b'].into_iter().any(|code| {
        field.get_first(code).is_some_and(|value| {
            let value = value.to_lowercase();
            keywords.iter().any(|keyword| value.contains(keyword))
        })
    })
}

fn thesis_type(field: &Field) -> Option<&'static str> {
    if mentions(field, &["bachelor"]) {
        return Some("coar:c_7a1f");
    }
    if mentions(field, &["master"]) {
        return Some("coar:c_bdcc");
    }
    if mentions(field, &["dissertation", "thèse"]) {
        return Some("coar:c_db06");
    }
    None
}

/// Document type from leader/06 and leader/07.
fn document_type(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(leader) = field.content() else {
        return Ok(None);
    };
    let mut positions = leader.chars().skip(6);
    let (type_of_record, level) = (positions.next(), positions.next());

    let document_type = match (type_of_record, level) {
        (Some('k'), _) => "coar:c_ecc8",
        (Some('c' | 'd'), _) => "coar:c_18cw",
        (Some('e' | 'f'), _) => "coar:c_12cc",
        (Some('g'), _) => "coar:c_8a7e",
        (Some('i' | 'j'), _) => "coar:c_18cc",
        (Some('m'), _) => "coar:c_ddb1",
        (Some('a'), Some('b')) => "coar:c_3e5a",
        (Some('a'), Some('a')) => "coar:c_3248",
        (Some('a'), Some('s')) => "coar:c_2659",
        (Some('a'), level) => {
            let theses: Vec<&Field> = ctx.record.fields_by_tag("502").collect();
            if theses.is_empty() {
                match level {
                    Some('m') => "coar:c_2f33",
                    _ => "coar:c_1843",
                }
            } else {
                theses
                    .iter()
                    .find_map(|field| thesis_type(field))
                    .unwrap_or("coar:c_46ec")
            }
        }
        _ => "coar:c_1843",
    };
    Ok(Some(Entry::DocumentType(document_type.to_string())))
}

/// 008: language from the characters before the last two, publication dates.
fn control_field(doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(content) = field.content() else {
        return Ok(None);
    };
    let chars: Vec<char> = content.chars().collect();
    let slice = |start: usize, end: usize| -> Option<String> {
        chars.get(start..end).map(|part| part.iter().collect())
    };

    let publication = publication_mut(doc);
    if let Some(end_date) = slice(11, 15).filter(|date| END_DATE_REGEX.is_match(date)) {
        publication.end_date = Some(end_date);
    }
    if let Some(start_date) = slice(7, 11) {
        ctx.offer_start_date(DateTier::ControlField, &start_date, DatePrecision::Day);
    }

    let language = chars
        .len()
        .checked_sub(5)
        .and_then(|start| slice(start, start + 3))
        .filter(|language| !language.trim().is_empty());
    Ok(language.map(|language| Entry::Language(vec![Language::new(language)])))
}

/// 022: ISSN `$a` and linking ISSN `$l`.
fn issn(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let identifiers: Vec<Identifier> = [('a', IdentifierType::Issn), ('l', IdentifierType::IssnL)]
        .into_iter()
        .filter_map(|(code, kind)| field.get_first(code).map(|value| Identifier::new(kind, value)))
        .collect();
    Ok((!identifiers.is_empty()).then_some(Entry::IdentifiedBy(identifiers)))
}

/// 024: typed by its `$2` scheme, other schemes become the local source.
fn standard_number(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let (Some(value), Some(scheme)) = (field.get_first('a'), field.get_first('2')) else {
        return Ok(None);
    };
    let identifier = match scheme {
        "doi" => Identifier::new(IdentifierType::Doi, value),
        "urn" => Identifier::new(IdentifierType::Urn, value),
        "uri" => Identifier::new(IdentifierType::Uri, value),
        _ => Identifier::new(IdentifierType::Local, value).with_source(scheme),
    };
    Ok(Some(Entry::IdentifiedBy(vec![identifier])))
}

fn title(doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(main_title) = field.get_first('a') else {
        return Ok(None);
    };
    let language = record_language(doc);
    let mut title = Title {
        main_title: vec![Label::with_language(
            main_title.trim_end_matches(':').trim(),
            language.clone(),
        )],
        ..Default::default()
    };
    if let Some(subtitle) = field.get_first('b') {
        title.subtitle.push(Label::with_language(subtitle, language));
    }
    Ok(Some(Entry::Title(vec![title])))
}

fn edition_statement(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(designation) = field.get_first('a') else {
        return Ok(None);
    };
    Ok(Some(Entry::EditionStatement(EditionStatement {
        edition_designation: vec![Label::new(designation)],
        responsibility: field.get_first('b').map(Label::new).into_iter().collect(),
    })))
}

/// 264 second indicator 1: statements appended to the publication.
fn publication(doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let mut statement = build_statement(
        field,
        ctx,
        &[('a', StatementType::Place), ('b', StatementType::Agent)],
    );
    statement.extend(date_statement(field, ctx, 'c'));
    publication_mut(doc).statement.extend(statement);

    if let Some(year) = field.get_first('c').and_then(leading_year) {
        ctx.offer_start_date(DateTier::ModernPublication, year, DatePrecision::Day);
    }
    Ok(None)
}

/// 264 second indicator 3: a manufacture entry of its own.
fn manufacture(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let mut activity = ProvisionActivity::new(ProvisionType::Manufacture);
    activity.statement = build_statement(
        field,
        ctx,
        &[('a', StatementType::Place), ('b', StatementType::Agent)],
    );
    activity.statement.extend(date_statement(field, ctx, 'c'));
    Ok(Some(Entry::ProvisionActivity(vec![activity])))
}

/// 502 of the first occurrence; its date does not compete for the start date.
fn dissertation(_doc: &mut Document, fields: &[&Field], ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(field) = fields.first() else {
        return Ok(None);
    };
    let degree: Vec<&str> = ['a', 'b']
        .into_iter()
        .filter_map(|code| field.get_first(code))
        .collect();
    if degree.is_empty() {
        return Ok(None);
    }

    let date = match extract_date(field.get_first('d')) {
        Ok((date, _)) => date,
        Err(err) => {
            debug!(bib_id = %ctx.bib_id, error = %err, "dissertation date ignored");
            None
        }
    };
    Ok(Some(Entry::Dissertation(Dissertation {
        degree: Some(degree.join(". ")),
        granting_institution: field.get_first('c').map(String::from),
        date,
        jury_note: None,
    })))
}

fn contribution(_doc: &mut Document, field: &Field, ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(name) = field.get_first('a') else {
        return Ok(None);
    };
    let (kind, separator, default) = match field.tag.as_str() {
        "710" => (AgentType::Organization, ". ", Role::Contributor),
        "711" => (AgentType::Meeting, ". ", Role::Contributor),
        _ => (AgentType::Person, " ", Role::Creator),
    };
    let mut agent = Agent::new(kind, join_name(name, field.get_all('b'), separator));

    match kind {
        AgentType::Person => {
            let dates: Option<String> = field.get_first('d').map(|d| d.chars().take(9).collect());
            match extract_date(dates.as_deref()) {
                Ok((birth, death)) => {
                    agent.date_of_birth = birth;
                    agent.date_of_death = death;
                }
                Err(err) => debug!(bib_id = %ctx.bib_id, error = %err, "contributor date ignored"),
            }
        }
        AgentType::Meeting => {
            agent.place = field.get_first('c').map(String::from);
            agent.date = field.get_first('d').map(String::from);
            agent.number = field.get_first('n').map(String::from);
        }
        AgentType::Organization => {}
    }

    let role = RoleResolver::new(ctx.reference)
        .with_default(default)
        .resolve(&field.get_all('4'), None)?;
    Ok(Some(Entry::Contribution(vec![Contribution::new(agent, role)])))
}

/// ISSN `$x` and ISBN `$z` of a host or series.
fn host_identifiers(field: &Field) -> Vec<Identifier> {
    [('x', IdentifierType::Issn), ('z', IdentifierType::Isbn)]
        .into_iter()
        .filter_map(|(code, kind)| field.get_first(code).map(|value| Identifier::new(kind, value)))
        .collect()
}

/// Last capture of the first group among `regexes`.
fn last_capture<'r>(regexes: impl IntoIterator<Item = &'r Regex>, value: &str) -> Option<String> {
    regexes
        .into_iter()
        .filter_map(|regex| regex.captures(value))
        .last()
        .map(|caps| caps[1].to_string())
}

/// 773: host title, contributors, identifiers and numbering parsed from `$g`.
fn host_item(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let Some(title) = field.get_first('t') else {
        return Ok(None);
    };
    let mut part_of = PartOf {
        document: HostDocument {
            title: Some(title.to_string()),
            contribution: field.get_all('a').into_iter().map(String::from).collect(),
            identified_by: host_identifiers(field),
            ..Default::default()
        },
        ..Default::default()
    };

    for numbering in field.get_all('g') {
        if let Some(pages) = last_capture([&*PAGES_REGEX], numbering) {
            part_of.numbering_pages = Some(pages);
        }
        if let Some(year) = last_capture(YEAR_REGEXES.iter(), numbering) {
            part_of.numbering_year = Some(year);
        }
        if let Some(volume) = last_capture([&*VOLUME_REGEX], numbering) {
            part_of.numbering_volume = Some(volume);
        }
        if let Some(issue) = last_capture(ISSUE_REGEXES.iter(), numbering) {
            part_of.numbering_issue = Some(issue);
        }
    }
    Ok(Some(Entry::PartOf(vec![part_of])))
}

/// 800 (title `$t`, contributors `$a`) and 830 (title `$a. $p`) series.
fn series_host(_doc: &mut Document, field: &Field, _ctx: &mut RecordContext<'_>) -> HandlerResult {
    let is_800 = field.tag == "800";
    let title = if is_800 {
        field.get_first('t').map(String::from)
    } else {
        let parts: Vec<&str> = ['a', 'p']
            .into_iter()
            .filter_map(|code| field.get_first(code))
            .collect();
        (!parts.is_empty()).then(|| parts.join(". "))
    };
    let Some(title) = title else {
        return Ok(None);
    };

    let contribution = match is_800 {
        true => field.get_all('a').into_iter().map(String::from).collect(),
        false => Vec::new(),
    };
    Ok(Some(Entry::PartOf(vec![PartOf {
        numbering_volume: field.get_first('v').map(String::from),
        document: HostDocument {
            title: Some(title),
            contribution,
            identified_by: host_identifiers(field),
            ..Default::default()
        },
        ..Default::default()
    }])))
}
