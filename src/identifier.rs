//! Typed identifiers from the standard MARC identifier families.
//!
//! Each function reads one field occurrence and returns every identifier it
//! carries, in subfield order. A field without its required subfield gives
//! an empty list. Values are never de-duplicated.

use crate::document::{Identifier, IdentifierType};
use crate::record::Field;
use crate::regex::Regex;
use crate::utils::split_qualifier;
use std::sync::LazyLock;

/// Status of identifiers read from cancelled or invalid subfields.
pub const INVALID_STATUS: &str = "invalid or cancelled";

static SYSTEM_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([^)]+)\)\s*(.+)$").unwrap());

static EAN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^97").unwrap());

/// Identifier type from a `$2` source scheme. `None` means the scheme is
/// kept as the identifier source of a local identifier.
pub fn scheme_type(scheme: &str) -> Option<IdentifierType> {
    match scheme.trim().to_lowercase().as_str() {
        "doi" => Some(IdentifierType::Doi),
        "urn" => Some(IdentifierType::Urn),
        "uri" => Some(IdentifierType::Uri),
        "isan" => Some(IdentifierType::Isan),
        "istc" => Some(IdentifierType::Istc),
        "gtin-14" => Some(IdentifierType::Gtin14Number),
        "pmid" => Some(IdentifierType::Pmid),
        _ => None,
    }
}

/// Identifier type of a 024 field from its first indicator.
fn standard_number_type(ind1: char, value: &str) -> IdentifierType {
    match ind1 {
        '0' => IdentifierType::Isrc,
        '1' => IdentifierType::Upc,
        '2' => IdentifierType::Ismn,
        '3' if EAN_REGEX.is_match(value) => IdentifierType::Ean,
        _ => IdentifierType::Identifier,
    }
}

fn publisher_number_type(ind1: char) -> IdentifierType {
    match ind1 {
        '0' => IdentifierType::AudioIssueNumber,
        '1' => IdentifierType::MatrixNumber,
        '2' => IdentifierType::MusicPlate,
        '3' => IdentifierType::MusicPublisherNumber,
        '4' => IdentifierType::VideoRecordingNumber,
        '6' => IdentifierType::MusicDistributorNumber,
        _ => IdentifierType::PublisherNumber,
    }
}

fn join_qualifiers(first: Option<String>, extra: Vec<&str>) -> Option<String> {
    let qualifiers: Vec<String> = first
        .into_iter()
        .chain(extra.into_iter().map(|q| q.trim().to_string()))
        .filter(|q| !q.is_empty())
        .collect();
    (!qualifiers.is_empty()).then(|| qualifiers.join(", "))
}

/// Values of `code` as invalid identifiers of `kind`.
fn invalid(field: &Field, code: char, kind: IdentifierType) -> impl Iterator<Item = Identifier> + '_ {
    field
        .get_all(code)
        .into_iter()
        .map(move |value| Identifier::new(kind, value.trim()).with_status(INVALID_STATUS))
}

/// 020: ISBN (`$a`, qualifiers from a trailing parenthetical and `$q`,
/// acquisition terms `$c`, invalid `$z`).
pub fn isbn(field: &Field) -> Vec<Identifier> {
    let extra_qualifiers = field.get_all('q');
    let terms = field.get_first('c').map(|c| c.trim().to_string());

    let mut identifiers: Vec<Identifier> = field
        .get_all('a')
        .into_iter()
        .filter_map(|raw| {
            let (value, qualifier) = split_qualifier(raw);
            if value.is_empty() {
                return None;
            }
            let mut identifier = Identifier::new(IdentifierType::Isbn, value)
                .with_qualifier(join_qualifiers(qualifier, extra_qualifiers.clone()));
            identifier.acquisition_terms = terms.clone();
            Some(identifier)
        })
        .collect();

    identifiers.extend(invalid(field, 'z', IdentifierType::Isbn));
    identifiers
}

/// 022: ISSN (`$a`), linking ISSN (`$l`), incorrect or cancelled ISSN
/// (`$y`, `$z`).
pub fn issn(field: &Field) -> Vec<Identifier> {
    let mut identifiers = Vec::new();
    for subfield in field.subfields() {
        let value = subfield.value.trim();
        if value.is_empty() {
            continue;
        }
        match subfield.code {
            'a' => identifiers.push(Identifier::new(IdentifierType::Issn, value)),
            'l' => identifiers.push(Identifier::new(IdentifierType::IssnL, value)),
            'y' | 'z' => identifiers
                .push(Identifier::new(IdentifierType::Issn, value).with_status(INVALID_STATUS)),
            _ => {}
        }
    }
    identifiers
}

/// 024: standard numbers, typed by the first indicator or, for indicator
/// `7`, by the `$2` scheme.
pub fn standard_number(field: &Field) -> Vec<Identifier> {
    let Some(raw) = field.get_first('a') else {
        return invalid_standard_numbers(field);
    };

    let mut value = raw.trim().to_string();
    if let Some(additional) = field.get_first('d') {
        value.push(' ');
        value.push_str(additional.trim());
    }

    let mut identifier = match field.ind1 {
        '7' => match field.get_first('2') {
            Some(scheme) => match scheme_type(scheme) {
                Some(kind) => Identifier::new(kind, value),
                None => Identifier::new(IdentifierType::Local, value).with_source(scheme.trim()),
            },
            None => Identifier::new(IdentifierType::Identifier, value),
        },
        ind1 => Identifier::new(standard_number_type(ind1, &value), value),
    };
    identifier = identifier.with_qualifier(join_qualifiers(None, field.get_all('q')));

    let mut identifiers = vec![identifier];
    identifiers.extend(invalid_standard_numbers(field));
    identifiers
}

fn invalid_standard_numbers(field: &Field) -> Vec<Identifier> {
    field
        .get_all('z')
        .into_iter()
        .map(|value| {
            let kind = match field.ind1 {
                '7' => field
                    .get_first('2')
                    .and_then(scheme_type)
                    .unwrap_or(IdentifierType::Identifier),
                ind1 => standard_number_type(ind1, value),
            };
            Identifier::new(kind, value.trim()).with_status(INVALID_STATUS)
        })
        .collect()
}

/// 027: standard technical report number.
pub fn technical_report_number(field: &Field) -> Vec<Identifier> {
    let mut identifiers: Vec<Identifier> = field
        .get_all('a')
        .into_iter()
        .map(|value| Identifier::new(IdentifierType::Strn, value.trim()))
        .collect();
    identifiers.extend(invalid(field, 'z', IdentifierType::Strn));
    identifiers
}

/// 028: publisher numbers, typed by the first indicator, with the
/// publisher (`$b`) as source.
pub fn publisher_number(field: &Field) -> Vec<Identifier> {
    let Some(value) = field.get_first('a') else {
        return Vec::new();
    };
    let mut identifier = Identifier::new(publisher_number_type(field.ind1), value.trim())
        .with_qualifier(join_qualifiers(None, field.get_all('q')));
    identifier.source = field.get_first('b').map(|b| b.trim().to_string());
    vec![identifier]
}

/// 035: system control numbers, `(SOURCE)value`.
pub fn system_number(field: &Field) -> Vec<Identifier> {
    field
        .get_all('a')
        .into_iter()
        .map(|raw| {
            let raw = raw.trim();
            match SYSTEM_NUMBER_REGEX.captures(raw) {
                Some(caps) => Identifier::new(IdentifierType::Local, caps[2].trim())
                    .with_source(caps[1].trim()),
                None => Identifier::new(IdentifierType::Local, raw),
            }
        })
        .collect()
}

/// 037: source of acquisition, a local number with its source (`$b`).
pub fn acquisition_number(field: &Field) -> Vec<Identifier> {
    let Some(value) = field.get_first('a') else {
        return Vec::new();
    };
    let mut identifier = Identifier::new(IdentifierType::Local, value.trim());
    identifier.source = field.get_first('b').map(|b| b.trim().to_string());
    identifier.acquisition_terms = field.get_first('c').map(|c| c.trim().to_string());
    vec![identifier]
}

/// 088: report number.
pub fn report_number(field: &Field) -> Vec<Identifier> {
    let mut identifiers: Vec<Identifier> = field
        .get_all('a')
        .into_iter()
        .map(|value| Identifier::new(IdentifierType::ReportNumber, value.trim()))
        .collect();
    identifiers.extend(invalid(field, 'z', IdentifierType::ReportNumber));
    identifiers
}

/// Identifiers of any standard family, dispatched on the field tag.
/// Unknown tags give a generic identifier from `$a`.
pub fn from_field(field: &Field) -> Vec<Identifier> {
    match field.tag.as_str() {
        "020" => isbn(field),
        "022" => issn(field),
        "024" => standard_number(field),
        "027" => technical_report_number(field),
        "028" => publisher_number(field),
        "035" => system_number(field),
        "037" => acquisition_number(field),
        "088" => report_number(field),
        _ => field
            .get_all('a')
            .into_iter()
            .map(|value| Identifier::new(IdentifierType::Identifier, value.trim()))
            .collect(),
    }
}
