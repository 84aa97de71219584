//! Handler fragments shared by the MARC dialects.

use crate::context::RecordContext;
use crate::document::{
    Document, ElectronicLocator, Entry, FileEntry, Identifier, IdentifierType, Label, Language,
    OtherEdition, Series, Subject, SubjectLabel, Title,
};
use crate::engine::HandlerResult;
use crate::error::ValueError;
use crate::provision::{dated_publication, leading_year};
use crate::record::Field;
use crate::regex::Regex;
use crate::utils::{non_blank, remove_trailing_punctuation};
use std::sync::LazyLock;
use tracing::warn;

static FILE_ORDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"order:([0-9]+)$").unwrap());

/// Order of files without an explicit position.
pub(crate) const DEFAULT_FILE_ORDER: u32 = 99;

const SKIPPED_MIME_TYPE: &str = "pdt/download";

/// Language used when a field carries no `$9`.
pub(crate) const DEFAULT_LANGUAGE: &str = "eng";

/// Main title of repository records without a 245$a.
pub(crate) const NO_TITLE: &str = "No title found";

/// Local identifier from the content of a control field.
pub(crate) fn local_identifier(field: &Field, source: &str) -> HandlerResult {
    Ok(non_blank(field.content()).map(|value| {
        Entry::IdentifiedBy(vec![
            Identifier::new(IdentifierType::Local, value).with_source(source),
        ])
    }))
}

/// 041: one language per `$a`.
pub(crate) fn languages_from_041(
    _doc: &mut Document,
    field: &Field,
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let languages: Vec<Language> = field.get_all('a').into_iter().map(Language::new).collect();
    Ok((!languages.is_empty()).then_some(Entry::Language(languages)))
}

/// 245: `$a` main title (else `fallback`), `$b` subtitle, both tagged with
/// `$9`.
pub(crate) fn title_with_language(field: &Field, fallback: Option<&str>) -> Option<Title> {
    let main_title = field.get_first('a').or(fallback)?;
    let language = field.get_first('9').unwrap_or(DEFAULT_LANGUAGE);
    let mut title = Title {
        main_title: vec![Label::with_language(main_title, language)],
        ..Default::default()
    };
    if let Some(subtitle) = field.get_first('b') {
        title.subtitle.push(Label::with_language(subtitle, language));
    }
    Some(title)
}

/// 520: `$a` tagged with `$9`.
pub(crate) fn abstract_from_520(
    _doc: &mut Document,
    field: &Field,
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    Ok(field.get_first('a').map(|text| {
        let language = field.get_first('9').unwrap_or(DEFAULT_LANGUAGE);
        Entry::Abstracts(vec![Label::with_language(text, language)])
    }))
}

/// Subject entry holding `language`, created at the end when missing.
pub(crate) fn subject_for_language<'d>(doc: &'d mut Document, language: &str) -> &'d mut Subject {
    let index = match doc
        .subjects
        .iter()
        .position(|s| s.label.language.as_deref() == Some(language))
    {
        Some(index) => index,
        None => {
            doc.subjects.push(Subject {
                label: SubjectLabel {
                    language: Some(language.to_string()),
                    value: Vec::new(),
                },
                source: None,
            });
            doc.subjects.len() - 1
        }
    };
    &mut doc.subjects[index]
}

/// 300: extent and other characteristics from the first occurrence holding
/// them, formats from the first occurrence holding `$c`.
pub(crate) fn description_from_300(
    doc: &mut Document,
    fields: &[&Field],
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    if doc.extent.is_none()
        && let Some(extent) = fields.iter().find_map(|f| f.get_first('a'))
    {
        doc.extent = Some(remove_trailing_punctuation(extent));
    }
    if doc.other_material_characteristics.is_none()
        && let Some(other) = fields.iter().find_map(|f| f.get_first('b'))
    {
        doc.other_material_characteristics = Some(remove_trailing_punctuation(other));
    }
    if !doc.formats.is_empty() {
        return Ok(None);
    }
    Ok(fields
        .iter()
        .map(|f| f.get_all('c'))
        .find(|formats| !formats.is_empty())
        .map(|formats| Entry::Formats(formats.into_iter().map(|c| c.trim().to_string()).collect())))
}

/// 490: `$a` values as the name, `$v` values as the number.
pub(crate) fn series_from_490(
    _doc: &mut Document,
    field: &Field,
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let names = field.get_all('a');
    if names.is_empty() {
        return Ok(None);
    }
    let numbers = field.get_all('v');
    Ok(Some(Entry::Series(vec![Series {
        name: names.join(", "),
        number: (!numbers.is_empty()).then(|| numbers.join(", ")),
    }])))
}

/// 600 (with source `$2`) and 695 (with language `$9`): `$a` split on ` ; `.
pub(crate) fn subjects_from_600_695(
    _doc: &mut Document,
    field: &Field,
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let Some(terms) = field.get_first('a') else {
        return Ok(None);
    };
    let value: Vec<String> = terms
        .split(" ; ")
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(String::from)
        .collect();

    let mut subject = Subject {
        label: SubjectLabel {
            language: None,
            value,
        },
        source: None,
    };
    match field.tag.as_str() {
        "695" => match field.get_first('9') {
            Some(language) => subject.label.language = Some(language.to_string()),
            None => return Ok(None),
        },
        _ => match field.get_first('2') {
            Some(source) => subject.source = Some(source.to_string()),
            None => return Ok(None),
        },
    }
    Ok(Some(Entry::Subjects(vec![subject])))
}

/// 856: file with its key (`$f`), url (`$u`), label (`$z`), position
/// (`order:N` in `$y`) and size (`$s`).
pub(crate) fn file_from_856(
    _doc: &mut Document,
    field: &Field,
    ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let (Some(key), Some(url)) = (field.get_first('f'), field.get_first('u')) else {
        return Ok(None);
    };
    let mime_type = field.get_first('q');
    if mime_type == Some(SKIPPED_MIME_TYPE) {
        warn!(bib_id = %ctx.bib_id, file = key, "file with pdt/download mime type skipped");
        return Ok(None);
    }

    let order = field
        .get_first('y')
        .and_then(|y| FILE_ORDER_REGEX.captures(y.trim()))
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(DEFAULT_FILE_ORDER);

    Ok(Some(Entry::Files(vec![FileEntry {
        kind: "file".to_string(),
        key: Some(key.to_string()),
        url: url.trim().to_string(),
        label: Some(field.get_first('z').unwrap_or(key).to_string()),
        order,
        mime_type: mime_type.map(String::from),
        size: field.get_first('s').and_then(|s| s.trim().parse().ok()),
    }])))
}

/// 775: other edition with its locator (`$o`) and public note (`$g`).
pub(crate) fn other_edition_from_775(
    _doc: &mut Document,
    field: &Field,
    _ctx: &mut RecordContext<'_>,
) -> HandlerResult {
    let (Some(locator), Some(note)) = (field.get_first('o'), field.get_first('g')) else {
        return Ok(None);
    };
    Ok(Some(Entry::OtherEdition(vec![OtherEdition {
        document: ElectronicLocator {
            electronic_locator: locator.to_string(),
        },
        public_note: note.to_string(),
    }])))
}

/// Host items without a numbering year take the year of the dated
/// publication; those still without one are dropped.
pub(crate) fn host_year_from_start_date(
    doc: &mut Document,
    _ctx: &mut RecordContext<'_>,
) -> Result<(), ValueError> {
    let year = dated_publication(doc)
        .and_then(|publication| publication.start_date.as_deref())
        .and_then(leading_year)
        .map(String::from);
    doc.part_of.retain_mut(|part_of| {
        if part_of.numbering_year.is_none() {
            part_of.numbering_year = year.clone();
        }
        part_of.numbering_year.is_some()
    });
    Ok(())
}
