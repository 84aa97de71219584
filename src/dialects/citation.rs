//! Parts shared by the citation API dialects (Crossref, Medline).

use crate::context::RecordContext;
use crate::dialects::common::DEFAULT_LANGUAGE;
use crate::dialects::tree::text;
use crate::document::{Document, Identifier, IdentifierType, Language};
use crate::utils::format_doi;
use serde_json::Value;

/// Every citation record is a journal article.
pub(crate) const DOCUMENT_TYPE: &str = "coar:c_6501";

/// DOI the record is keyed by.
pub(crate) fn record_id(value: &Value) -> Option<String> {
    value.get("_id").and_then(text)
}

/// Bibliographic code of the record language. Two letter codes are looked
/// up, three letter codes kept, anything else is English.
pub(crate) fn language(value: &Value, ctx: &RecordContext<'_>) -> String {
    let Some(code) = value.get("language").and_then(text) else {
        return DEFAULT_LANGUAGE.to_string();
    };
    let code = code.to_lowercase();
    match ctx.reference.alpha3(&code) {
        Some(alpha3) => alpha3.to_string(),
        None if code.chars().count() == 3 => code,
        None => DEFAULT_LANGUAGE.to_string(),
    }
}

/// Document with the language, DOI and type every citation record carries.
pub(crate) fn base_document(value: &Value, language: &str) -> Document {
    let mut doc = Document::new();
    doc.document_type = Some(DOCUMENT_TYPE.to_string());
    doc.language.push(Language::new(language));
    if let Some(id) = record_id(value) {
        let doi = format_doi(&id).unwrap_or(id);
        doc.identified_by
            .push(Identifier::new(IdentifierType::Doi, doi));
    }
    doc
}
