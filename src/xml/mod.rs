//! XML input adapters.
//!
//! Harvesters deliver MARC dialects as MARCXML and OAI-PMH dialects as plain
//! XML. This module turns the former into [`RawRecord`]s and the latter into
//! JSON trees in the `@attr` / `#text` convention read by the tree dialects.
//!
//! Both adapters stream the input with quick-xml and keep namespace prefixes
//! out of MARCXML element matching (`marc:record` and `record` are the same).

mod marc;
mod tree;

use crate::Result;
use crate::error::TransformError;
use crate::record::RawRecord;
use quick_xml::events::BytesStart;
use serde_json::Value;

/// Parses every `record` element of a MARCXML document.
///
/// Collection wrappers and unknown elements are skipped. Blank indicators
/// and missing indicator attributes both become `' '`.
///
/// # Errors
///
/// Returns [`TransformError::Xml`] for malformed XML, or for a `controlfield`,
/// `datafield` or `subfield` element missing its `tag` / `code` attribute.
///
/// # Examples
///
/// ```
/// use bibnorm::xml::parse_marcxml;
///
/// let xml = r#"<collection xmlns="http://www.loc.gov/MARC21/slim">
///   <record>
///     <leader>00000nam a2200000 a 4500</leader>
///     <controlfield tag="001">R004567655</controlfield>
///     <datafield tag="245" ind1="1" ind2="0">
///       <subfield code="a">Histoire de Lausanne</subfield>
///     </datafield>
///   </record>
/// </collection>"#;
///
/// let records = parse_marcxml(xml).unwrap();
/// assert_eq!(records[0].control("001"), Some("R004567655"));
/// assert_eq!(records[0].first_subfield("245", 'a'), Some("Histoire de Lausanne"));
/// ```
pub fn parse_marcxml(content: &str) -> Result<Vec<RawRecord>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    marc::parse(content)
}

/// Converts an XML document into a JSON tree.
///
/// The root element becomes the single key of the returned object.
/// Attributes are stored as `@name`, text next to attributes or children as
/// `#text`, and elements repeated under one parent become arrays. Elements
/// holding only text become strings, empty elements `null`.
///
/// # Errors
///
/// Returns [`TransformError::Xml`] for malformed or truncated XML.
///
/// # Examples
///
/// ```
/// use bibnorm::xml::xml_to_json;
/// use serde_json::json;
///
/// let tree = xml_to_json(r#"<record><title lang="en">Alps</title><subject>a</subject><subject>b</subject></record>"#).unwrap();
/// assert_eq!(
///     tree,
///     json!({"record": {
///         "title": {"@lang": "en", "#text": "Alps"},
///         "subject": ["a", "b"]
///     }})
/// );
/// ```
pub fn xml_to_json(content: &str) -> Result<Value> {
    tree::convert(content)
}

/// Unescaped value of an attribute, matched on its local name.
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Every attribute of the element under its qualified name, unescaped.
fn attribute_pairs(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    element
        .attributes()
        .map(|attr| -> Result<(String, String)> {
            let attr = attr?;
            Ok((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                attr.unescape_value()?.into_owned(),
            ))
        })
        .collect()
}

/// Attribute that must be present on the element.
fn required_attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<String> {
    attribute(element, name)?.ok_or_else(|| {
        TransformError::Xml(format!(
            "<{}> without a \"{}\" attribute",
            String::from_utf8_lossy(element.name().as_ref()),
            String::from_utf8_lossy(name)
        ))
    })
}
