//! MARCXML reader.

use super::{attribute, required_attribute};
use crate::Result;
use crate::error::TransformError;
use crate::record::{Field, RawRecord};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

/// Element whose text is being collected.
enum Target {
    Leader,
    Control(String),
    Subfield(char),
}

fn indicator(element: &BytesStart<'_>, name: &[u8]) -> Result<char> {
    Ok(attribute(element, name)?
        .and_then(|value| value.chars().next())
        .unwrap_or(' '))
}

fn subfield_code(element: &BytesStart<'_>) -> Result<char> {
    let code = required_attribute(element, b"code")?;
    code.chars()
        .next()
        .ok_or_else(|| TransformError::Xml("<subfield> with an empty code".to_string()))
}

fn data_field(element: &BytesStart<'_>) -> Result<Field> {
    let tag = required_attribute(element, b"tag")?;
    Ok(Field::data(
        &tag,
        indicator(element, b"ind1")?,
        indicator(element, b"ind2")?,
    ))
}

pub(super) fn parse(content: &str) -> Result<Vec<RawRecord>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut record: Option<RawRecord> = None;
    let mut field: Option<Field> = None;
    let mut target: Option<Target> = None;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"record" => record = Some(RawRecord::new()),
                b"leader" => target = Some(Target::Leader),
                b"controlfield" => {
                    target = Some(Target::Control(required_attribute(e, b"tag")?));
                }
                b"datafield" => field = Some(data_field(e)?),
                b"subfield" => target = Some(Target::Subfield(subfield_code(e)?)),
                _ => (),
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"datafield" => {
                    if let Some(record) = record.as_mut() {
                        record.push(data_field(e)?);
                    }
                }
                b"controlfield" => {
                    let tag = required_attribute(e, b"tag")?;
                    if let Some(record) = record.as_mut() {
                        record.push(Field::control(&tag, ""));
                    }
                }
                _ => (),
            },
            Event::Text(ref e) if target.is_some() => text.push_str(&e.unescape()?),
            Event::CData(ref e) if target.is_some() => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"record" => {
                    if let Some(record) = record.take() {
                        records.push(record);
                    }
                }
                b"datafield" => {
                    if let (Some(record), Some(field)) = (record.as_mut(), field.take()) {
                        record.push(field);
                    }
                }
                b"leader" | b"controlfield" | b"subfield" => {
                    let value = std::mem::take(&mut text);
                    match (target.take(), record.as_mut()) {
                        (Some(Target::Leader), Some(record)) => record.leader = Some(value),
                        (Some(Target::Control(tag)), Some(record)) => {
                            record.push(Field::control(&tag, value));
                        }
                        (Some(Target::Subfield(code)), _) => {
                            if let Some(field) = field.as_mut() {
                                field.push_subfield(code, value);
                            }
                        }
                        _ => (),
                    }
                }
                _ => (),
            },
            Event::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    debug!(records = records.len(), "MARCXML parsed");
    Ok(records)
}
