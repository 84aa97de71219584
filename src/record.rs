//! Raw record model.
//!
//! A [`RawRecord`] is an ordered multiset of [`Field`]s. Order is preserved
//! exactly as harvested because several rules are "first of many wins".

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Dispatch key used for the record leader.
pub const LEADER_KEY: &str = "leader";

const LEADER_TAG: &str = "LDR";

/// A single (code, value) pair of a data field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Subfield {
    pub fn new(code: char, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }
}

/// Content of a field: a scalar for control fields, subfields otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Control(String),
    Data(Vec<Subfield>),
}

/// A tagged field of a raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub tag: CompactString,
    pub ind1: char,
    pub ind2: char,
    pub value: FieldValue,
}

impl Field {
    /// Create a control field (no indicators, scalar content).
    pub fn control(tag: &str, content: impl Into<String>) -> Self {
        Self {
            tag: CompactString::from(tag),
            ind1: ' ',
            ind2: ' ',
            value: FieldValue::Control(content.into()),
        }
    }

    /// Create an empty data field.
    pub fn data(tag: &str, ind1: char, ind2: char) -> Self {
        Self {
            tag: CompactString::from(tag),
            ind1,
            ind2,
            value: FieldValue::Data(Vec::new()),
        }
    }

    /// Append a subfield, builder style. Ignored on control fields.
    #[must_use]
    pub fn with_subfield(mut self, code: char, value: impl Into<String>) -> Self {
        self.push_subfield(code, value);
        self
    }

    pub fn push_subfield(&mut self, code: char, value: impl Into<String>) {
        if let FieldValue::Data(subfields) = &mut self.value {
            subfields.push(Subfield::new(code, value));
        }
    }

    /// Key matched by rule patterns: the tag for control fields, otherwise
    /// tag and both indicators with blanks written as `_`.
    pub fn key(&self) -> String {
        if self.tag == LEADER_TAG {
            return LEADER_KEY.to_string();
        }
        match self.value {
            FieldValue::Control(_) => self.tag.to_string(),
            FieldValue::Data(_) => {
                let mut key = String::with_capacity(5);
                key.push_str(&self.tag);
                key.push(blank_as_underscore(self.ind1));
                key.push(blank_as_underscore(self.ind2));
                key
            }
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self.value, FieldValue::Control(_))
    }

    /// Scalar content of a control field.
    pub fn content(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Control(content) => Some(content),
            FieldValue::Data(_) => None,
        }
    }

    /// All subfields in order, empty for control fields.
    pub fn subfields(&self) -> &[Subfield] {
        match &self.value {
            FieldValue::Data(subfields) => subfields,
            FieldValue::Control(_) => &[],
        }
    }

    /// First non-blank value of a subfield code.
    pub fn get_first(&self, code: char) -> Option<&str> {
        self.subfields()
            .iter()
            .filter(|s| s.code == code)
            .map(|s| s.value.as_str())
            .find(|v| !v.trim().is_empty())
    }

    /// Last non-blank value of a subfield code.
    pub fn get_last(&self, code: char) -> Option<&str> {
        self.subfields()
            .iter()
            .rev()
            .filter(|s| s.code == code)
            .map(|s| s.value.as_str())
            .find(|v| !v.trim().is_empty())
    }

    /// All non-blank values of a subfield code, in order.
    pub fn get_all(&self, code: char) -> Vec<&str> {
        self.subfields()
            .iter()
            .filter(|s| s.code == code && !s.value.trim().is_empty())
            .map(|s| s.value.as_str())
            .collect()
    }

    pub fn has_subfield(&self, code: char) -> bool {
        self.get_first(code).is_some()
    }

    /// Subfield at an absolute position.
    pub fn subfield_at(&self, index: usize) -> Option<&Subfield> {
        self.subfields().get(index)
    }

    /// Link data from `$6`, as `(tag, link_id)`.
    ///
    /// `880-01` in a host field gives `("880", "01")`, `245-01/(S` in an
    /// alternate field gives `("245", "01")`.
    pub fn link(&self) -> Option<(&str, &str)> {
        let value = self.get_first('6')?;
        let (tag, rest) = value.split_once('-')?;
        let link_id = rest.split('/').next().unwrap_or_default();
        if link_id.is_empty() {
            return None;
        }
        Some((tag, link_id))
    }
}

fn blank_as_underscore(ind: char) -> char {
    if ind == ' ' { '_' } else { ind }
}

/// A harvested bibliographic record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub leader: Option<String>,
    pub fields: Vec<Field>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_leader(mut self, leader: impl Into<String>) -> Self {
        self.leader = Some(leader.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Content of the first control field with the given tag.
    pub fn control(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .filter(|f| f.tag == tag)
            .find_map(Field::content)
    }

    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    /// First non-blank subfield value of the first field with `tag` holding it.
    pub fn first_subfield(&self, tag: &str, code: char) -> Option<&str> {
        self.fields
            .iter()
            .filter(|f| f.tag == tag)
            .find_map(|f| f.get_first(code))
    }

    /// Fields to dispatch: the leader (as a pseudo control field) then the
    /// record fields in order.
    pub(crate) fn dispatch_fields(&self) -> Vec<Field> {
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        if let Some(leader) = &self.leader {
            fields.push(Field::control(LEADER_TAG, leader.clone()));
        }
        fields.extend(self.fields.iter().cloned());
        fields
    }
}
