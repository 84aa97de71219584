//! Contributors, canonical roles and controlled affiliations.
//!
//! Roles are resolved in a fixed order:
//! 1. explicit codes or labels (dialect label table, then the relator table)
//! 2. the dialect's document-type fallback table
//! 3. the dialect's field-family default
//!
//! When none applies the contributor cannot be classified and the record is
//! rejected with [`ValueError::NoRole`].

use crate::error::{ValueError, fields};
use crate::reference::ReferenceData;
use crate::regex::Regex;
use crate::utils::non_blank;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static FULL_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4}-[0-9]{2}-[0-9]{2})$").unwrap());

static YEAR_RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{4})$").unwrap());

static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{4})-?").unwrap());

/// Canonical contributor role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "cre")]
    Creator,
    #[serde(rename = "ctb")]
    Contributor,
    #[serde(rename = "edt")]
    Editor,
    #[serde(rename = "prt")]
    Printer,
    #[serde(rename = "dgs")]
    DegreeSupervisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creator => "cre",
            Role::Contributor => "ctb",
            Role::Editor => "edt",
            Role::Printer => "prt",
            Role::DegreeSupervisor => "dgs",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cre" => Ok(Role::Creator),
            "ctb" => Ok(Role::Contributor),
            "edt" => Ok(Role::Editor),
            "prt" => Ok(Role::Printer),
            "dgs" => Ok(Role::DegreeSupervisor),
            other => Err(format!("unknown role \"{}\"", other)),
        }
    }
}

/// Splits a life or event date into `(birth, death)`.
///
/// Accepted forms: `YYYY-MM-DD` (birth only), `YYYY-YYYY`, and anything
/// starting with a four digit year (`YYYY`, `YYYY-`), which gives the birth
/// year only.
pub fn extract_date(value: Option<&str>) -> Result<(Option<String>, Option<String>), ValueError> {
    let Some(value) = non_blank(value).map(str::trim) else {
        return Ok((None, None));
    };

    if let Some(caps) = FULL_DATE_REGEX.captures(value) {
        return Ok((Some(caps[1].to_string()), None));
    }
    if let Some(caps) = YEAR_RANGE_REGEX.captures(value) {
        return Ok((Some(caps[1].to_string()), Some(caps[2].to_string())));
    }
    if let Some(caps) = YEAR_REGEX.captures(value) {
        return Ok((Some(caps[1].to_string()), None));
    }

    Err(ValueError::BadDate {
        field: fields::CONTRIBUTION,
        value: value.to_string(),
    })
}

/// Display name from a main part and qualifier parts.
pub fn join_name<'a>(
    main: &str,
    parts: impl IntoIterator<Item = &'a str>,
    separator: &str,
) -> String {
    let mut name = main.trim().to_string();
    for part in parts {
        let part = part.trim();
        if !part.is_empty() {
            name.push_str(separator);
            name.push_str(part);
        }
    }
    name
}

/// Canonical aliases of every affiliation group matched by `text`.
///
/// Matching is a case-insensitive substring test; each group contributes at
/// most once, in table order.
pub fn controlled_affiliations(reference: &ReferenceData, text: &str) -> Vec<String> {
    let text = text.to_lowercase();
    if text.trim().is_empty() {
        return Vec::new();
    }
    reference
        .affiliation_groups()
        .iter()
        .filter(|group| {
            group
                .iter()
                .any(|alias| !alias.is_empty() && text.contains(&alias.to_lowercase()))
        })
        .filter_map(|group| group.first().cloned())
        .collect()
}

/// Resolves a canonical role for one contributor field.
#[derive(Clone, Copy)]
pub struct RoleResolver<'a> {
    reference: &'a ReferenceData,
    labels: &'a [(&'a str, Role)],
    type_roles: &'a [(&'a str, Role)],
    default: Option<Role>,
}

impl<'a> RoleResolver<'a> {
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self {
            reference,
            labels: &[],
            type_roles: &[],
            default: None,
        }
    }

    /// Free-text role labels matched exactly before the relator table.
    #[must_use]
    pub fn with_labels(mut self, labels: &'a [(&'a str, Role)]) -> Self {
        self.labels = labels;
        self
    }

    /// Fallback used when the field carries no role, keyed by document type.
    #[must_use]
    pub fn with_type_roles(mut self, type_roles: &'a [(&'a str, Role)]) -> Self {
        self.type_roles = type_roles;
        self
    }

    /// Role of last resort for the field family.
    #[must_use]
    pub fn with_default(mut self, role: Role) -> Self {
        self.default = Some(role);
        self
    }

    fn lookup(&self, code: &str) -> Option<Role> {
        let code = code.trim();
        self.labels
            .iter()
            .find(|(label, _)| *label == code)
            .map(|(_, role)| *role)
            .or_else(|| self.reference.relator_role(code))
    }

    /// Resolves the role from the field's codes (the last resolvable one
    /// wins) and the record's document type.
    pub fn resolve(&self, codes: &[&str], document_type: Option<&str>) -> Result<Role, ValueError> {
        let codes: Vec<&str> = codes
            .iter()
            .copied()
            .filter(|code| !code.trim().is_empty())
            .collect();

        if let Some(role) = codes.iter().filter_map(|code| self.lookup(code)).last() {
            return Ok(role);
        }

        if let Some(code) = codes.first() {
            return self.default.ok_or_else(|| ValueError::NoRole {
                field: fields::CONTRIBUTION,
                label: Some(code.trim().to_string()),
            });
        }

        if let Some(document_type) = non_blank(document_type)
            && let Some((_, role)) = self
                .type_roles
                .iter()
                .find(|(doc_type, _)| *doc_type == document_type.trim())
        {
            return Ok(*role);
        }

        self.default.ok_or(ValueError::NoRole {
            field: fields::CONTRIBUTION,
            label: None,
        })
    }
}
