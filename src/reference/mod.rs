//! Process-wide lookup tables.
//!
//! [`ReferenceData`] is loaded once and shared read-only by every
//! transformation. Loading failures are the only errors that should stop a
//! whole batch, since every record depends on these tables.
//!
//! # Example
//!
//! ```
//! use bibnorm::reference::ReferenceData;
//!
//! let reference = ReferenceData::global().unwrap();
//! assert_eq!(reference.alpha2("ger"), Some("de"));
//! ```

mod config;

pub use config::ReferenceConfig;

use crate::contribution::Role;
use crate::error::ReferenceDataError;
use compact_str::CompactString;
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static GLOBAL: OnceLock<Arc<ReferenceData>> = OnceLock::new();

/// Immutable lookup tables shared by all transformations.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    alpha3_to_alpha2: HashMap<CompactString, CompactString>,
    alpha2_to_alpha3: HashMap<CompactString, CompactString>,
    relators: HashMap<CompactString, Role>,
    affiliations: Vec<Vec<String>>,
}

impl ReferenceData {
    /// Loads all tables described by `config`.
    pub fn load(config: &ReferenceConfig) -> Result<Self, ReferenceDataError> {
        let mut data = Self::default();

        for record in read_table("languages", &config.languages, config.delimiter, true)? {
            let (row, record) = record;
            let (alpha3, alpha2) = two_columns("languages", row, &record)?;
            data.alpha2_to_alpha3
                .entry(CompactString::from(alpha2))
                .or_insert_with(|| CompactString::from(alpha3));
            data.alpha3_to_alpha2
                .insert(CompactString::from(alpha3), CompactString::from(alpha2));
        }

        for record in read_table("relators", &config.relators, config.delimiter, true)? {
            let (row, record) = record;
            let (code, role) = two_columns("relators", row, &record)?;
            let role = role.parse::<Role>().map_err(|reason| ReferenceDataError::BadRow {
                table: "relators",
                row,
                reason,
            })?;
            data.relators.insert(CompactString::from(code), role);
        }

        for record in read_table("affiliations", &config.affiliations, config.delimiter, false)? {
            let (_, record) = record;
            let group: Vec<String> = record
                .iter()
                .skip(1)
                .map(str::trim)
                .filter(|alias| !alias.is_empty())
                .map(String::from)
                .collect();
            if !group.is_empty() {
                data.affiliations.push(group);
            }
        }
        data.affiliations
            .extend(config.extra_affiliations.iter().cloned());

        if data.alpha3_to_alpha2.is_empty() {
            return Err(ReferenceDataError::EmptyTable { table: "languages" });
        }
        if data.relators.is_empty() {
            return Err(ReferenceDataError::EmptyTable { table: "relators" });
        }

        debug!(
            languages = data.alpha3_to_alpha2.len(),
            relators = data.relators.len(),
            affiliations = data.affiliations.len(),
            "reference data loaded"
        );

        Ok(data)
    }

    /// Shared instance built from the embedded tables on first use.
    pub fn global() -> Result<Arc<ReferenceData>, ReferenceDataError> {
        if let Some(data) = GLOBAL.get() {
            return Ok(Arc::clone(data));
        }
        let data = Arc::new(Self::load(&ReferenceConfig::default())?);
        Ok(Arc::clone(GLOBAL.get_or_init(|| data)))
    }

    /// ISO 639-1 code for a bibliographic ISO 639-2 code.
    pub fn alpha2(&self, alpha3: &str) -> Option<&str> {
        self.alpha3_to_alpha2.get(alpha3).map(CompactString::as_str)
    }

    /// Bibliographic ISO 639-2 code for an ISO 639-1 code.
    pub fn alpha3(&self, alpha2: &str) -> Option<&str> {
        self.alpha2_to_alpha3.get(alpha2).map(CompactString::as_str)
    }

    /// Canonical role of a relator code, case-insensitive.
    pub fn relator_role(&self, code: &str) -> Option<Role> {
        let code = code.trim().trim_end_matches('.').to_lowercase();
        self.relators.get(code.as_str()).copied()
    }

    /// Alias groups, first alias of each group being canonical.
    pub fn affiliation_groups(&self) -> &[Vec<String>] {
        &self.affiliations
    }
}

/// Reads every row of a table with its 1-based row number.
fn read_table(
    table: &'static str,
    text: &str,
    delimiter: u8,
    has_headers: bool,
) -> Result<Vec<(usize, StringRecord)>, ReferenceDataError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(has_headers)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let offset = if has_headers { 2 } else { 1 };
    reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            record
                .map(|record| (index + offset, record))
                .map_err(|err| ReferenceDataError::csv(table, err))
        })
        .collect()
}

fn two_columns<'r>(
    table: &'static str,
    row: usize,
    record: &'r StringRecord,
) -> Result<(&'r str, &'r str), ReferenceDataError> {
    match (record.get(0).map(str::trim), record.get(1).map(str::trim)) {
        (Some(first), Some(second)) if !first.is_empty() && !second.is_empty() => {
            Ok((first, second))
        }
        _ => Err(ReferenceDataError::BadRow {
            table,
            row,
            reason: "expected two non-empty columns".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_embedded_tables() {
        let data = ReferenceData::load(&ReferenceConfig::new()).unwrap();

        assert_eq!(data.alpha2("fre"), Some("fr"));
        assert_eq!(data.alpha3("de"), Some("ger"));
        assert_eq!(data.relator_role("aut"), Some(Role::Creator));
        assert_eq!(data.relator_role("DGG"), Some(Role::Creator));
        assert_eq!(data.relator_role("edt"), Some(Role::Editor));
        assert_eq!(data.relator_role("prt"), Some(Role::Printer));
        assert_eq!(data.relator_role("xyz"), None);
        assert_eq!(data.affiliation_groups()[1][0], "Uni of Bern");
    }

    #[test]
    fn test_global_is_shared() {
        let first = ReferenceData::global().unwrap();
        let second = ReferenceData::global().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_custom_tables() {
        let mut config = ReferenceConfig::new();
        config
            .set_relators("code;role\nill;ctb\n")
            .set_languages("alpha3;alpha2\nita;it\n")
            .set_affiliations("")
            .set_delimiter(b';')
            .add_affiliation_group(vec!["Acme".to_string(), "Acme Labs".to_string()]);

        let data = ReferenceData::load(&config).unwrap();
        assert_eq!(data.relator_role("ill"), Some(Role::Contributor));
        assert_eq!(data.relator_role("aut"), None);
        assert_eq!(data.alpha2("ita"), Some("it"));
        assert_eq!(data.affiliation_groups(), &[vec!["Acme".to_string(), "Acme Labs".to_string()]]);
    }

    #[test]
    fn test_bad_relator_role() {
        let mut config = ReferenceConfig::new();
        config.set_relators("code\trole\naut\tauthor\n");

        let err = ReferenceData::load(&config).unwrap_err();
        assert!(matches!(
            err,
            ReferenceDataError::BadRow {
                table: "relators",
                row: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_column() {
        let mut config = ReferenceConfig::new();
        config.set_languages("alpha3\talpha2\nfre\n");

        let err = ReferenceData::load(&config).unwrap_err();
        assert!(matches!(err, ReferenceDataError::BadRow { table: "languages", .. }));
    }

    #[test]
    fn test_empty_table() {
        let mut config = ReferenceConfig::new();
        config.set_relators("code\trole\n");

        let err = ReferenceData::load(&config).unwrap_err();
        assert!(matches!(err, ReferenceDataError::EmptyTable { table: "relators" }));
    }
}
