//! Reference table sources and loading options.
//!
//! The default configuration reads the tables embedded in the crate. Each
//! table can be replaced by caller-provided text, for instance a newer
//! affiliation list maintained outside the crate.

use std::borrow::Cow;

pub(crate) const DEFAULT_LANGUAGES: &str = include_str!("../../data/languages.tsv");
pub(crate) const DEFAULT_RELATORS: &str = include_str!("../../data/relators.tsv");
pub(crate) const DEFAULT_AFFILIATIONS: &str = include_str!("../../data/affiliations.tsv");

/// Configuration for loading [`ReferenceData`](super::ReferenceData).
///
/// # Table layout
///
/// - languages: header row, then `alpha3 <TAB> alpha2`
/// - relators: header row, then `code <TAB> role`
/// - affiliations: no header, `id <TAB> canonical <TAB> alias...`; the id
///   column is ignored and the first alias is the canonical form
///
/// # Examples
///
/// ```
/// use bibnorm::reference::ReferenceConfig;
///
/// let mut config = ReferenceConfig::new();
/// config.add_affiliation_group(vec![
///     "Uni of Somewhere".to_string(),
///     "University of Somewhere".to_string(),
/// ]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub(crate) languages: Cow<'static, str>,
    pub(crate) relators: Cow<'static, str>,
    pub(crate) affiliations: Cow<'static, str>,
    /// Groups appended after the ones read from the affiliation table
    pub(crate) extra_affiliations: Vec<Vec<String>>,
    pub(crate) delimiter: u8,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceConfig {
    /// Creates a configuration reading the embedded tables
    #[must_use]
    pub fn new() -> Self {
        Self {
            languages: Cow::Borrowed(DEFAULT_LANGUAGES),
            relators: Cow::Borrowed(DEFAULT_RELATORS),
            affiliations: Cow::Borrowed(DEFAULT_AFFILIATIONS),
            extra_affiliations: Vec::new(),
            delimiter: b'\t',
        }
    }

    /// Replaces the language table
    pub fn set_languages(&mut self, table: impl Into<String>) -> &mut Self {
        self.languages = Cow::Owned(table.into());
        self
    }

    /// Replaces the relator table
    pub fn set_relators(&mut self, table: impl Into<String>) -> &mut Self {
        self.relators = Cow::Owned(table.into());
        self
    }

    /// Replaces the affiliation table
    pub fn set_affiliations(&mut self, table: impl Into<String>) -> &mut Self {
        self.affiliations = Cow::Owned(table.into());
        self
    }

    /// Appends an alias group, first alias being the canonical form
    pub fn add_affiliation_group(&mut self, aliases: Vec<String>) -> &mut Self {
        self.extra_affiliations.push(aliases);
        self
    }

    /// Sets the column delimiter shared by all tables
    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.delimiter == b'\n' || self.delimiter == b'\r' {
            return Err("Delimiter cannot be a newline character".to_string());
        }

        for (name, table) in [
            ("languages", &self.languages),
            ("relators", &self.relators),
        ] {
            if table.trim().is_empty() {
                return Err(format!("The {} table is empty", name));
            }
        }

        for group in &self.extra_affiliations {
            if group.is_empty() {
                return Err("Empty affiliation group".to_string());
            }
            if group.iter().any(|alias| alias.trim().is_empty()) {
                return Err(format!(
                    "Empty alias found in affiliation group '{}'",
                    group[0]
                ));
            }
        }

        Ok(())
    }
}
