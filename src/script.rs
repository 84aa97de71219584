//! Alternate graphic representation (880 fields).
//!
//! A host field carrying `$6 880-01` has its content repeated in another
//! script by an 880 field carrying `$6 <host-tag>-01[/<script>[/r]]`. The
//! map built here links both, and [`RecordContext::resolve`] reads the
//! alternate value at the same subfield position as the host value.

use crate::context::RecordContext;
use crate::document::Label;
use crate::record::{Field, RawRecord};
use compact_str::CompactString;
use std::collections::HashMap;
use tracing::warn;

/// Explicit MARC-8 escape sequences. `(B` (basic latin) is an ASCII
/// placeholder and goes through the language heuristic instead.
const SCRIPT_PER_CODE: &[(&str, &str)] = &[
    ("(S", "grek"),
    ("(3", "arab"),
    ("(N", "cyrl"),
    ("(2", "hebr"),
];

const ASIAN_CODE: &str = "$1";

const SCRIPT_PER_LANG_ASIAN: &[(&str, &str)] =
    &[("jpn", "jpan"), ("kor", "kore"), ("chi", "hani")];

const SCRIPT_PER_LANG: &[(&str, &str)] = &[
    ("gre", "grek"),
    ("grc", "grek"),
    ("ara", "arab"),
    ("per", "arab"),
    ("bel", "cyrl"),
    ("rus", "cyrl"),
    ("mac", "cyrl"),
    ("srp", "cyrl"),
    ("ukr", "cyrl"),
    ("chu", "cyrl"),
    ("yid", "hebr"),
    ("heb", "hebr"),
    ("lad", "hebr"),
    ("chi", "hani"),
];

const DEFAULT_SCRIPT_ASIAN: &str = "hani";
const DEFAULT_SCRIPT: &str = "zyyy";

const LANGUAGES_PER_SCRIPT: &[(&str, &[&str])] = &[
    ("arab", &["ara", "per"]),
    ("cyrl", &["bel", "chu", "mac", "rus", "srp", "ukr"]),
    ("grek", &["grc", "gre"]),
    ("hani", &["chi", "jpn"]),
    ("hebr", &["heb", "lad", "yid"]),
    ("jpan", &["jpn"]),
    ("kore", &["kor"]),
    ("zyyy", &["chi"]),
];

/// An 880 field linked to a host field.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedField {
    pub script: CompactString,
    pub field: Field,
    pub right_to_left: bool,
}

/// Alternate value resolved for a host subfield.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternateValue {
    pub value: String,
    /// Compound `<lang>-<script>` tag
    pub language: String,
}

/// Map of `(host_tag, link_id)` to the linked 880 field.
#[derive(Debug, Clone, Default)]
pub struct AlternateGraphic {
    links: HashMap<(CompactString, CompactString), LinkedField>,
}

impl AlternateGraphic {
    /// Scans every 880 field of the record. Malformed `$6` values are
    /// skipped with a warning.
    pub fn build(record: &RawRecord, bib_id: &str, lang_008: &str, languages_a: &[String]) -> Self {
        let mut links = HashMap::new();

        for field in record.fields_by_tag("880") {
            for link_data in field.get_all('6') {
                let Some((tag, rest)) = link_data.split_once('-') else {
                    warn!(bib_id, link = link_data, "malformed 880 link");
                    continue;
                };
                let mut parts = rest.split('/');
                let link_id = parts.next().unwrap_or_default();
                if tag.is_empty() || link_id.is_empty() {
                    warn!(bib_id, link = link_data, "malformed 880 link");
                    continue;
                }
                let script_code = parts.next().unwrap_or_default();
                let direction = parts.next().unwrap_or_default();

                let script = match script_code {
                    ASIAN_CODE => script_from_languages(true, bib_id, lang_008, languages_a),
                    code => SCRIPT_PER_CODE
                        .iter()
                        .find(|(c, _)| *c == code)
                        .map(|(_, script)| CompactString::from(*script))
                        .unwrap_or_else(|| {
                            script_from_languages(false, bib_id, lang_008, languages_a)
                        }),
                };

                links.insert(
                    (CompactString::from(tag), CompactString::from(link_id)),
                    LinkedField {
                        script,
                        field: field.clone(),
                        right_to_left: direction == "r",
                    },
                );
            }
        }

        Self { links }
    }

    pub fn get(&self, host_tag: &str, link_id: &str) -> Option<&LinkedField> {
        self.links
            .get(&(CompactString::from(host_tag), CompactString::from(link_id)))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Guesses a script from the record languages: 008 first, then the first
/// matching 041$a.
fn script_from_languages(
    asian: bool,
    bib_id: &str,
    lang_008: &str,
    languages_a: &[String],
) -> CompactString {
    let (table, default) = if asian {
        (SCRIPT_PER_LANG_ASIAN, DEFAULT_SCRIPT_ASIAN)
    } else {
        (SCRIPT_PER_LANG, DEFAULT_SCRIPT)
    };
    let lookup = |lang: &str| table.iter().find(|(l, _)| *l == lang).map(|(_, s)| *s);

    let script = lookup(lang_008).or_else(|| languages_a.iter().find_map(|lang| lookup(lang.as_str())));
    match script {
        Some(script) => CompactString::from(script),
        None => {
            warn!(bib_id, lang_008, default, "no script found for record languages");
            CompactString::from(default)
        }
    }
}

impl RecordContext<'_> {
    /// Builds the `<lang>-<script>` tag of a script, using the first record
    /// language written in it, or `und`.
    pub fn language_script(&self, script: &str) -> String {
        if let Some((_, languages)) = LANGUAGES_PER_SCRIPT.iter().find(|(s, _)| *s == script) {
            let candidates = std::iter::once(&self.lang_008)
                .chain(self.languages_a.iter())
                .chain(self.languages_h.iter());
            for lang in candidates {
                if languages.contains(&lang.as_str()) {
                    return format!("{}-{}", lang, script);
                }
            }
            warn!(
                bib_id = %self.bib_id,
                script,
                lang_008 = %self.lang_008,
                "no language found for script"
            );
        }
        format!("und-{}", script)
    }

    /// Alternate value of the subfield at `index` of the host field linked
    /// by `(host_tag, link_id)`.
    pub fn resolve(&self, host_tag: &str, link_id: &str, index: usize) -> Option<AlternateValue> {
        let linked = self.alternate_graphic.get(host_tag, link_id)?;
        let subfield = linked.field.subfield_at(index)?;
        if subfield.value.trim().is_empty() {
            return None;
        }
        Some(AlternateValue {
            value: subfield.value.clone(),
            language: self.language_script(&linked.script),
        })
    }

    /// Label list for the subfield at `index` of `field`: the primary value,
    /// followed by its alternate script value when one is linked.
    pub fn label_with_alternate(
        &self,
        field: &Field,
        index: usize,
        clean: impl Fn(&str) -> String,
    ) -> Vec<Label> {
        let Some(subfield) = field.subfield_at(index) else {
            return Vec::new();
        };
        let mut labels = vec![Label::new(clean(&subfield.value))];
        if let Some((_, link_id)) = field.link()
            && let Some(alternate) = self.resolve(&field.tag, link_id, index)
        {
            labels.push(Label::with_language(
                clean(&alternate.value),
                alternate.language,
            ));
        }
        labels
    }
}
