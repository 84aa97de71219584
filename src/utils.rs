use crate::regex::Regex;
use std::sync::LazyLock;

static TRAILING_PUNCTUATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([,]|\s+[:;/\-])$").unwrap());

static QUALIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\(([^)]*)\)\s*$").unwrap());

static DOI_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?://(?:dx\.)?doi\.org/|doi:\s*)").unwrap());

static HTML_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Removes trailing ISBD punctuation (`,` or a spaced `:` `;` `/` `-`).
///
/// # Arguments
///
/// * `data` - The label to clean
pub fn remove_trailing_punctuation(data: &str) -> String {
    let trimmed = data.trim_end();
    TRAILING_PUNCTUATION_REGEX
        .replace(trimmed, "")
        .trim_end()
        .to_string()
}

/// Splits `value (qualifier)` into its value and qualifier parts.
///
/// Values without a trailing parenthetical are returned unchanged.
pub fn split_qualifier(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();
    match QUALIFIER_REGEX.captures(raw) {
        Some(captures) => {
            let value = captures[1].trim().to_string();
            let qualifier = captures[2].trim();
            if value.is_empty() {
                return (raw.to_string(), None);
            }
            let qualifier = (!qualifier.is_empty()).then(|| qualifier.to_string());
            (value, qualifier)
        }
        None => (raw.to_string(), None),
    }
}

/// Parses a year, keeping it only in the -9999..=9999 range.
pub fn year_from_date(date: &str) -> Option<i32> {
    date.trim()
        .parse::<i32>()
        .ok()
        .filter(|year| (-9999..=9999).contains(year))
}

/// Strips URL and `doi:` prefixes from a DOI.
pub fn format_doi(doi_str: &str) -> Option<String> {
    let doi = DOI_PREFIX_REGEX.replace(doi_str.trim(), "");
    let doi = doi.trim();
    if doi.starts_with("10.") {
        Some(doi.to_string())
    } else {
        None
    }
}

/// Removes HTML/JATS tags and collapses whitespace.
pub fn remove_html(text: &str) -> String {
    let text = HTML_TAG_REGEX.replace_all(text, " ");
    WHITESPACE_REGEX.replace_all(text.trim(), " ").to_string()
}

/// Returns the trimmed value when it is not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("Bulletin officiel du Directoire,", "Bulletin officiel du Directoire")]
    #[case("Lausanne :", "Lausanne")]
    #[case("Paris ; ", "Paris")]
    #[case("Title /", "Title")]
    #[case("1990 -", "1990")]
    #[case("Payot", "Payot")]
    #[case("Bern:", "Bern:")]
    #[case("", "")]
    fn test_remove_trailing_punctuation(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(remove_trailing_punctuation(input), expected);
    }

    #[rstest]
    #[case("978-3-1 (paperback)", "978-3-1", Some("paperback"))]
    #[case("978-3-1", "978-3-1", None)]
    #[case("(paperback)", "(paperback)", None)]
    #[case("0-19-852663-6 ()", "0-19-852663-6", None)]
    fn test_split_qualifier(
        #[case] input: &str,
        #[case] value: &str,
        #[case] qualifier: Option<&str>,
    ) {
        assert_eq!(
            split_qualifier(input),
            (value.to_string(), qualifier.map(String::from))
        );
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date("1798"), Some(1798));
        assert_eq!(year_from_date(" 2015 "), Some(2015));
        assert_eq!(year_from_date("-500"), Some(-500));
        assert_eq!(year_from_date("19uu"), None);
        assert_eq!(year_from_date("10000"), None);
        assert_eq!(year_from_date(""), None);
    }

    #[test]
    fn test_format_doi() {
        let test_cases = vec![
            ("10.1000/test", Some("10.1000/test")),
            ("https://doi.org/10.1000/test", Some("10.1000/test")),
            ("http://dx.doi.org/10.1000/test", Some("10.1000/test")),
            ("doi: 10.1000/TEST", Some("10.1000/TEST")),
            ("invalid", None),
            ("", None),
        ];

        for (input, expected) in test_cases {
            assert_eq!(format_doi(input), expected.map(String::from));
        }
    }

    #[test]
    fn test_remove_html() {
        assert_eq!(
            remove_html("<jats:p>Some <jats:italic>abstract</jats:italic>\n text</jats:p>"),
            "Some abstract text"
        );
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  a ")), Some("a"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
