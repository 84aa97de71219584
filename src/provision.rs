//! Provision activity statements and start date resolution.
//!
//! # Design Decision
//!
//! ## Start Date Priority
//! Several field families may each claim the publication start date. Handlers
//! never write it directly: they offer a candidate tagged with a
//! [`DateTier`]. Once every field has been dispatched, candidates are applied
//! in ascending tier order through [`set_start_date`], so the highest tier is
//! applied last and wins whatever the field order in the record was. Within a
//! tier the last occurrence wins.
//!
//! ## Entry Merging
//! - **Publication**: at most one entry carries a start date set this way;
//!   [`set_start_date`] pops it and re-appends it to the end of the list
//! - **Manufacture / Distribution / Production**: appended, never merged

use crate::context::RecordContext;
use crate::document::{
    Document, Label, Place, ProvisionActivity, ProvisionType, Statement, StatementType,
};
use crate::record::Field;
use crate::regex::Regex;
use crate::utils::remove_trailing_punctuation;
use std::sync::LazyLock;
use tracing::debug;

static START_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}(-[0-9]{2}-[0-9]{2})?$").unwrap());

static MONTH_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").unwrap());

static LEADING_YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*([0-9]{4})").unwrap());

/// Sources of a start date, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateTier {
    /// Fixed-length data (008/07-10)
    ControlField,
    /// Host item numbering (773)
    HostItem,
    /// Dissertation date (502)
    Dissertation,
    /// Legacy alternate date (269)
    AlternateDate,
    /// Legacy publication statement (260)
    LegacyPublication,
    /// Modern publication statement (264)
    ModernPublication,
}

/// Precision accepted from a date source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePrecision {
    /// `YYYY` or `YYYY-MM-DD`
    Day,
    /// Also accepts `YYYY-MM`, completed with `-01`
    Month,
}

/// A start date offered by a handler, applied after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DateCandidate {
    pub(crate) tier: DateTier,
    pub(crate) date: String,
}

/// Normalizes a start date or rejects it.
pub fn validate_start_date(value: &str, precision: DatePrecision) -> Option<String> {
    let value = value.trim();
    if START_DATE_REGEX.is_match(value) {
        return Some(value.to_string());
    }
    if precision == DatePrecision::Month && MONTH_DATE_REGEX.is_match(value) {
        return Some(format!("{}-01", value));
    }
    None
}

impl RecordContext<'_> {
    /// Offers a start date candidate. Invalid dates are dropped and `false`
    /// is returned.
    pub fn offer_start_date(&mut self, tier: DateTier, value: &str, precision: DatePrecision) -> bool {
        match validate_start_date(value, precision) {
            Some(date) => {
                self.date_candidates.push(DateCandidate { tier, date });
                true
            }
            None => {
                debug!(bib_id = %self.bib_id, ?tier, value, "start date ignored");
                false
            }
        }
    }

    /// Best start date offered so far, without applying it.
    pub fn best_start_date(&self) -> Option<&str> {
        winner(&self.date_candidates).map(|candidate| candidate.date.as_str())
    }

    /// Whether a candidate of `tier` was already offered.
    pub fn has_start_date(&self, tier: DateTier) -> bool {
        self.date_candidates.iter().any(|candidate| candidate.tier == tier)
    }
}

/// Last candidate of the highest tier.
fn winner(candidates: &[DateCandidate]) -> Option<&DateCandidate> {
    // max_by_key keeps the last of equal maxima
    candidates.iter().max_by_key(|candidate| candidate.tier)
}

/// Sets the start date of the dated Publication entry (the first one when
/// none is dated), creating it when missing, and moves that entry to the end
/// of the list. Other Publication entries lose their start date.
pub fn set_start_date(doc: &mut Document, date: impl Into<String>) {
    let is_publication = |p: &ProvisionActivity| p.kind == ProvisionType::Publication;
    let position = doc
        .provision_activity
        .iter()
        .position(|p| is_publication(p) && p.start_date.is_some())
        .or_else(|| doc.provision_activity.iter().position(is_publication));

    let mut publication = match position {
        Some(index) => doc.provision_activity.remove(index),
        None => ProvisionActivity::new(ProvisionType::Publication),
    };
    publication.start_date = Some(date.into());
    for other in doc.provision_activity.iter_mut().filter(|p| is_publication(p)) {
        other.start_date = None;
    }
    doc.provision_activity.push(publication);
}

/// Start date of the dated Publication entry.
pub fn dated_publication(doc: &Document) -> Option<&ProvisionActivity> {
    doc.provision_activity
        .iter()
        .find(|p| p.kind == ProvisionType::Publication && p.start_date.is_some())
}

/// First Publication entry, created at the end of the list when missing.
pub fn publication_mut(doc: &mut Document) -> &mut ProvisionActivity {
    let index = match doc
        .provision_activity
        .iter()
        .position(|p| p.kind == ProvisionType::Publication)
    {
        Some(index) => index,
        None => {
            doc.provision_activity
                .push(ProvisionActivity::new(ProvisionType::Publication));
            doc.provision_activity.len() - 1
        }
    };
    &mut doc.provision_activity[index]
}

/// First four digit year of a transcribed date (`[1798?]`, `c1990`).
pub fn leading_year(value: &str) -> Option<&str> {
    LEADING_YEAR_REGEX
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|year| year.as_str())
}

/// Applies the winning candidate, if any, and clears the others.
pub(crate) fn apply_start_dates(doc: &mut Document, ctx: &mut RecordContext<'_>) {
    let candidates = std::mem::take(&mut ctx.date_candidates);
    if let Some(candidate) = winner(&candidates) {
        set_start_date(doc, candidate.date.clone());
    }
}

/// Splits `1798-1799` into start and end year.
pub fn split_years(value: &str) -> (Option<String>, Option<String>) {
    let mut years = value.split('-').map(str::trim);
    let start = years.next().filter(|y| !y.is_empty()).map(String::from);
    let end = years.next().filter(|y| !y.is_empty()).map(String::from);
    (start, end)
}

/// Statements for the subfields of `field` listed in `codes`, in field
/// order, each carrying its alternate graphic value when linked.
pub fn build_statement(
    field: &Field,
    ctx: &RecordContext<'_>,
    codes: &[(char, StatementType)],
) -> Vec<Statement> {
    field
        .subfields()
        .iter()
        .enumerate()
        .filter(|(_, subfield)| !subfield.value.trim().is_empty())
        .filter_map(|(index, subfield)| {
            let (_, kind) = codes.iter().find(|(code, _)| *code == subfield.code)?;
            let mut label: Vec<Label> =
                ctx.label_with_alternate(field, index, remove_trailing_punctuation);
            // a value made only of punctuation gives no statement
            if label.first().is_none_or(|first| first.value.trim().is_empty()) {
                return None;
            }
            label.retain(|label| !label.value.trim().is_empty());
            Some(Statement::new(*kind, label))
        })
        .collect()
}

/// Date statement from the first occurrence of `code`.
pub fn date_statement(field: &Field, ctx: &RecordContext<'_>, code: char) -> Option<Statement> {
    let index = field
        .subfields()
        .iter()
        .position(|s| s.code == code && !s.value.trim().is_empty())?;
    let label: Vec<Label> = ctx.label_with_alternate(field, index, |v| v.trim().to_string());
    Some(Statement::new(StatementType::Date, label))
}

/// Place from the record context (first canton, country).
pub fn place_from_context(ctx: &RecordContext<'_>) -> Option<Place> {
    if ctx.cantons.is_empty() && ctx.country.is_none() {
        return None;
    }
    Some(Place {
        kind: StatementType::Place,
        canton: ctx.cantons.first().cloned(),
        country: ctx.country.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context_for;
    use crate::record::RawRecord;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case("2020", DatePrecision::Day, Some("2020"))]
    #[case("2020-09-09", DatePrecision::Day, Some("2020-09-09"))]
    #[case("2010-2020", DatePrecision::Day, None)]
    #[case("2020-09", DatePrecision::Day, None)]
    #[case("2020-09", DatePrecision::Month, Some("2020-09-01"))]
    #[case("circa 1900", DatePrecision::Month, None)]
    fn test_validate_start_date(
        #[case] value: &str,
        #[case] precision: DatePrecision,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(validate_start_date(value, precision).as_deref(), expected);
    }

    #[test]
    fn test_set_start_date_creates_publication() {
        let mut doc = Document::new();
        set_start_date(&mut doc, "2020");
        assert_eq!(doc.provision_activity.len(), 1);
        assert_eq!(doc.provision_activity[0].start_date.as_deref(), Some("2020"));
    }

    #[test]
    fn test_set_start_date_moves_publication_last() {
        let mut doc = Document::new();
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Publication));
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Manufacture));

        set_start_date(&mut doc, "1966");
        set_start_date(&mut doc, "1798");

        let kinds: Vec<_> = doc.provision_activity.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![ProvisionType::Manufacture, ProvisionType::Publication]);
        assert_eq!(doc.provision_activity[1].start_date.as_deref(), Some("1798"));
    }

    #[rstest]
    #[case(&["1990", "2000", "2010-01-01"])]
    #[case(&["2020"])]
    #[case(&["1066", "1066", "0999"])]
    fn test_at_most_one_dated_publication(#[case] dates: &[&str]) {
        let mut doc = Document::new();
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Publication));
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Publication));
        for date in dates {
            set_start_date(&mut doc, *date);
        }
        let dated = doc
            .provision_activity
            .iter()
            .filter(|p| p.kind == ProvisionType::Publication && p.start_date.is_some())
            .count();
        assert_eq!(dated, 1);
    }

    #[test]
    fn test_set_start_date_clears_other_publications() {
        let mut doc = Document::new();
        let mut stale = ProvisionActivity::new(ProvisionType::Publication);
        stale.start_date = Some("1995".to_string());
        doc.provision_activity.push(stale);
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Publication));

        set_start_date(&mut doc, "2001");

        let dates: Vec<Option<&str>> = doc
            .provision_activity
            .iter()
            .map(|p| p.start_date.as_deref())
            .collect();
        assert_eq!(dates, vec![None, Some("2001")]);
        assert_eq!(
            dated_publication(&doc).and_then(|p| p.start_date.as_deref()),
            Some("2001")
        );
    }

    #[test]
    fn test_candidates_applied_by_tier() {
        let record = RawRecord::new();
        let mut ctx = context_for(&record);
        assert!(ctx.offer_start_date(DateTier::ModernPublication, "2001", DatePrecision::Day));
        assert!(ctx.offer_start_date(DateTier::HostItem, "2015", DatePrecision::Day));
        assert!(ctx.offer_start_date(DateTier::AlternateDate, "1966", DatePrecision::Day));
        assert!(ctx.offer_start_date(DateTier::AlternateDate, "1967", DatePrecision::Day));
        assert!(!ctx.offer_start_date(DateTier::Dissertation, "2010-2020", DatePrecision::Day));
        assert_eq!(ctx.best_start_date(), Some("2001"));

        let mut doc = Document::new();
        apply_start_dates(&mut doc, &mut ctx);
        assert_eq!(doc.provision_activity.len(), 1);
        assert_eq!(doc.provision_activity[0].start_date.as_deref(), Some("2001"));
        assert!(ctx.date_candidates.is_empty());
    }

    #[test]
    fn test_last_wins_within_tier() {
        let record = RawRecord::new();
        let mut ctx = context_for(&record);
        ctx.offer_start_date(DateTier::Dissertation, "2010", DatePrecision::Day);
        ctx.offer_start_date(DateTier::Dissertation, "2020", DatePrecision::Day);
        assert_eq!(ctx.best_start_date(), Some("2020"));

        let mut doc = Document::new();
        apply_start_dates(&mut doc, &mut ctx);
        assert_eq!(doc.provision_activity[0].start_date.as_deref(), Some("2020"));
    }

    #[test]
    fn test_only_winner_applied_to_several_publications() {
        let record = RawRecord::new();
        let mut ctx = context_for(&record);
        ctx.offer_start_date(DateTier::ControlField, "1990", DatePrecision::Day);
        ctx.offer_start_date(DateTier::ModernPublication, "2001", DatePrecision::Day);
        ctx.offer_start_date(DateTier::LegacyPublication, "1995", DatePrecision::Day);
        assert!(ctx.has_start_date(DateTier::ControlField));
        assert!(!ctx.has_start_date(DateTier::HostItem));

        let mut doc = Document::new();
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Publication));
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Publication));
        apply_start_dates(&mut doc, &mut ctx);

        let dates: Vec<Option<&str>> = doc
            .provision_activity
            .iter()
            .map(|p| p.start_date.as_deref())
            .collect();
        assert_eq!(dates, vec![None, Some("2001")]);
    }

    #[rstest]
    #[case("1798-1799", Some("1798"), Some("1799"))]
    #[case("1798", Some("1798"), None)]
    #[case("1798-", Some("1798"), None)]
    #[case("", None, None)]
    fn test_split_years(
        #[case] value: &str,
        #[case] start: Option<&str>,
        #[case] end: Option<&str>,
    ) {
        assert_eq!(
            split_years(value),
            (start.map(String::from), end.map(String::from))
        );
    }

    #[rstest]
    #[case("1798", Some("1798"))]
    #[case("[1798?]", Some("1798"))]
    #[case("c1990, cop. 1991", Some("1990"))]
    #[case("s.d.", None)]
    fn test_leading_year(#[case] value: &str, #[case] expected: Option<&str>) {
        assert_eq!(leading_year(value), expected);
    }

    #[test]
    fn test_publication_mut_reuses_first_publication() {
        let mut doc = Document::new();
        doc.provision_activity
            .push(ProvisionActivity::new(ProvisionType::Manufacture));
        publication_mut(&mut doc).end_date = Some("1799".to_string());
        publication_mut(&mut doc).note = Some("note".to_string());
        assert_eq!(doc.provision_activity.len(), 2);
        assert_eq!(doc.provision_activity[1].end_date.as_deref(), Some("1799"));
        assert_eq!(doc.provision_activity[1].note.as_deref(), Some("note"));
    }

    #[test]
    fn test_build_statement() {
        let record = RawRecord::new();
        let ctx = context_for(&record);
        let field = Field::data("260", ' ', ' ')
            .with_subfield('a', "Lausanne :")
            .with_subfield('b', "Imprint,")
            .with_subfield('c', "1798-1799");

        let statement = build_statement(
            &field,
            &ctx,
            &[('a', StatementType::Place), ('b', StatementType::Agent)],
        );
        assert_eq!(
            statement,
            vec![
                Statement::single(StatementType::Place, "Lausanne"),
                Statement::single(StatementType::Agent, "Imprint"),
            ]
        );
        assert_eq!(
            date_statement(&field, &ctx, 'c'),
            Some(Statement::single(StatementType::Date, "1798-1799"))
        );
    }

    #[rstest]
    #[case(",")]
    #[case(" : ")]
    #[case(" / ")]
    fn test_build_statement_skips_punctuation_only(#[case] publisher: &str) {
        let record = RawRecord::new();
        let ctx = context_for(&record);
        let field = Field::data("264", ' ', '1')
            .with_subfield('a', "Bern :")
            .with_subfield('b', publisher);

        let statement = build_statement(
            &field,
            &ctx,
            &[('a', StatementType::Place), ('b', StatementType::Agent)],
        );
        assert_eq!(statement, vec![Statement::single(StatementType::Place, "Bern")]);
    }
}
