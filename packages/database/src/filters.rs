//! Filter predicate builder shared by every incident view.
//!
//! Translates an [`IncidentFilter`] into a conjunctive `WHERE` clause with
//! positional `$n` placeholders and the matching bound values. Only the
//! fields of [`IncidentFilter`] can contribute clauses, and caller-supplied
//! strings only ever travel as bound parameters.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use safer_database_models::IncidentFilter;
use safer_incident_models::IncidentStatus;
use switchy_database::DatabaseValue;

/// Columns matched by the free-text `search` filter.
const SEARCH_COLUMNS: [&str; 4] = ["type", "state", "lga", "description"];

/// How the `search` filter is applied.
///
/// The list view matches any whitespace-separated word while the aggregate
/// views match the whole value as a single substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Each word becomes its own substring clause, OR'd together.
    AnyWord,
    /// The whole value is one substring clause.
    Phrase,
}

/// A conjunctive `WHERE` predicate and its bound parameters.
#[derive(Debug, Default)]
pub struct Predicate {
    clauses: Vec<String>,
    params: Vec<DatabaseValue>,
}

impl Predicate {
    /// Builds the predicate for `filter`.
    ///
    /// Without an explicit status the predicate restricts results to
    /// `open` and `closed`, keeping unreviewed reports out of public views.
    #[must_use]
    pub fn build(filter: &IncidentFilter, search: SearchMode) -> Self {
        let mut predicate = Self::default();

        for (column, value) in [
            ("category", &filter.category),
            ("lga", &filter.lga),
            ("type", &filter.incident_type),
            ("state", &filter.state),
        ] {
            if let Some(value) = non_empty(value.as_deref()) {
                let placeholder = predicate.bind(DatabaseValue::String(value.to_string()));
                predicate.clauses.push(format!("{column} = {placeholder}"));
            }
        }

        if let Some(status) = filter.status {
            let placeholder = predicate.bind(DatabaseValue::String(status.to_string()));
            predicate.clauses.push(format!("status = {placeholder}"));
        } else {
            let public = IncidentStatus::PUBLIC
                .iter()
                .map(|s| format!("'{s}'"))
                .collect::<Vec<_>>()
                .join(", ");
            predicate.clauses.push(format!("status IN ({public})"));
        }

        if let Some(date) = filter.start_date {
            predicate.push_bound(">=", start_of_day(date));
        }

        if let Some(date) = filter.end_date {
            predicate.push_bound("<=", end_of_day(date));
        }

        if let Some((first, last)) = filter.year.and_then(year_bounds) {
            predicate.push_bound(">=", start_of_day(first));
            predicate.push_bound("<=", end_of_day(last));
        }

        if let Some(search_value) = non_empty(filter.search.as_deref()) {
            let terms: Vec<&str> = match search {
                SearchMode::AnyWord => search_value.split_whitespace().collect(),
                SearchMode::Phrase => vec![search_value],
            };
            let alternatives: Vec<String> = terms
                .into_iter()
                .map(|term| predicate.search_clause(&format!("%{}%", term.to_lowercase())))
                .collect();
            if !alternatives.is_empty() {
                predicate
                    .clauses
                    .push(format!("({})", alternatives.join(" OR ")));
            }
        }

        predicate
    }

    /// Adds a fixed clause that carries no parameters.
    #[must_use]
    pub fn and(mut self, clause: &str) -> Self {
        self.clauses.push(clause.to_string());
        self
    }

    /// Renders `" WHERE a AND b ..."`, or an empty string when there are no
    /// clauses.
    #[must_use]
    pub fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// The individual clauses, in the order they were added.
    #[must_use]
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    /// Bound values, positionally matching `$1..$n`.
    #[must_use]
    pub fn params(&self) -> &[DatabaseValue] {
        &self.params
    }

    /// Index of the next free placeholder, for callers that append their own
    /// parameters (e.g. `LIMIT`/`OFFSET`).
    #[must_use]
    pub fn next_index(&self) -> usize {
        self.params.len() + 1
    }

    /// Consumes the predicate, returning its bound values.
    #[must_use]
    pub fn into_params(self) -> Vec<DatabaseValue> {
        self.params
    }

    fn bind(&mut self, value: DatabaseValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn push_bound(&mut self, op: &str, at: NaiveDateTime) {
        let placeholder = self.bind(DatabaseValue::DateTime(at));
        self.clauses.push(format!("start_time {op} {placeholder}"));
    }

    /// One `LIKE` per searchable column, each with its own placeholder.
    fn search_clause(&mut self, pattern: &str) -> String {
        SEARCH_COLUMNS
            .iter()
            .map(|column| {
                let placeholder = self.bind(DatabaseValue::String(pattern.to_string()));
                format!("LOWER({column}) LIKE {placeholder}")
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}

/// First and last day of a positive calendar year, or `None` when the year
/// is non-positive or outside chrono's range.
fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    if year <= 0 {
        return None;
    }
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_param(predicate: &Predicate, idx: usize) -> &str {
        match &predicate.params()[idx] {
            DatabaseValue::String(s) => s,
            other => panic!("expected string param at {idx}, got {other:?}"),
        }
    }

    fn datetime_param(predicate: &Predicate, idx: usize) -> NaiveDateTime {
        match &predicate.params()[idx] {
            DatabaseValue::DateTime(dt) => *dt,
            other => panic!("expected datetime param at {idx}, got {other:?}"),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_filter_defaults_to_public_statuses() {
        let predicate = Predicate::build(&IncidentFilter::default(), SearchMode::Phrase);
        assert_eq!(predicate.clauses(), ["status IN ('open', 'closed')"]);
        assert!(predicate.params().is_empty());
        assert_eq!(
            predicate.where_clause(),
            " WHERE status IN ('open', 'closed')"
        );
        assert_eq!(predicate.next_index(), 1);
    }

    #[test]
    fn explicit_status_replaces_default() {
        let filter = IncidentFilter {
            status: Some(IncidentStatus::Pending),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::Phrase);
        assert_eq!(predicate.clauses(), ["status = $1"]);
        assert_eq!(string_param(&predicate, 0), "pending");
    }

    #[test]
    fn exact_match_filters_are_bound_not_interpolated() {
        let filter = IncidentFilter {
            category: Some("Violent".to_string()),
            lga: Some("Ikeja".to_string()),
            incident_type: Some("Kidnapping'; DROP TABLE incidents; --".to_string()),
            state: Some("Lagos".to_string()),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::Phrase);

        assert_eq!(
            predicate.clauses(),
            [
                "category = $1",
                "lga = $2",
                "type = $3",
                "state = $4",
                "status IN ('open', 'closed')",
            ]
        );
        assert_eq!(string_param(&predicate, 0), "Violent");
        assert_eq!(string_param(&predicate, 2), "Kidnapping'; DROP TABLE incidents; --");
        assert!(!predicate.where_clause().contains("DROP"));
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let filter = IncidentFilter {
            category: Some(String::new()),
            lga: Some("   ".to_string()),
            search: Some(String::new()),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::AnyWord);
        assert_eq!(predicate.clauses(), ["status IN ('open', 'closed')"]);
        assert!(predicate.params().is_empty());
    }

    #[test]
    fn date_range_is_inclusive_through_end_of_day() {
        let filter = IncidentFilter {
            start_date: Some(date(2025, 1, 10)),
            end_date: Some(date(2025, 1, 20)),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::Phrase);

        assert_eq!(
            predicate.clauses()[1..],
            ["start_time >= $1", "start_time <= $2"]
        );
        assert_eq!(
            datetime_param(&predicate, 0),
            date(2025, 1, 10).and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            datetime_param(&predicate, 1),
            date(2025, 1, 20).and_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn year_expands_to_calendar_bounds() {
        let filter = IncidentFilter {
            year: Some(2024),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::AnyWord);
        assert_eq!(predicate.params().len(), 2);
        assert_eq!(
            datetime_param(&predicate, 0),
            date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            datetime_param(&predicate, 1),
            date(2024, 12, 31).and_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn non_positive_year_is_ignored() {
        for year in [0, -5] {
            let filter = IncidentFilter {
                year: Some(year),
                ..IncidentFilter::default()
            };
            let predicate = Predicate::build(&filter, SearchMode::AnyWord);
            assert!(predicate.params().is_empty(), "year {year} produced a range");
        }
    }

    #[test]
    fn phrase_search_is_one_lowercased_substring() {
        let filter = IncidentFilter {
            search: Some("Flood Kidnap".to_string()),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::Phrase);

        assert_eq!(predicate.params().len(), 4);
        for idx in 0..4 {
            assert_eq!(string_param(&predicate, idx), "%flood kidnap%");
        }
        assert_eq!(
            predicate.clauses()[1],
            "(LOWER(type) LIKE $1 OR LOWER(state) LIKE $2 OR LOWER(lga) LIKE $3 OR LOWER(description) LIKE $4)"
        );
    }

    #[test]
    fn word_search_ors_one_clause_per_word() {
        let filter = IncidentFilter {
            search: Some("  flood   kidnap ".to_string()),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::AnyWord);

        assert_eq!(predicate.params().len(), 8);
        assert_eq!(string_param(&predicate, 0), "%flood%");
        assert_eq!(string_param(&predicate, 4), "%kidnap%");
        let clause = &predicate.clauses()[1];
        assert!(clause.starts_with('(') && clause.ends_with(')'));
        assert!(clause.contains("LOWER(description) LIKE $4 OR LOWER(type) LIKE $5"));
    }

    #[test]
    fn extra_clauses_and_placeholders_follow_filters() {
        let filter = IncidentFilter {
            lga: Some("Ikeja".to_string()),
            ..IncidentFilter::default()
        };
        let predicate = Predicate::build(&filter, SearchMode::Phrase).and("lga <> ''");
        assert_eq!(predicate.next_index(), 2);
        assert!(predicate.where_clause().ends_with(" AND lga <> ''"));
        assert_eq!(predicate.into_params().len(), 1);
    }
}
