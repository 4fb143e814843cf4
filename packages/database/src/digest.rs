//! Weekly plain-text digest of recent incidents.

use chrono::{Duration, NaiveDateTime};
use moosicbox_json_utils::database::ToValue as _;
use safer_database_models::DigestRow;
use safer_incident_models::IncidentStatus;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// How far back the digest looks.
pub const DIGEST_WINDOW_DAYS: i64 = 7;

/// Maximum number of incidents summarised.
pub const DIGEST_ROW_LIMIT: u32 = 50;

/// Fetches the most recent public incidents from the last
/// [`DIGEST_WINDOW_DAYS`] days relative to `now`, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn recent_incidents(
    db: &dyn Database,
    now: NaiveDateTime,
) -> Result<Vec<DigestRow>, DbError> {
    let since = now - Duration::days(DIGEST_WINDOW_DAYS);
    let rows = db
        .query_raw_params(
            &format!(
                "SELECT type, state, status, victims, casualties
                 FROM incidents
                 WHERE start_time >= $1 AND status IN ('{}', '{}')
                 ORDER BY start_time DESC
                 LIMIT {DIGEST_ROW_LIMIT}",
                IncidentStatus::Open,
                IncidentStatus::Closed,
            ),
            &[DatabaseValue::DateTime(since)],
        )
        .await?;

    let mut incidents = Vec::with_capacity(rows.len());
    for row in &rows {
        let status: String = row.to_value("status").unwrap_or_default();
        let Ok(status) = status.parse::<IncidentStatus>() else {
            log::warn!("Skipping digest row with unknown status '{status}'");
            continue;
        };
        incidents.push(DigestRow {
            incident_type: row.to_value("type").unwrap_or(None),
            state: row.to_value("state").unwrap_or(None),
            status,
            victims: row.to_value("victims").unwrap_or(0),
            casualties: row.to_value("casualties").unwrap_or(0),
        });
    }

    Ok(incidents)
}

/// Summarises `incidents` into a short paragraph.
///
/// `incidents` is expected newest first; ties for the most common type or
/// state go to whichever value appears first.
#[must_use]
pub fn compose_digest(incidents: &[DigestRow]) -> String {
    if incidents.is_empty() {
        return format!("No recent incidents reported in the last {DIGEST_WINDOW_DAYS} days.");
    }

    let total = incidents.len();
    let open = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Open)
        .count();
    let closed = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Closed)
        .count();

    let mut summary = format!(
        "In the last {DIGEST_WINDOW_DAYS} days, {total} incidents were reported across Nigeria. \
         {open} incidents remain open, while {closed} have been resolved. "
    );

    if let Some((top_type, count)) = most_common(incidents.iter().map(|i| i.incident_type.as_deref()))
    {
        summary.push_str(&format!(
            "The most common incident type was {top_type} with {count} occurrences. "
        ));
    }

    if let Some((top_state, count)) = most_common(incidents.iter().map(|i| i.state.as_deref())) {
        summary.push_str(&format!(
            "{top_state} state had the highest number of incidents with {count} reports. "
        ));
    }

    let victims: i64 = incidents.iter().map(|i| i64::from(i.victims)).sum();
    let casualties: i64 = incidents.iter().map(|i| i64::from(i.casualties)).sum();
    if victims > 0 {
        summary.push_str(&format!(
            "Total victims affected: {victims}, with {casualties} casualties. "
        ));
    }

    summary.push_str("Stay vigilant and report any suspicious activities immediately.");
    summary
}

/// Most frequent value, first occurrence winning ties. Missing or blank
/// values count as `Unknown`.
fn most_common<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<(&'a str, usize)> {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for value in values {
        let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or("Unknown");
        match tally.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => tally.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in tally {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((value, count));
        }
    }
    best
}
