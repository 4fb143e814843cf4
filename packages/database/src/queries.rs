//! Incident view adapters and write operations.
//!
//! Every read view reuses the predicate from [`Predicate::build`] and only
//! differs in the statements it issues and the shape it returns. Writes
//! cover the two incident mutations the public and admin flows perform:
//! inserting a pending report and transitioning its status.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use moosicbox_json_utils::database::ToValue as _;
use safer_database_models::{
    IncidentFilter, IncidentListItem, IncidentPage, IncidentRow, ListQuery, NewIncident,
    Pagination, StatusChange, StatusCounts, TimelinePoint, TotalsSummary, TypeCount, VictimTotals,
};
use safer_incident_models::{IncidentStatus, duration_label};
use switchy_database::{Database, DatabaseValue};

use crate::filters::{Predicate, SearchMode};
use crate::{DbError, row_timestamp, to_count};

/// Columns selected for a full incident row.
const INCIDENT_COLUMNS: &str = "id, title, type, category, state, lga, latitude, longitude, \
     status, start_time, end_time, closed_at, victims, casualties, injured, missing, \
     description, created_at";

/// Maximum number of entries in the type breakdown.
pub const TOP_TYPES_LIMIT: u32 = 10;

/// Fetches one page of incidents matching `filter`, ordered per `query`.
///
/// Rows with equal sort values are ordered by id in the same direction, so
/// consecutive pages never repeat or skip a row.
///
/// Requesting a page past the end returns an empty page, not an error.
///
/// # Errors
///
/// Returns [`DbError`] if either statement fails.
pub async fn list_incidents(
    db: &dyn Database,
    filter: &IncidentFilter,
    query: &ListQuery,
) -> Result<IncidentPage, DbError> {
    let predicate = Predicate::build(filter, SearchMode::AnyWord);
    let where_clause = predicate.where_clause();

    let total = count_where(db, &predicate, "COUNT(*)").await?;

    let limit_idx = predicate.next_index();
    let sql = format!(
        "SELECT {INCIDENT_COLUMNS} FROM incidents{where_clause} ORDER BY {col} {dir}, id {dir} LIMIT ${limit_idx} OFFSET ${}",
        limit_idx + 1,
        col = query.sort_by.column(),
        dir = query.sort_order.keyword(),
    );

    let mut params = predicate.into_params();
    params.push(DatabaseValue::Int64(i64::from(query.limit.max(1))));
    params.push(DatabaseValue::Int64(
        i64::try_from(query.offset()).unwrap_or(i64::MAX),
    ));

    let rows = db.query_raw_params(&sql, &params).await?;

    let now = chrono::Utc::now().naive_utc();
    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        let incident = incident_from_row(row)?;
        let duration = duration_label(incident.start_time, incident.end_time.unwrap_or(now));
        items.push(IncidentListItem { incident, duration });
    }

    Ok(IncidentPage {
        items,
        pagination: Pagination::new(query, total),
    })
}

/// Counts matching incidents per status.
///
/// All three statuses are always present in the result, zero when absent.
/// `pending` is only non-zero when the filter asks for it explicitly.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn status_summary(
    db: &dyn Database,
    filter: &IncidentFilter,
) -> Result<StatusCounts, DbError> {
    let predicate = Predicate::build(filter, SearchMode::Phrase);
    let sql = format!(
        "SELECT LOWER(status) AS status, COUNT(*) AS count FROM incidents{} GROUP BY LOWER(status)",
        predicate.where_clause()
    );

    let rows = db.query_raw_params(&sql, predicate.params()).await?;

    Ok(tally_statuses(rows.iter().map(|row| {
        (
            row.to_value::<String>("status").unwrap_or_default(),
            row.to_value::<i64>("count").unwrap_or(0),
        )
    })))
}

/// Computes total incidents, distinct LGAs, and distinct `(state, lga)`
/// pairs among matching incidents.
///
/// # Errors
///
/// Returns [`DbError`] if any of the three queries fails.
pub async fn totals_summary(
    db: &dyn Database,
    filter: &IncidentFilter,
) -> Result<TotalsSummary, DbError> {
    let predicate = Predicate::build(filter, SearchMode::Phrase);

    let total_incidents = count_where(db, &predicate, "COUNT(*)").await?;
    let total_lgas = count_where(
        db,
        &Predicate::build(filter, SearchMode::Phrase).and("lga IS NOT NULL AND lga <> ''"),
        "COUNT(DISTINCT lga)",
    )
    .await?;
    let total_communities = count_distinct_places(db, filter).await?;

    Ok(TotalsSummary {
        total_incidents,
        total_lgas,
        total_communities,
    })
}

/// Counts distinct `(state, lga)` pairs with both parts present.
async fn count_distinct_places(db: &dyn Database, filter: &IncidentFilter) -> Result<u64, DbError> {
    let predicate = Predicate::build(filter, SearchMode::Phrase)
        .and("state IS NOT NULL AND state <> '' AND lga IS NOT NULL AND lga <> ''");
    let sql = format!(
        "SELECT COUNT(*) AS total FROM (SELECT DISTINCT state, lga FROM incidents{}) AS places",
        predicate.where_clause()
    );
    let rows = db.query_raw_params(&sql, predicate.params()).await?;
    let total: i64 = rows
        .first()
        .map_or(0, |row| row.to_value("total").unwrap_or(0));
    Ok(to_count(total))
}

/// Returns the most frequent incident types among matching incidents, most
/// frequent first, ties broken alphabetically.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn type_breakdown(
    db: &dyn Database,
    filter: &IncidentFilter,
) -> Result<Vec<TypeCount>, DbError> {
    let predicate =
        Predicate::build(filter, SearchMode::Phrase).and("type IS NOT NULL AND type <> ''");
    let sql = format!(
        "SELECT type, COUNT(*) AS count FROM incidents{} GROUP BY type ORDER BY count DESC, type ASC LIMIT {TOP_TYPES_LIMIT}",
        predicate.where_clause()
    );

    let rows = db.query_raw_params(&sql, predicate.params()).await?;

    Ok(rows
        .iter()
        .map(|row| TypeCount {
            incident_type: row.to_value("type").unwrap_or_default(),
            count: to_count(row.to_value("count").unwrap_or(0)),
        })
        .collect())
}

/// Counts matching incidents per calendar date of `start_time`.
///
/// Rows are fetched in chronological order, so buckets come out oldest
/// first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn timeline(
    db: &dyn Database,
    filter: &IncidentFilter,
) -> Result<Vec<TimelinePoint>, DbError> {
    let predicate = Predicate::build(filter, SearchMode::Phrase);
    let sql = format!(
        "SELECT id, start_time FROM incidents{} ORDER BY start_time ASC, id ASC",
        predicate.where_clause()
    );

    let rows = db.query_raw_params(&sql, predicate.params()).await?;

    Ok(bucket_by_date(
        rows.iter().map(|row| row_timestamp(row, "start_time")),
    ))
}

/// Sums victims, casualties, injured, and missing across matching
/// incidents.
///
/// A row without a recorded injured count contributes
/// `max(0, victims - casualties)` to the injured total. A row without a
/// recorded missing count contributes zero.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn victim_totals(
    db: &dyn Database,
    filter: &IncidentFilter,
) -> Result<VictimTotals, DbError> {
    let predicate = Predicate::build(filter, SearchMode::Phrase);
    let sql = format!(
        "SELECT COALESCE(SUM(victims), 0) AS total_victims,
                COALESCE(SUM(casualties), 0) AS total_casualties,
                COALESCE(SUM(COALESCE(injured,
                    CASE WHEN victims > casualties THEN victims - casualties ELSE 0 END)), 0)
                    AS total_injured,
                COALESCE(SUM(missing), 0) AS total_missing
         FROM incidents{}",
        predicate.where_clause()
    );

    let rows = db.query_raw_params(&sql, predicate.params()).await?;
    let Some(row) = rows.first() else {
        return Ok(VictimTotals::default());
    };

    Ok(VictimTotals {
        total_victims: to_count(row.to_value("total_victims").unwrap_or(0)),
        total_casualties: to_count(row.to_value("total_casualties").unwrap_or(0)),
        total_injured: to_count(row.to_value("total_injured").unwrap_or(0)),
        total_missing: to_count(row.to_value("total_missing").unwrap_or(0)),
    })
}

/// Fetches a single incident by id, regardless of status.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_incident(db: &dyn Database, id: i64) -> Result<Option<IncidentRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = $1"),
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    rows.first().map(incident_from_row).transpose()
}

/// Inserts a publicly submitted report with status `pending` and returns
/// its id.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails or no id is returned.
pub async fn insert_incident(db: &dyn Database, incident: &NewIncident) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO incidents (
                title, type, description, state, lga, latitude, longitude,
                start_time, victims, injured, casualties, missing, status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id",
            &[
                DatabaseValue::String(incident.title.clone()),
                DatabaseValue::String(incident.incident_type.clone()),
                DatabaseValue::String(incident.description.clone()),
                DatabaseValue::String(incident.state.clone()),
                DatabaseValue::String(incident.lga.clone()),
                incident
                    .latitude
                    .map_or(DatabaseValue::Null, DatabaseValue::Real64),
                incident
                    .longitude
                    .map_or(DatabaseValue::Null, DatabaseValue::Real64),
                DatabaseValue::DateTime(incident.start_time),
                DatabaseValue::Int32(incident.victims),
                DatabaseValue::Int32(incident.injured),
                DatabaseValue::Int32(incident.casualties),
                DatabaseValue::Int32(incident.missing),
                DatabaseValue::String(IncidentStatus::Pending.to_string()),
                DatabaseValue::DateTime(chrono::Utc::now().naive_utc()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get incident id from insert".to_string(),
    })?;

    row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse incident id: {e}"),
    })
}

/// Moves an incident to `status`.
///
/// Closing stamps `closed_at` and fills `end_time` if it is still empty.
/// Any other status clears `closed_at`. Returns `None` when no incident has
/// the given id.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub async fn update_incident_status(
    db: &dyn Database,
    id: i64,
    status: IncidentStatus,
) -> Result<Option<StatusChange>, DbError> {
    let (updated, closed_at) = if status == IncidentStatus::Closed {
        let now = chrono::Utc::now().naive_utc();
        let updated = db
            .exec_raw_params(
                "UPDATE incidents
                 SET status = $1, closed_at = $2, end_time = COALESCE(end_time, $3)
                 WHERE id = $4",
                &[
                    DatabaseValue::String(status.to_string()),
                    DatabaseValue::DateTime(now),
                    DatabaseValue::DateTime(now),
                    DatabaseValue::Int64(id),
                ],
            )
            .await?;
        (updated, Some(now))
    } else {
        let updated = db
            .exec_raw_params(
                "UPDATE incidents SET status = $1, closed_at = NULL WHERE id = $2",
                &[
                    DatabaseValue::String(status.to_string()),
                    DatabaseValue::Int64(id),
                ],
            )
            .await?;
        (updated, None)
    };

    if updated == 0 {
        return Ok(None);
    }

    log::info!("Incident {id} moved to {status}");

    Ok(Some(StatusChange {
        id,
        status,
        closed_at,
    }))
}

/// Runs `SELECT {aggregate} AS total FROM incidents{where}` and returns the
/// scalar.
async fn count_where(
    db: &dyn Database,
    predicate: &Predicate,
    aggregate: &str,
) -> Result<u64, DbError> {
    let sql = format!(
        "SELECT {aggregate} AS total FROM incidents{}",
        predicate.where_clause()
    );
    let rows = db.query_raw_params(&sql, predicate.params()).await?;
    let total: i64 = rows
        .first()
        .map_or(0, |row| row.to_value("total").unwrap_or(0));
    Ok(to_count(total))
}

/// Decodes a full incident row.
fn incident_from_row(row: &switchy_database::Row) -> Result<IncidentRow, DbError> {
    let status_str: String = row.to_value("status").unwrap_or_default();
    let status = status_str
        .parse::<IncidentStatus>()
        .map_err(|_| DbError::Conversion {
            message: format!("Unknown incident status '{status_str}'"),
        })?;

    Ok(IncidentRow {
        id: row.to_value("id").unwrap_or(0),
        title: row.to_value("title").unwrap_or(None),
        incident_type: row.to_value("type").unwrap_or_default(),
        category: row.to_value("category").unwrap_or(None),
        state: row.to_value("state").unwrap_or(None),
        lga: row.to_value("lga").unwrap_or(None),
        latitude: row.to_value("latitude").unwrap_or(None),
        longitude: row.to_value("longitude").unwrap_or(None),
        status,
        start_time: row_timestamp(row, "start_time").unwrap_or_default(),
        end_time: row_timestamp(row, "end_time"),
        closed_at: row_timestamp(row, "closed_at"),
        victims: row.to_value("victims").unwrap_or(0),
        casualties: row.to_value("casualties").unwrap_or(0),
        injured: row.to_value("injured").unwrap_or(None),
        missing: row.to_value("missing").unwrap_or(None),
        description: row.to_value("description").unwrap_or(None),
        created_at: row_timestamp(row, "created_at"),
    })
}

/// Folds `(status, count)` rows into [`StatusCounts`]. Unknown statuses
/// are dropped.
fn tally_statuses(rows: impl IntoIterator<Item = (String, i64)>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for (status, count) in rows {
        let count = to_count(count);
        match status.parse::<IncidentStatus>() {
            Ok(IncidentStatus::Open) => counts.open += count,
            Ok(IncidentStatus::Closed) => counts.closed += count,
            Ok(IncidentStatus::Pending) => counts.pending += count,
            Err(_) => log::warn!("Ignoring unknown incident status '{status}' in summary"),
        }
    }
    counts
}

/// Buckets start times by `YYYY-MM-DD`, in order of first appearance.
/// Missing start times are skipped.
fn bucket_by_date(start_times: impl IntoIterator<Item = Option<NaiveDateTime>>) -> Vec<TimelinePoint> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();

    for start in start_times.into_iter().flatten() {
        let date = start.format("%Y-%m-%d").to_string();
        let count = counts.entry(date.clone()).or_insert(0);
        if *count == 0 {
            order.push(date);
        }
        *count += 1;
    }

    order
        .into_iter()
        .map(|date| {
            let count = counts.get(&date).copied().unwrap_or(0);
            TimelinePoint { date, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Seed, insert, memory_db, seed};
    use chrono::NaiveDate;
    use safer_incident_models::{SortColumn, SortOrder};

    fn at(month: u32, day: u32, hour: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2025, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
    }

    #[test]
    fn tally_seeds_all_statuses() {
        assert_eq!(
            tally_statuses(Vec::new()),
            StatusCounts {
                open: 0,
                closed: 0,
                pending: 0
            }
        );

        let counts = tally_statuses(vec![
            ("open".to_string(), 4),
            ("closed".to_string(), 2),
            ("archived".to_string(), 9),
        ]);
        assert_eq!(counts.open, 4);
        assert_eq!(counts.closed, 2);
        assert_eq!(counts.pending, 0);
    }

    #[test]
    fn same_day_incidents_share_a_bucket() {
        let points = bucket_by_date(vec![at(3, 1, 8), at(3, 1, 22), None, at(3, 2, 1)]);
        assert_eq!(
            points,
            vec![
                TimelinePoint {
                    date: "2025-03-01".to_string(),
                    count: 2
                },
                TimelinePoint {
                    date: "2025-03-02".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn buckets_follow_first_appearance() {
        let points = bucket_by_date(vec![at(5, 9, 0), at(1, 2, 0), at(5, 9, 3)]);
        let dates: Vec<_> = points.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, ["2025-05-09", "2025-01-02"]);
        assert_eq!(points[0].count, 2);
    }

    #[tokio::test]
    async fn pending_reports_only_appear_when_requested() {
        let db = memory_db().await;
        insert(db.as_ref(), "Kidnapping", "Kaduna", "Zaria", "open", 3, 1, "road ambush").await;
        insert(db.as_ref(), "Flood", "Lagos", "Ikeja", "closed", 0, 0, "river overflow").await;
        insert(db.as_ref(), "Robbery", "Lagos", "Ikeja", "pending", 1, 0, "new report").await;

        let counts = status_summary(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(
            counts,
            StatusCounts {
                open: 1,
                closed: 1,
                pending: 0
            }
        );

        let pending_only = IncidentFilter {
            status: Some(IncidentStatus::Pending),
            ..IncidentFilter::default()
        };
        let counts = status_summary(db.as_ref(), &pending_only).await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.open, 0);
    }

    #[tokio::test]
    async fn totals_count_distinct_places() {
        let db = memory_db().await;
        insert(db.as_ref(), "Kidnapping", "Kaduna", "Zaria", "open", 0, 0, "").await;
        insert(db.as_ref(), "Kidnapping", "Kaduna", "Zaria", "open", 0, 0, "").await;
        insert(db.as_ref(), "Flood", "Lagos", "Ikeja", "closed", 0, 0, "").await;
        insert(db.as_ref(), "Flood", "Ogun", "Ikeja", "closed", 0, 0, "").await;
        insert(db.as_ref(), "Flood", "Ogun", "", "open", 0, 0, "").await;

        let totals = totals_summary(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(totals.total_incidents, 5);
        assert_eq!(totals.total_lgas, 2);
        assert_eq!(totals.total_communities, 3);
    }

    #[tokio::test]
    async fn type_breakdown_orders_by_count() {
        let db = memory_db().await;
        for _ in 0..3 {
            insert(db.as_ref(), "Banditry", "Zamfara", "Gusau", "open", 0, 0, "").await;
        }
        insert(db.as_ref(), "Flood", "Lagos", "Ikeja", "open", 0, 0, "").await;
        insert(db.as_ref(), "", "Lagos", "Ikeja", "open", 0, 0, "").await;

        let types = type_breakdown(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(
            types,
            vec![
                TypeCount {
                    incident_type: "Banditry".to_string(),
                    count: 3
                },
                TypeCount {
                    incident_type: "Flood".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn victim_search_matches_whole_phrase_only() {
        let db = memory_db().await;
        insert(db.as_ref(), "Flood", "Lagos", "Ikeja", "open", 5, 1, "flood near market").await;
        insert(db.as_ref(), "Kidnapping", "Kaduna", "Zaria", "open", 2, 0, "kidnap on highway").await;
        insert(db.as_ref(), "Flood", "Niger", "Mokwa", "open", 7, 2, "Flood Kidnap reported").await;

        let phrase = IncidentFilter {
            search: Some("flood kidnap".to_string()),
            ..IncidentFilter::default()
        };
        let totals = victim_totals(db.as_ref(), &phrase).await.unwrap();
        assert_eq!(totals.total_victims, 7);
        assert_eq!(totals.total_casualties, 2);
        assert_eq!(totals.total_injured, 5);
        assert_eq!(totals.total_missing, 0);

        let everything = victim_totals(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(everything.total_victims, 14);
    }

    #[tokio::test]
    async fn recorded_and_derived_injuries_are_summed_per_row() {
        let db = memory_db().await;
        seed(
            db.as_ref(),
            &Seed {
                victims: 10,
                casualties: 3,
                injured: Some(4),
                ..Seed::default()
            },
        )
        .await;
        seed(
            db.as_ref(),
            &Seed {
                victims: 5,
                casualties: 1,
                ..Seed::default()
            },
        )
        .await;
        seed(
            db.as_ref(),
            &Seed {
                victims: 1,
                casualties: 4,
                ..Seed::default()
            },
        )
        .await;

        let totals = victim_totals(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(
            totals,
            VictimTotals {
                total_victims: 16,
                total_casualties: 8,
                total_injured: 8,
                total_missing: 0,
            }
        );
    }

    #[tokio::test]
    async fn victim_totals_are_zero_without_matches() {
        let db = memory_db().await;
        let totals = victim_totals(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(totals, VictimTotals::default());
    }

    #[tokio::test]
    async fn hyphenated_places_stay_distinct() {
        let db = memory_db().await;
        insert(db.as_ref(), "Flood", "Akwa-Ibom", "X", "open", 0, 0, "").await;
        insert(db.as_ref(), "Flood", "Akwa", "Ibom-X", "open", 0, 0, "").await;

        let totals = totals_summary(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(totals.total_communities, 2);
        assert_eq!(totals.total_lgas, 2);
    }

    #[tokio::test]
    async fn list_search_matches_any_word() {
        let db = memory_db().await;
        insert(db.as_ref(), "Flood", "Lagos", "Ikeja", "open", 0, 0, "river overflow").await;
        insert(db.as_ref(), "Banditry", "Kaduna", "Zaria", "open", 0, 0, "kidnap on highway").await;
        insert(db.as_ref(), "Robbery", "Lagos", "Ikeja", "open", 0, 0, "armed robbery").await;
        insert(db.as_ref(), "Flood", "Niger", "Mokwa", "pending", 0, 0, "unreviewed").await;

        let filter = IncidentFilter {
            search: Some("flood kidnap".to_string()),
            ..IncidentFilter::default()
        };
        let page = list_incidents(db.as_ref(), &filter, &ListQuery::default())
            .await
            .unwrap();

        let mut types: Vec<_> = page
            .items
            .iter()
            .map(|item| item.incident.incident_type.as_str())
            .collect();
        types.sort_unstable();
        assert_eq!(types, ["Banditry", "Flood"]);
        assert_eq!(page.pagination.total_items, 2);
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let db = memory_db().await;
        for _ in 0..3 {
            insert(db.as_ref(), "Flood", "Lagos", "Ikeja", "open", 0, 0, "").await;
        }

        let query = ListQuery {
            page: 9,
            limit: 1,
            ..ListQuery::default()
        };
        let page = list_incidents(db.as_ref(), &IncidentFilter::default(), &query)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(
            page.pagination,
            Pagination {
                current_page: 9,
                total_pages: 3,
                total_items: 3,
                items_per_page: 1,
            }
        );
    }

    #[tokio::test]
    async fn tied_sort_values_page_by_id() {
        let db = memory_db().await;
        for _ in 0..3 {
            insert(db.as_ref(), "Flood", "Lagos", "Ikeja", "open", 2, 0, "").await;
        }

        for (order, expected) in [(SortOrder::Desc, [3_i64, 2, 1]), (SortOrder::Asc, [1, 2, 3])] {
            let mut ids = Vec::new();
            for page in 1..=3 {
                let query = ListQuery {
                    page,
                    limit: 1,
                    sort_by: SortColumn::Victims,
                    sort_order: order,
                };
                let listed = list_incidents(db.as_ref(), &IncidentFilter::default(), &query)
                    .await
                    .unwrap();
                ids.extend(listed.items.iter().map(|item| item.incident.id));
            }
            assert_eq!(ids, expected, "{order:?}");
        }
    }

    #[tokio::test]
    async fn date_range_and_year_bound_start_time() {
        let db = memory_db().await;
        for start_time in [
            test_support::at(2024, 12, 31, 8),
            test_support::at(2025, 2, 10, 9),
            test_support::at(2025, 3, 5, 17),
        ] {
            seed(
                db.as_ref(),
                &Seed {
                    start_time,
                    ..Seed::default()
                },
            )
            .await;
        }

        let february = IncidentFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 2, 28),
            ..IncidentFilter::default()
        };
        let page = list_incidents(db.as_ref(), &february, &ListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total_items, 1);
        assert_eq!(page.items[0].incident.id, 2);
        assert_eq!(page.items[0].incident.start_time, at(2, 10, 9).unwrap());

        let this_year = IncidentFilter {
            year: Some(2025),
            ..IncidentFilter::default()
        };
        let page = list_incidents(db.as_ref(), &this_year, &ListQuery::default())
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|item| item.incident.id).collect();
        assert_eq!(ids, [3_i64, 2]);
    }

    #[tokio::test]
    async fn timeline_groups_rows_by_date() {
        let db = memory_db().await;
        for (status, start_time) in [
            ("open", at(3, 1, 22)),
            ("closed", at(2, 27, 10)),
            ("open", at(3, 1, 8)),
            ("pending", at(3, 2, 12)),
        ] {
            seed(
                db.as_ref(),
                &Seed {
                    status,
                    start_time: start_time.unwrap(),
                    ..Seed::default()
                },
            )
            .await;
        }

        let points = timeline(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(
            points,
            vec![
                TimelinePoint {
                    date: "2025-02-27".to_string(),
                    count: 1
                },
                TimelinePoint {
                    date: "2025-03-01".to_string(),
                    count: 2
                },
            ]
        );
    }

    fn report(title: &str) -> NewIncident {
        NewIncident {
            title: title.to_string(),
            incident_type: "Kidnapping".to_string(),
            description: "Travellers taken near the toll gate".to_string(),
            state: "Kaduna".to_string(),
            lga: "Chikun".to_string(),
            start_time: at(4, 2, 6).unwrap(),
            latitude: Some(10.28),
            longitude: None,
            victims: 4,
            injured: 1,
            casualties: 0,
            missing: 3,
        }
    }

    #[tokio::test]
    async fn submitted_reports_stay_pending_until_reviewed() {
        let db = memory_db().await;
        let id = insert_incident(db.as_ref(), &report("Toll gate abduction"))
            .await
            .unwrap();

        let stored = get_incident(db.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(stored.status, IncidentStatus::Pending);
        assert_eq!(stored.title.as_deref(), Some("Toll gate abduction"));
        assert_eq!(stored.start_time, at(4, 2, 6).unwrap());
        assert_eq!(stored.missing, Some(3));
        assert_eq!(stored.latitude, Some(10.28));
        assert!(stored.longitude.is_none());
        assert!(stored.created_at.is_some());
        assert!(stored.closed_at.is_none());

        let counts = status_summary(db.as_ref(), &IncidentFilter::default())
            .await
            .unwrap();
        assert_eq!(counts, StatusCounts::default());

        let pending = IncidentFilter {
            status: Some(IncidentStatus::Pending),
            ..IncidentFilter::default()
        };
        let counts = status_summary(db.as_ref(), &pending).await.unwrap();
        assert_eq!(counts.pending, 1);
    }

    #[tokio::test]
    async fn closing_stamps_and_reopening_clears_closed_at() {
        let db = memory_db().await;
        let id = insert_incident(db.as_ref(), &report("Market fire"))
            .await
            .unwrap();

        let change = update_incident_status(db.as_ref(), id, IncidentStatus::Closed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.status, IncidentStatus::Closed);
        assert!(change.closed_at.is_some());

        let closed = get_incident(db.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(closed.status, IncidentStatus::Closed);
        assert!(closed.closed_at.is_some());
        assert!(closed.end_time.is_some());

        let change = update_incident_status(db.as_ref(), id, IncidentStatus::Open)
            .await
            .unwrap()
            .unwrap();
        assert!(change.closed_at.is_none());

        let reopened = get_incident(db.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(reopened.status, IncidentStatus::Open);
        assert!(reopened.closed_at.is_none());
        assert_eq!(reopened.end_time, closed.end_time);
    }

    #[tokio::test]
    async fn unknown_incident_ids_are_reported_missing() {
        let db = memory_db().await;
        assert!(get_incident(db.as_ref(), 404).await.unwrap().is_none());
        assert!(
            update_incident_status(db.as_ref(), 404, IncidentStatus::Closed)
                .await
                .unwrap()
                .is_none()
        );
    }
}
