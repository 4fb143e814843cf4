#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident filter, list query, and row types.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the database. They are distinct from the HTTP request and response types
//! in `safer_server_models`, which parse raw query strings into these.

use chrono::{NaiveDate, NaiveDateTime};
use safer_incident_models::{AgentType, IncidentStatus, JobStatus, JobType, SortColumn, SortOrder};
use serde::{Deserialize, Serialize};

/// Default page size for the incident list.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// The recognized incident filters, already parsed and typed.
///
/// Every field is optional. An empty filter still restricts results to
/// public statuses unless `status` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentFilter {
    /// Exact match on `category`.
    pub category: Option<String>,
    /// Exact match on `lga`.
    pub lga: Option<String>,
    /// Exact match on `type`.
    pub incident_type: Option<String>,
    /// Exact match on `state`.
    pub state: Option<String>,
    /// Exact match on `status`. `None` means open or closed.
    pub status: Option<IncidentStatus>,
    /// Inclusive lower bound on `start_time` (from midnight).
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on `start_time` (through 23:59:59).
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring search across type, state, lga, and
    /// description.
    pub search: Option<String>,
    /// Restricts `start_time` to a calendar year. Only the list view sets
    /// this.
    pub year: Option<i32>,
}

/// Pagination and ordering for the incident list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// One-based page number.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
    /// Column to order by.
    pub sort_by: SortColumn,
    /// Ordering direction.
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: SortColumn::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl ListQuery {
    /// Number of rows to skip for the current page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit.max(1))
    }
}

/// Pagination metadata returned alongside a page of incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u32,
}

impl Pagination {
    /// Builds pagination metadata, with `total_pages = ceil(total / limit)`.
    #[must_use]
    pub fn new(query: &ListQuery, total_items: u64) -> Self {
        let limit = query.limit.max(1);
        Self {
            current_page: query.page,
            total_pages: total_items.div_ceil(u64::from(limit)),
            total_items,
            items_per_page: limit,
        }
    }
}

/// An incident row as retrieved from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRow {
    /// Primary key.
    pub id: i64,
    /// Short headline supplied by the reporter.
    pub title: Option<String>,
    /// Category label, e.g. `"Kidnapping"`.
    #[serde(rename = "type")]
    pub incident_type: String,
    /// Optional secondary classification.
    pub category: Option<String>,
    /// State.
    pub state: Option<String>,
    /// Local government area.
    pub lga: Option<String>,
    /// Latitude (WGS84).
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    pub longitude: Option<f64>,
    /// Lifecycle status.
    pub status: IncidentStatus,
    /// When the incident began.
    pub start_time: NaiveDateTime,
    /// When the incident ended.
    pub end_time: Option<NaiveDateTime>,
    /// When the incident was marked closed.
    pub closed_at: Option<NaiveDateTime>,
    pub victims: i32,
    pub casualties: i32,
    /// `None` for rows recorded before injuries were tracked.
    pub injured: Option<i32>,
    /// `None` for rows recorded before missing persons were tracked.
    pub missing: Option<i32>,
    /// Free-text description.
    pub description: Option<String>,
    /// When the row was created.
    pub created_at: Option<NaiveDateTime>,
}

/// An incident in the list view with its derived duration label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentListItem {
    #[serde(flatten)]
    pub incident: IncidentRow,
    /// Hour-granularity duration, e.g. `"2d 5h"`.
    pub duration: String,
}

/// One page of the incident list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentPage {
    pub items: Vec<IncidentListItem>,
    pub pagination: Pagination,
}

/// Incident counts per status. All three keys are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub open: u64,
    pub closed: u64,
    pub pending: u64,
}

/// Scalar totals for the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsSummary {
    /// Matching incidents.
    pub total_incidents: u64,
    /// Distinct non-empty LGAs among matching incidents.
    pub total_lgas: u64,
    /// Distinct non-empty `(state, lga)` pairs among matching incidents.
    pub total_communities: u64,
}

/// Number of incidents of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub incident_type: String,
    pub count: u64,
}

/// Number of incidents that started on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub count: u64,
}

/// Summed casualty figures across matching incidents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictimTotals {
    pub total_victims: u64,
    pub total_casualties: u64,
    pub total_injured: u64,
    pub total_missing: u64,
}

/// The subset of an incident the weekly digest summarises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRow {
    pub incident_type: Option<String>,
    pub state: Option<String>,
    pub status: IncidentStatus,
    pub victims: i32,
    pub casualties: i32,
}

/// A public incident report to insert. Always stored as pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncident {
    pub title: String,
    pub incident_type: String,
    pub description: String,
    pub state: String,
    pub lga: String,
    pub start_time: NaiveDateTime,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub victims: i32,
    pub injured: i32,
    pub casualties: i32,
    pub missing: i32,
}

/// Result of an incident status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: i64,
    pub status: IncidentStatus,
    /// Set only when the new status is `closed`.
    pub closed_at: Option<NaiveDateTime>,
}

/// A hire-security-agent request as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequestRow {
    pub id: i64,
    pub full_name: String,
    /// Digits only.
    pub phone: String,
    pub email: Option<String>,
    pub agent_type: AgentType,
    pub job_type: JobType,
    pub state: String,
    pub lga: String,
    pub address: String,
    pub job_details: Option<String>,
    pub number_of_agents: i32,
    pub number_of_days: i32,
    pub inter_city: bool,
    pub foreign_national: bool,
    pub status: JobStatus,
    pub created_at: Option<NaiveDateTime>,
}

/// A validated job request to insert. Always stored as pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJobRequest {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub agent_type: AgentType,
    pub job_type: JobType,
    pub state: String,
    pub lga: String,
    pub address: String,
    pub job_details: Option<String>,
    pub number_of_agents: i32,
    pub number_of_days: i32,
    pub inter_city: bool,
    pub foreign_national: bool,
}

/// A community alert subscription to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub name: String,
    /// Digits only. At most one subscription per number.
    pub whatsapp_number: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        let query = ListQuery {
            page: 3,
            limit: 20,
            ..ListQuery::default()
        };
        assert_eq!(query.offset(), 40);
        assert_eq!(ListQuery::default().offset(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let query = ListQuery {
            limit: 20,
            ..ListQuery::default()
        };
        assert_eq!(Pagination::new(&query, 0).total_pages, 0);
        assert_eq!(Pagination::new(&query, 1).total_pages, 1);
        assert_eq!(Pagination::new(&query, 20).total_pages, 1);
        assert_eq!(Pagination::new(&query, 41).total_pages, 3);
    }

    #[test]
    fn pagination_echoes_request() {
        let query = ListQuery {
            page: 7,
            limit: 5,
            ..ListQuery::default()
        };
        let pagination = Pagination::new(&query, 12);
        assert_eq!(pagination.current_page, 7);
        assert_eq!(pagination.items_per_page, 5);
        assert_eq!(pagination.total_items, 12);
        assert_eq!(pagination.total_pages, 3);
    }
}
