#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident lifecycle, sorting, and job-request enums.
//!
//! This crate defines the small closed vocabularies used across the safer
//! system: the incident status lifecycle, the sortable columns of the public
//! incident list, and the agent/job/status values accepted by the
//! hire-security-agent flow. It also holds the duration labels rendered
//! next to incidents, since both the list and detail views derive them from
//! the same two timestamps.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lifecycle status of an incident.
///
/// Newly submitted reports start as [`IncidentStatus::Pending`] and move
/// through `open` to `closed` as administrators review them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IncidentStatus {
    /// Submitted by the public, awaiting review.
    Pending,
    /// Reviewed and ongoing.
    Open,
    /// Resolved.
    Closed,
}

impl IncidentStatus {
    /// Statuses included in public aggregate views when the caller does not
    /// ask for a specific one.
    pub const PUBLIC: [Self; 2] = [Self::Open, Self::Closed];

    /// Returns every status in lifecycle order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pending, Self::Open, Self::Closed]
    }

    /// Whether incidents in this status show up in public views by default.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }
}

/// Columns the incident list may be ordered by.
///
/// Anything outside this set falls back to [`SortColumn::StartTime`], so a
/// caller-supplied string never reaches the `ORDER BY` clause.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortColumn {
    #[default]
    StartTime,
    EndTime,
    Victims,
    Casualties,
    Type,
    State,
    Lga,
}

impl SortColumn {
    /// Parses a `sort_by` value, falling back to `start_time` for anything
    /// not on the allow-list.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// The column name as it appears in SQL.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::StartTime => "start_time",
            Self::EndTime => "end_time",
            Self::Victims => "victims",
            Self::Casualties => "casualties",
            Self::Type => "type",
            Self::State => "state",
            Self::Lga => "lga",
        }
    }
}

/// Direction of the incident list ordering.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses a `sort_order` value case-insensitively. Anything other than
    /// `asc` means descending.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.trim().parse().ok()).unwrap_or_default()
    }

    /// The SQL keyword for this direction.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Kind of agent a job request asks for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgentType {
    Bouncers,
    Security,
    Police,
    /// Nigeria Security and Civil Defence Corps.
    Nscdc,
}

/// Kind of engagement a job request describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobType {
    Event,
    Trip,
}

/// Review status of a job request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Reviewed,
    Assigned,
    Cancelled,
}

/// Hour-granularity duration label used by the incident list.
///
/// Produces `"{d}d {h}h"` when the span covers at least a day, `"{h}h"` for
/// shorter spans, and `"0h"` when the span is under an hour or negative.
#[must_use]
pub fn duration_label(start: NaiveDateTime, end: NaiveDateTime) -> String {
    let hours = (end - start).num_hours();
    if hours <= 0 {
        return "0h".to_string();
    }

    let days = hours / 24;
    let remaining = hours % 24;

    if days > 0 {
        format!("{days}d {remaining}h")
    } else {
        format!("{hours}h")
    }
}

/// Minute-granularity duration label used by the incident detail view.
///
/// Joins the non-zero day, hour, and minute parts (`"2d 5m"`), or returns
/// `"0m"` when every part is zero.
#[must_use]
pub fn detailed_duration_label(start: NaiveDateTime, end: NaiveDateTime) -> String {
    let minutes = (end - start).num_minutes().max(0);
    let days = minutes / (24 * 60);
    let hours = (minutes % (24 * 60)) / 60;
    let mins = minutes % 60;

    let parts: Vec<String> = [(days, 'd'), (hours, 'h'), (mins, 'm')]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        "0m".to_string()
    } else {
        parts.join(" ")
    }
}
