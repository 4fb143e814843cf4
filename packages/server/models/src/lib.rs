#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safer server.
//!
//! Query strings and JSON bodies arrive as loosely typed structs and are
//! validated here into the typed values the database layer accepts. Every
//! rejection is a [`ValidationError`] whose message is safe to return to
//! the client.

use chrono::{NaiveDate, NaiveDateTime};
use safer_database_models::{
    IncidentFilter, IncidentListItem, IncidentRow, JobRequestRow, ListQuery, NewIncident,
    NewJobRequest, NewSubscription, Pagination, StatusChange, StatusCounts, TimelinePoint, TotalsSummary,
    TypeCount, VictimTotals,
};
use safer_incident_models::{
    AgentType, IncidentStatus, JobStatus, JobType, SortColumn, SortOrder,
};
use safer_pricing::PriceRequest;
use serde::{Deserialize, Serialize};

/// Shortest accepted phone number, in digits.
pub const MIN_PHONE_DIGITS: usize = 7;

/// Longest accepted phone number, in digits.
pub const MAX_PHONE_DIGITS: usize = 15;

/// A rejected request. The `Display` text is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid {field} '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid datetime '{0}'")]
    InvalidDatetime(String),

    #[error("Invalid status. Must be: open, closed, or pending")]
    InvalidIncidentStatus,

    #[error("Invalid incident ID")]
    InvalidIncidentId,

    #[error("{0} must be a non-negative number")]
    NegativeCount(&'static str),

    #[error("Invalid phone number")]
    InvalidPhone,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Invalid agent_type. Must be: bouncers, security, police, or nscdc")]
    InvalidAgentType,

    #[error("Invalid job_type. Must be: event or trip")]
    InvalidJobType,

    #[error("{0} must be >= 1")]
    CountBelowOne(&'static str),

    #[error("Invalid status. Must be: pending, reviewed, assigned, or cancelled")]
    InvalidJobStatus,

    #[error("Invalid id")]
    InvalidId,
}

/// Query parameters accepted by the incident list and every stats view.
///
/// Unrecognized parameters are dropped by deserialization. `year`, `page`,
/// `limit`, `sort_by`, and `sort_order` only affect the list view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentQueryParams {
    pub category: Option<String>,
    pub lga: Option<String>,
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub year: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl IncidentQueryParams {
    /// Filter for the aggregate views. `year` is not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `status` is not a known status or a
    /// date is not `YYYY-MM-DD`.
    pub fn to_filter(&self) -> Result<IncidentFilter, ValidationError> {
        Ok(IncidentFilter {
            category: non_empty(self.category.as_deref()),
            lga: non_empty(self.lga.as_deref()),
            incident_type: non_empty(self.incident_type.as_deref()),
            state: non_empty(self.state.as_deref()),
            status: non_empty(self.status.as_deref())
                .map(|s| {
                    s.parse::<IncidentStatus>()
                        .map_err(|_| ValidationError::InvalidIncidentStatus)
                })
                .transpose()?,
            start_date: parse_date("start_date", self.start_date.as_deref())?,
            end_date: parse_date("end_date", self.end_date.as_deref())?,
            search: non_empty(self.search.as_deref()),
            year: None,
        })
    }

    /// Filter for the list view, including the `year` shorthand. A year
    /// that is not a positive integer is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`Self::to_filter`].
    pub fn to_list_filter(&self) -> Result<IncidentFilter, ValidationError> {
        Ok(IncidentFilter {
            year: self
                .year
                .as_deref()
                .and_then(|y| y.trim().parse::<i32>().ok())
                .filter(|y| *y > 0),
            ..self.to_filter()?
        })
    }

    /// Pagination and ordering. Missing, malformed, or sub-1 `page` and
    /// `limit` values fall back to 1 and 20 respectively.
    #[must_use]
    pub fn to_list_query(&self) -> ListQuery {
        let defaults = ListQuery::default();
        ListQuery {
            page: parse_positive(self.page.as_deref()).unwrap_or(defaults.page),
            limit: parse_positive(self.limit.as_deref()).unwrap_or(defaults.limit),
            sort_by: SortColumn::parse_or_default(self.sort_by.as_deref()),
            sort_order: SortOrder::parse_or_default(self.sort_order.as_deref()),
        }
    }
}

/// Parses a positive integer id from a path segment.
///
/// # Errors
///
/// Returns `invalid` if the segment is not a positive integer.
pub fn parse_id(raw: &str, invalid: ValidationError) -> Result<i64, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid),
    }
}

/// A public incident report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportBody {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    pub description: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    /// `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]`, or `YYYY-MM-DD`.
    pub datetime: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub victims: Option<i64>,
    pub injured: Option<i64>,
    /// Stored as `casualties`.
    pub dead: Option<i64>,
    pub missing: Option<i64>,
}

impl ReportBody {
    /// Validates the report.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a required field is blank, the
    /// datetime cannot be parsed, or a count is negative.
    pub fn validate(self) -> Result<NewIncident, ValidationError> {
        let (Some(title), Some(incident_type), Some(description), Some(state), Some(lga), Some(datetime)) = (
            non_empty(self.title.as_deref()),
            non_empty(self.incident_type.as_deref()),
            non_empty(self.description.as_deref()),
            non_empty(self.state.as_deref()),
            non_empty(self.lga.as_deref()),
            non_empty(self.datetime.as_deref()),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        Ok(NewIncident {
            title,
            incident_type,
            description,
            state,
            lga,
            start_time: parse_report_datetime(&datetime)?,
            latitude: self.latitude,
            longitude: self.longitude,
            victims: count("victims", self.victims)?,
            injured: count("injured", self.injured)?,
            casualties: count("dead", self.dead)?,
            missing: count("missing", self.missing)?,
        })
    }
}

/// Admin status transition for an incident.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateBody {
    pub id: i64,
    pub status: String,
}

impl StatusUpdateBody {
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a non-positive id or unknown status.
    pub fn validate(&self) -> Result<(i64, IncidentStatus), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidIncidentId);
        }
        let status = self
            .status
            .trim()
            .parse::<IncidentStatus>()
            .map_err(|_| ValidationError::InvalidIncidentStatus)?;
        Ok((self.id, status))
    }
}

/// A hire-an-agent request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobRequestBody {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub agent_type: Option<String>,
    pub job_type: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub address: Option<String>,
    pub job_details: Option<String>,
    pub number_of_agents: Option<i64>,
    pub number_of_days: Option<i64>,
    pub inter_city: Option<bool>,
    pub foreign_national: Option<bool>,
}

impl JobRequestBody {
    /// Validates the request and normalizes the phone number to digits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for blank required fields, an unknown
    /// agent or job type, a malformed phone or email, or agent/day counts
    /// below 1.
    pub fn validate(self) -> Result<NewJobRequest, ValidationError> {
        let (Some(full_name), Some(phone), Some(agent_type), Some(job_type), Some(state), Some(lga), Some(address)) = (
            non_empty(self.full_name.as_deref()),
            non_empty(self.phone.as_deref()),
            non_empty(self.agent_type.as_deref()),
            non_empty(self.job_type.as_deref()),
            non_empty(self.state.as_deref()),
            non_empty(self.lga.as_deref()),
            non_empty(self.address.as_deref()),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        let agent_type = agent_type
            .parse::<AgentType>()
            .map_err(|_| ValidationError::InvalidAgentType)?;
        let job_type = job_type
            .parse::<JobType>()
            .map_err(|_| ValidationError::InvalidJobType)?;

        let email = non_empty(self.email.as_deref());
        if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(NewJobRequest {
            full_name,
            phone: normalize_phone(&phone)?,
            email,
            agent_type,
            job_type,
            state,
            lga,
            address,
            job_details: non_empty(self.job_details.as_deref()),
            number_of_agents: at_least_one("number_of_agents", self.number_of_agents)?,
            number_of_days: at_least_one("number_of_days", self.number_of_days)?,
            inter_city: self.inter_city.unwrap_or(false),
            foreign_national: self.foreign_national.unwrap_or(false),
        })
    }
}

/// A community alert sign-up. `phone` is accepted for `whatsapp_number`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeBody {
    pub name: Option<String>,
    #[serde(alias = "phone")]
    pub whatsapp_number: Option<String>,
    pub email: Option<String>,
}

impl SubscribeBody {
    /// Validates the sign-up and normalizes the WhatsApp number to digits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a blank field or a malformed email or
    /// phone number.
    pub fn validate(self) -> Result<NewSubscription, ValidationError> {
        let (Some(name), Some(whatsapp_number), Some(email)) = (
            non_empty(self.name.as_deref()),
            non_empty(self.whatsapp_number.as_deref()),
            non_empty(self.email.as_deref()),
        ) else {
            return Err(ValidationError::MissingFields);
        };

        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(NewSubscription {
            name,
            whatsapp_number: normalize_phone(&whatsapp_number)?,
            email,
        })
    }
}

/// Admin status transition for a job request.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusBody {
    pub id: i64,
    pub status: String,
}

impl JobStatusBody {
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a non-positive id or unknown status.
    pub fn validate(&self) -> Result<(i64, JobStatus), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidId);
        }
        let status = self
            .status
            .trim()
            .parse::<JobStatus>()
            .map_err(|_| ValidationError::InvalidJobStatus)?;
        Ok((self.id, status))
    }
}

/// Query parameters for an ad-hoc price quote. Missing counts mean 1.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteParams {
    pub agents: Option<i64>,
    pub days: Option<i64>,
    pub inter_city: Option<bool>,
    pub foreign_national: Option<bool>,
}

impl From<&QuoteParams> for PriceRequest {
    fn from(params: &QuoteParams) -> Self {
        Self {
            agents: params.agents.unwrap_or(1),
            days: params.days.unwrap_or(1),
            inter_city: params.inter_city.unwrap_or(false),
            foreign_national: params.foreign_national.unwrap_or(false),
        }
    }
}

impl From<&NewJobRequest> for PriceRequest {
    fn from(job: &NewJobRequest) -> Self {
        Self {
            agents: i64::from(job.number_of_agents),
            days: i64::from(job.number_of_days),
            inter_city: job.inter_city,
            foreign_national: job.foreign_national,
        }
    }
}

impl From<&JobRequestRow> for PriceRequest {
    fn from(job: &JobRequestRow) -> Self {
        Self {
            agents: i64::from(job.number_of_agents),
            days: i64::from(job.number_of_days),
            inter_city: job.inter_city,
            foreign_national: job.foreign_national,
        }
    }
}

/// A successful response: `{"success": true, ...body}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// A failed response: `{"success": false, "error": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// `{"data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct DataBody<T: Serialize> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentListBody {
    pub data: Vec<IncidentListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSummaryBody {
    pub data: StatusCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsBody {
    #[serde(flatten)]
    pub totals: TotalsSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypesBody {
    pub types: Vec<TypeCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineBody {
    pub timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VictimsBody {
    #[serde(flatten)]
    pub totals: VictimTotals,
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestBody {
    pub summary: String,
}

/// An incident with its minute-granularity duration.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentDetail {
    #[serde(flatten)]
    pub incident: IncidentRow,
    pub duration: String,
    pub is_closed: bool,
}

impl IncidentDetail {
    /// Derives the duration to `end_time`, or to `now` while the incident
    /// is still running.
    #[must_use]
    pub fn new(incident: IncidentRow, now: NaiveDateTime) -> Self {
        let duration = safer_incident_models::detailed_duration_label(
            incident.start_time,
            incident.end_time.unwrap_or(now),
        );
        let is_closed = incident.status == IncidentStatus::Closed;
        Self {
            incident,
            duration,
            is_closed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportCreatedBody {
    pub incident_id: i64,
    pub status: IncidentStatus,
    /// Where the stored report can be fetched once reviewed.
    pub permalink: String,
}

impl ReportCreatedBody {
    /// Response for a freshly stored report, which is always pending.
    #[must_use]
    pub fn pending(incident_id: i64) -> Self {
        Self {
            incident_id,
            status: IncidentStatus::Pending,
            permalink: format!("/api/incidents/{incident_id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChangedBody {
    #[serde(flatten)]
    pub change: StatusChange,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscribedBody {
    pub message: &'static str,
    pub subscription_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobCreatedBody {
    pub request_id: i64,
    pub calculated_price: u64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatusChangedBody {
    pub id: i64,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteCustomer {
    pub name: String,
    pub email: Option<String>,
}

/// A stored job request priced with the current configuration.
#[derive(Debug, Clone, Serialize)]
pub struct JobQuoteBody {
    pub job_id: i64,
    pub unit_price: u64,
    pub calculated_price: u64,
    /// `calculated_price × 100`.
    pub amount_kobo: u64,
    pub currency: String,
    pub customer: QuoteCustomer,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteBody {
    pub unit_price: u64,
    pub calculated_price: u64,
    pub amount_kobo: u64,
    pub currency: String,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

fn parse_positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v >= 1)
}

fn parse_report_datetime(value: &str) -> Result<NaiveDateTime, ValidationError> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ValidationError::InvalidDatetime(value.to_string()))
}

fn count(field: &'static str, value: Option<i64>) -> Result<i32, ValidationError> {
    let value = value.unwrap_or(0);
    if value < 0 {
        return Err(ValidationError::NegativeCount(field));
    }
    Ok(i32::try_from(value).unwrap_or(i32::MAX))
}

fn at_least_one(field: &'static str, value: Option<i64>) -> Result<i32, ValidationError> {
    let value = value.unwrap_or(1);
    if value < 1 {
        return Err(ValidationError::CountBelowOne(field));
    }
    Ok(i32::try_from(value).unwrap_or(i32::MAX))
}

fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        Ok(digits)
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
