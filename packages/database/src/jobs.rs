//! Storage for hire-an-agent job requests.

use moosicbox_json_utils::database::ToValue as _;
use safer_database_models::{JobRequestRow, NewJobRequest};
use safer_incident_models::{AgentType, JobStatus, JobType};
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, row_flag, row_timestamp};

const JOB_COLUMNS: &str = "id, full_name, phone, email, agent_type, job_type, state, lga, \
     address, job_details, number_of_agents, number_of_days, inter_city, foreign_national, \
     status, created_at";

/// Inserts a validated job request with status `pending` and returns its
/// id.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails or no id is returned.
pub async fn insert_job_request(db: &dyn Database, job: &NewJobRequest) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO job_requests (
                full_name, phone, email, agent_type, job_type, state, lga, address,
                job_details, number_of_agents, number_of_days, inter_city, foreign_national,
                status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING id",
            &[
                DatabaseValue::String(job.full_name.clone()),
                DatabaseValue::String(job.phone.clone()),
                opt_string(job.email.as_deref()),
                DatabaseValue::String(job.agent_type.to_string()),
                DatabaseValue::String(job.job_type.to_string()),
                DatabaseValue::String(job.state.clone()),
                DatabaseValue::String(job.lga.clone()),
                DatabaseValue::String(job.address.clone()),
                opt_string(job.job_details.as_deref()),
                DatabaseValue::Int32(job.number_of_agents),
                DatabaseValue::Int32(job.number_of_days),
                DatabaseValue::Bool(job.inter_city),
                DatabaseValue::Bool(job.foreign_national),
                DatabaseValue::String(JobStatus::Pending.to_string()),
                DatabaseValue::DateTime(chrono::Utc::now().naive_utc()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get job request id from insert".to_string(),
    })?;

    row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse job request id: {e}"),
    })
}

/// Lists every job request, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be decoded.
pub async fn list_job_requests(db: &dyn Database) -> Result<Vec<JobRequestRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {JOB_COLUMNS} FROM job_requests ORDER BY created_at DESC, id DESC"),
            &[],
        )
        .await?;

    rows.iter().map(job_from_row).collect()
}

/// Fetches a single job request by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be decoded.
pub async fn get_job_request(db: &dyn Database, id: i64) -> Result<Option<JobRequestRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {JOB_COLUMNS} FROM job_requests WHERE id = $1"),
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    rows.first().map(job_from_row).transpose()
}

/// Sets the status of a job request. Returns `false` when no row has the
/// given id.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub async fn update_job_status(
    db: &dyn Database,
    id: i64,
    status: JobStatus,
) -> Result<bool, DbError> {
    let updated = db
        .exec_raw_params(
            "UPDATE job_requests SET status = $1 WHERE id = $2",
            &[
                DatabaseValue::String(status.to_string()),
                DatabaseValue::Int64(id),
            ],
        )
        .await?;

    if updated > 0 {
        log::info!("Job request {id} moved to {status}");
    }

    Ok(updated > 0)
}

fn opt_string(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |v| DatabaseValue::String(v.to_string()))
}

fn parse_column<T: std::str::FromStr>(row: &switchy_database::Row, column: &str) -> Result<T, DbError> {
    let raw: String = row.to_value(column).unwrap_or_default();
    raw.parse().map_err(|_| DbError::Conversion {
        message: format!("Unexpected {column} value '{raw}'"),
    })
}

fn job_from_row(row: &switchy_database::Row) -> Result<JobRequestRow, DbError> {
    Ok(JobRequestRow {
        id: row.to_value("id").unwrap_or(0),
        full_name: row.to_value("full_name").unwrap_or_default(),
        phone: row.to_value("phone").unwrap_or_default(),
        email: row.to_value("email").unwrap_or(None),
        agent_type: parse_column::<AgentType>(row, "agent_type")?,
        job_type: parse_column::<JobType>(row, "job_type")?,
        state: row.to_value("state").unwrap_or_default(),
        lga: row.to_value("lga").unwrap_or_default(),
        address: row.to_value("address").unwrap_or_default(),
        job_details: row.to_value("job_details").unwrap_or(None),
        number_of_agents: row.to_value("number_of_agents").unwrap_or(1),
        number_of_days: row.to_value("number_of_days").unwrap_or(1),
        inter_city: row_flag(row, "inter_city"),
        foreign_national: row_flag(row, "foreign_national"),
        status: parse_column::<JobStatus>(row, "status")?,
        created_at: row_timestamp(row, "created_at"),
    })
}
