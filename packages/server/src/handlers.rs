//! HTTP handler functions for the safer API.

use actix_web::{HttpResponse, web};
use safer_database::{DbError, digest, jobs, queries, subscriptions};
use safer_pricing::{PriceRequest, calculate_price};
use safer_server_models::{
    ApiError, ApiHealth, ApiSuccess, DataBody, DigestBody, IncidentDetail, IncidentListBody,
    IncidentQueryParams, JobCreatedBody, JobQuoteBody, JobRequestBody, JobStatusBody,
    JobStatusChangedBody, QuoteBody, QuoteCustomer, QuoteParams, ReportBody, ReportCreatedBody,
    StatusChangedBody, StatusSummaryBody, StatusUpdateBody, SubscribeBody, SubscribedBody,
    TimelineBody, TotalsBody, TypesBody, ValidationError, VictimsBody, parse_id,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/incidents`
///
/// Paginated, sortable incident list.
pub async fn list_incidents(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filter = match params.to_list_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };
    let query = params.to_list_query();

    match queries::list_incidents(state.db.as_ref(), &filter, &query).await {
        Ok(page) => HttpResponse::Ok().json(ApiSuccess::new(IncidentListBody {
            data: page.items,
            pagination: page.pagination,
        })),
        Err(e) => database_error("Failed to list incidents", &e),
    }
}

/// `GET /api/incidents/{id}`
pub async fn get_incident(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = match parse_id(&path, ValidationError::InvalidIncidentId) {
        Ok(id) => id,
        Err(e) => return bad_request(&e),
    };

    match queries::get_incident(state.db.as_ref(), id).await {
        Ok(Some(incident)) => {
            let now = chrono::Utc::now().naive_utc();
            HttpResponse::Ok().json(ApiSuccess::new(DataBody {
                data: IncidentDetail::new(incident, now),
            }))
        }
        Ok(None) => not_found("Incident not found"),
        Err(e) => database_error(&format!("Failed to fetch incident {id}"), &e),
    }
}

/// `POST /api/incidents`
///
/// Accepts a public report. Reports start out pending and stay out of
/// public views until reviewed.
pub async fn submit_report(
    state: web::Data<AppState>,
    body: web::Json<ReportBody>,
) -> HttpResponse {
    let incident = match body.into_inner().validate() {
        Ok(incident) => incident,
        Err(e) => return bad_request(&e),
    };

    match queries::insert_incident(state.db.as_ref(), &incident).await {
        Ok(incident_id) => {
            log::info!(
                "Received {} report {incident_id} in {}/{}",
                incident.incident_type,
                incident.state,
                incident.lga
            );
            HttpResponse::Ok().json(ApiSuccess::new(ReportCreatedBody::pending(incident_id)))
        }
        Err(e) => database_error("Failed to insert incident report", &e),
    }
}

/// `POST /api/incidents/status`
pub async fn update_incident_status(
    state: web::Data<AppState>,
    body: web::Json<StatusUpdateBody>,
) -> HttpResponse {
    let (id, status) = match body.validate() {
        Ok(parsed) => parsed,
        Err(e) => return bad_request(&e),
    };

    match queries::update_incident_status(state.db.as_ref(), id, status).await {
        Ok(Some(change)) => HttpResponse::Ok().json(ApiSuccess::new(StatusChangedBody { change })),
        Ok(None) => not_found("Incident not found"),
        Err(e) => database_error(&format!("Failed to update status of incident {id}"), &e),
    }
}

/// `GET /api/incidents/digest`
///
/// Plain-text summary of the past week.
pub async fn incident_digest(state: web::Data<AppState>) -> HttpResponse {
    let now = chrono::Utc::now().naive_utc();
    match digest::recent_incidents(state.db.as_ref(), now).await {
        Ok(rows) => HttpResponse::Ok().json(ApiSuccess::new(DigestBody {
            summary: digest::compose_digest(&rows),
        })),
        Err(e) => database_error("Failed to build incident digest", &e),
    }
}

/// `GET /api/incidents/stats/status-summary`
pub async fn status_summary(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };

    match queries::status_summary(state.db.as_ref(), &filter).await {
        Ok(data) => HttpResponse::Ok().json(ApiSuccess::new(StatusSummaryBody { data })),
        Err(e) => database_error("Failed to compute status summary", &e),
    }
}

/// `GET /api/incidents/stats/summary`
pub async fn totals_summary(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };

    match queries::totals_summary(state.db.as_ref(), &filter).await {
        Ok(totals) => HttpResponse::Ok().json(ApiSuccess::new(TotalsBody { totals })),
        Err(e) => database_error("Failed to compute totals summary", &e),
    }
}

/// `GET /api/incidents/stats/types`
pub async fn type_breakdown(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };

    match queries::type_breakdown(state.db.as_ref(), &filter).await {
        Ok(types) => HttpResponse::Ok().json(ApiSuccess::new(TypesBody { types })),
        Err(e) => database_error("Failed to compute type breakdown", &e),
    }
}

/// `GET /api/incidents/stats/timeline`
pub async fn timeline(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };

    match queries::timeline(state.db.as_ref(), &filter).await {
        Ok(timeline) => HttpResponse::Ok().json(ApiSuccess::new(TimelineBody { timeline })),
        Err(e) => database_error("Failed to compute timeline", &e),
    }
}

/// `GET /api/incidents/stats/victims`
pub async fn victim_totals(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(&e),
    };

    match queries::victim_totals(state.db.as_ref(), &filter).await {
        Ok(totals) => HttpResponse::Ok().json(ApiSuccess::new(VictimsBody { totals })),
        Err(e) => database_error("Failed to compute victim totals", &e),
    }
}

/// `GET /api/pricing/quote`
///
/// Prices an arbitrary request without storing anything.
pub async fn price_quote(
    state: web::Data<AppState>,
    params: web::Query<QuoteParams>,
) -> HttpResponse {
    let quote = calculate_price(&state.pricing, &PriceRequest::from(&*params));
    HttpResponse::Ok().json(ApiSuccess::new(QuoteBody {
        unit_price: quote.unit_price,
        calculated_price: quote.total,
        amount_kobo: quote.amount_minor(),
        currency: quote.currency,
    }))
}

/// `POST /api/jobs`
pub async fn create_job(
    state: web::Data<AppState>,
    body: web::Json<JobRequestBody>,
) -> HttpResponse {
    let job = match body.into_inner().validate() {
        Ok(job) => job,
        Err(e) => return bad_request(&e),
    };

    let quote = calculate_price(&state.pricing, &PriceRequest::from(&job));

    match jobs::insert_job_request(state.db.as_ref(), &job).await {
        Ok(request_id) => {
            log::info!(
                "Job request {request_id}: {} {} agent(s) for {} day(s)",
                job.number_of_agents,
                job.agent_type,
                job.number_of_days
            );
            HttpResponse::Ok().json(ApiSuccess::new(JobCreatedBody {
                request_id,
                calculated_price: quote.total,
                currency: quote.currency,
            }))
        }
        Err(e) => database_error("Failed to insert job request", &e),
    }
}

/// `GET /api/jobs`
pub async fn list_jobs(state: web::Data<AppState>) -> HttpResponse {
    match jobs::list_job_requests(state.db.as_ref()).await {
        Ok(data) => HttpResponse::Ok().json(ApiSuccess::new(DataBody { data })),
        Err(e) => database_error("Failed to list job requests", &e),
    }
}

/// `GET /api/jobs/{id}`
pub async fn get_job(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = match parse_id(&path, ValidationError::InvalidId) {
        Ok(id) => id,
        Err(e) => return bad_request(&e),
    };

    match jobs::get_job_request(state.db.as_ref(), id).await {
        Ok(Some(data)) => HttpResponse::Ok().json(ApiSuccess::new(DataBody { data })),
        Ok(None) => not_found("Job request not found"),
        Err(e) => database_error(&format!("Failed to fetch job request {id}"), &e),
    }
}

/// `GET /api/jobs/{id}/quote`
///
/// Prices a stored job with the current configuration.
pub async fn job_quote(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = match parse_id(&path, ValidationError::InvalidId) {
        Ok(id) => id,
        Err(e) => return bad_request(&e),
    };

    match jobs::get_job_request(state.db.as_ref(), id).await {
        Ok(Some(job)) => {
            let quote = calculate_price(&state.pricing, &PriceRequest::from(&job));
            HttpResponse::Ok().json(ApiSuccess::new(JobQuoteBody {
                job_id: job.id,
                unit_price: quote.unit_price,
                calculated_price: quote.total,
                amount_kobo: quote.amount_minor(),
                currency: quote.currency,
                customer: QuoteCustomer {
                    name: job.full_name,
                    email: job.email,
                },
            }))
        }
        Ok(None) => not_found("Job request not found"),
        Err(e) => database_error(&format!("Failed to fetch job request {id}"), &e),
    }
}

/// `POST /api/jobs/status`
pub async fn update_job_status(
    state: web::Data<AppState>,
    body: web::Json<JobStatusBody>,
) -> HttpResponse {
    let (id, status) = match body.validate() {
        Ok(parsed) => parsed,
        Err(e) => return bad_request(&e),
    };

    match jobs::update_job_status(state.db.as_ref(), id, status).await {
        Ok(true) => HttpResponse::Ok().json(ApiSuccess::new(JobStatusChangedBody { id, status })),
        Ok(false) => not_found("Job request not found"),
        Err(e) => database_error(&format!("Failed to update status of job request {id}"), &e),
    }
}

/// `POST /api/subscribe`
///
/// Signs up for community alerts. A WhatsApp number can only subscribe
/// once.
pub async fn subscribe(state: web::Data<AppState>, body: web::Json<SubscribeBody>) -> HttpResponse {
    let subscription = match body.into_inner().validate() {
        Ok(subscription) => subscription,
        Err(e) => return bad_request(&e),
    };

    match subscriptions::subscribe(state.db.as_ref(), &subscription).await {
        Ok(Some(subscription_id)) => {
            log::info!("New community subscription {subscription_id}");
            HttpResponse::Ok().json(ApiSuccess::new(SubscribedBody {
                message: "Subscribed",
                subscription_id,
            }))
        }
        Ok(None) => HttpResponse::Conflict().json(ApiError::new("Phone number already subscribed")),
        Err(e) => database_error("Failed to store subscription", &e),
    }
}

fn bad_request(error: &ValidationError) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(error.to_string()))
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(ApiError::new(message))
}

/// Logs the underlying failure and returns an opaque 500.
fn database_error(context: &str, error: &DbError) -> HttpResponse {
    log::error!("{context}: {error}");
    HttpResponse::InternalServerError().json(ApiError::new("Database error"))
}
