use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use prospect_providers::{WebhookEnvelope, open_from_webhook};
use prospect_service::IngestOutcome;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(root))
		.route("/health", get(health))
		.route("/webhook/closeio", post(closeio_webhook))
		.route("/stats", get(stats))
		.route("/test/notification", post(test_notification))
		.route("/analytics/summary", get(analytics_summary))
		.route("/analytics/recent", get(analytics_recent))
		.route("/analytics/by-date", get(analytics_by_date))
		.route("/analytics/by-lead/{lead_id}", get(analytics_by_lead))
		.route("/analytics/top-leads", get(analytics_top_leads))
		.route("/analytics/by-time", get(analytics_by_time))
		.route("/analytics/by-day", get(analytics_by_day))
		.route("/analytics/engagement", get(analytics_engagement))
		.route("/analytics/export", get(analytics_export))
		.with_state(state)
}

async fn root() -> Json<Value> {
	Json(serde_json::json!({
		"service": "prospect-notifier",
		"status": "running",
		"version": prospect_cli::VERSION,
	}))
}

async fn health() -> Json<Value> {
	let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();

	Json(serde_json::json!({ "status": "healthy", "timestamp": timestamp }))
}

#[derive(Debug, Serialize)]
struct WebhookAck {
	status: &'static str,
	outcome: &'static str,
}

/// The CRM redelivers on non-2xx responses, so everything short of a handler
/// panic is acknowledged; failures are logged instead of bounced to avoid a
/// retry storm.
async fn closeio_webhook(
	State(state): State<AppState>,
	Json(payload): Json<Value>,
) -> Json<WebhookAck> {
	let envelope = match serde_json::from_value::<WebhookEnvelope>(payload) {
		Ok(envelope) => envelope,
		Err(err) => {
			tracing::debug!(error = %err, "Webhook payload is not an event envelope.");

			return Json(WebhookAck { status: "ok", outcome: "ignored" });
		},
	};
	let Some(event) = open_from_webhook(&envelope) else {
		return Json(WebhookAck { status: "ok", outcome: "ignored" });
	};

	match state.service.ingest_open(&event).await {
		Ok(outcome) => Json(WebhookAck { status: "ok", outcome: outcome_label(outcome) }),
		Err(err) => {
			tracing::error!(error = %err, email_id = %event.email_id, "Webhook ingest failed.");

			Json(WebhookAck { status: "error", outcome: "error" })
		},
	}
}

fn outcome_label(outcome: IngestOutcome) -> &'static str {
	match outcome {
		IngestOutcome::Recorded => "recorded",
		IngestOutcome::RecordedNotifyFailed => "recorded_notify_failed",
		IngestOutcome::DuplicateCache => "duplicate_cache",
		IngestOutcome::DuplicateStored => "duplicate_stored",
	}
}

async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
	json_response(state.service.stats().await?)
}

async fn test_notification(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
	state.service.send_test_notification().await?;

	Ok(Json(serde_json::json!({ "status": "sent" })))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
	limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DateRangeQuery {
	start_date: String,
	end_date: String,
}

#[derive(Debug, Deserialize)]
struct DaysQuery {
	days: Option<i64>,
}

async fn analytics_summary(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_summary().await?)
}

async fn analytics_recent(
	State(state): State<AppState>,
	Query(query): Query<LimitQuery>,
) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_recent(query.limit).await?)
}

async fn analytics_by_date(
	State(state): State<AppState>,
	Query(query): Query<DateRangeQuery>,
) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_by_date(&query.start_date, &query.end_date).await?)
}

async fn analytics_by_lead(
	State(state): State<AppState>,
	Path(lead_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_by_lead(&lead_id).await?)
}

async fn analytics_top_leads(
	State(state): State<AppState>,
	Query(query): Query<LimitQuery>,
) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_top_leads(query.limit).await?)
}

async fn analytics_by_time(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_by_time().await?)
}

async fn analytics_by_day(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_by_day().await?)
}

async fn analytics_engagement(
	State(state): State<AppState>,
	Query(query): Query<DaysQuery>,
) -> Result<Json<Value>, ApiError> {
	json_response(state.service.analytics_engagement(query.days).await?)
}

async fn analytics_export(State(state): State<AppState>) -> Result<Response, ApiError> {
	let csv = state.service.analytics_export_csv().await?;
	let headers = [
		(header::CONTENT_TYPE, "text/csv; charset=utf-8"),
		(header::CONTENT_DISPOSITION, "attachment; filename=\"email_opens.csv\""),
	];

	Ok((headers, csv).into_response())
}

fn json_response<T>(value: T) -> Result<Json<Value>, ApiError>
where
	T: Serialize,
{
	serde_json::to_value(value)
		.map(Json)
		.map_err(|err| ApiError::internal(format!("Failed to encode response: {err}.")))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	fn internal(message: impl Into<String>) -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
	}
}

impl From<prospect_service::Error> for ApiError {
	fn from(err: prospect_service::Error) -> Self {
		use prospect_service::Error;

		match err {
			Error::InvalidRequest { message } => {
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
			},
			Error::NotFound { .. } => {
				Self::new(StatusCode::NOT_FOUND, "not_found", err.to_string())
			},
			Error::Provider(inner) => {
				Self::new(StatusCode::BAD_GATEWAY, "provider_error", inner.to_string())
			},
			other => Self::internal(other.to_string()),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
