use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use axum::{
	body::{self, Body},
	http::{Request, StatusCode, header},
};
use tower::util::ServiceExt;

use prospect_config::{CloseConfig, Config, DiscordConfig};
use prospect_notifier::{routes, state::AppState};
use prospect_providers::EmailOpenEvent;
use prospect_service::{BoxFuture, CrmProvider, NotifierProviders, NotifierService, NotifyProvider};
use prospect_storage::queries;
use prospect_testkit::{memory_db, sample_record};

#[derive(Default)]
struct CountingNotify {
	sent: AtomicUsize,
}
impl NotifyProvider for CountingNotify {
	fn send_open<'a>(
		&'a self,
		_cfg: &'a DiscordConfig,
		_event: &'a EmailOpenEvent,
		_lead_name: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<()>> {
		self.sent.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(()) })
	}
}

struct IdleCrm;
impl CrmProvider for IdleCrm {
	fn list_open_events<'a>(
		&'a self,
		_cfg: &'a CloseConfig,
		_since: time::OffsetDateTime,
	) -> BoxFuture<'a, prospect_providers::Result<Vec<EmailOpenEvent>>> {
		Box::pin(async { Ok(Vec::new()) })
	}

	fn lead_name<'a>(
		&'a self,
		_cfg: &'a CloseConfig,
		_lead_id: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<Option<String>>> {
		Box::pin(async { Ok(None) })
	}
}

async fn test_state(notify: Arc<dyn NotifyProvider>) -> AppState {
	let db = memory_db().await.expect("Failed to create test database.");
	let mut cfg = Config::default();

	cfg.providers.discord.webhook_url = Some("https://discord.test/webhooks/1/x".to_string());

	let service = NotifierService::with_providers(
		cfg,
		db,
		NotifierProviders { notify, crm: Arc::new(IdleCrm) },
	);

	AppState::with_service(service)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Failed to build request.")
}

fn post_json(uri: &str, payload: &serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response body.")
}

fn open_payload(email_id: &str) -> serde_json::Value {
	serde_json::json!({
		"event": {
			"object_type": "activity.email",
			"action": "updated",
			"data": {
				"id": email_id,
				"lead_id": "lead_42",
				"lead_name": "Acme Corp",
				"subject": "Quick question",
				"to": ["dana@acme.test"],
				"opens": [{ "opened_at": "2025-01-01T12:00:00+00:00" }]
			}
		}
	})
}

#[tokio::test]
async fn health_reports_status_and_timestamp() {
	let state = test_state(Arc::new(CountingNotify::default())).await;
	let app = routes::router(state);
	let response = app.oneshot(get("/health")).await.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "healthy");
	assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn root_names_the_service() {
	let state = test_state(Arc::new(CountingNotify::default())).await;
	let app = routes::router(state);
	let response = app.oneshot(get("/")).await.expect("Failed to call /.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["service"], "prospect-notifier");
	assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn webhook_deduplicates_redelivery() {
	let notify = Arc::new(CountingNotify::default());
	let state = test_state(notify.clone()).await;
	let app = routes::router(state.clone());
	let payload = open_payload("acti_1");
	let response = app
		.clone()
		.oneshot(post_json("/webhook/closeio", &payload))
		.await
		.expect("First webhook call failed.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["outcome"], "recorded");

	let response = app
		.clone()
		.oneshot(post_json("/webhook/closeio", &payload))
		.await
		.expect("Second webhook call failed.");

	assert_eq!(json_body(response).await["outcome"], "duplicate_cache");
	assert_eq!(notify.sent.load(Ordering::SeqCst), 1);

	let response =
		app.oneshot(get("/stats")).await.expect("Failed to call /stats.");
	let json = json_body(response).await;

	assert_eq!(json["events_recorded"], 1);
	assert_eq!(json["cache"]["tracked"], 1);
}

#[tokio::test]
async fn webhook_acknowledges_unrelated_events() {
	let state = test_state(Arc::new(CountingNotify::default())).await;
	let app = routes::router(state);
	let payload = serde_json::json!({
		"event": { "object_type": "activity.call", "action": "created", "data": {} }
	});
	let response = app
		.oneshot(post_json("/webhook/closeio", &payload))
		.await
		.expect("Webhook call failed.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await["outcome"], "ignored");
}

#[tokio::test]
async fn test_notification_endpoint_sends() {
	let notify = Arc::new(CountingNotify::default());
	let state = test_state(notify.clone()).await;
	let app = routes::router(state);
	let response = app
		.oneshot(post_json("/test/notification", &serde_json::json!({})))
		.await
		.expect("Failed to call /test/notification.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(notify.sent.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn analytics_endpoints_answer_with_seeded_data() {
	let state = test_state(Arc::new(CountingNotify::default())).await;

	for n in 1..=3 {
		queries::insert_open(&state.service.db, &sample_record(n))
			.await
			.expect("Seed insert failed.");
	}

	let app = routes::router(state);
	let summary = json_body(
		app.clone().oneshot(get("/analytics/summary")).await.expect("Summary failed."),
	)
	.await;

	assert_eq!(summary["total_opens"], 3);

	let recent = json_body(
		app.clone()
			.oneshot(get("/analytics/recent?limit=2"))
			.await
			.expect("Recent failed."),
	)
	.await;

	assert_eq!(recent.as_array().map(|items| items.len()), Some(2));

	let by_date = json_body(
		app.clone()
			.oneshot(get("/analytics/by-date?start_date=2025-01-01&end_date=2025-01-31"))
			.await
			.expect("By-date failed."),
	)
	.await;

	assert_eq!(by_date[0]["opens_count"], 3);

	let by_lead = json_body(
		app.clone()
			.oneshot(get("/analytics/by-lead/lead_1"))
			.await
			.expect("By-lead failed."),
	)
	.await;

	assert_eq!(by_lead.as_array().map(|items| items.len()), Some(1));

	for uri in
		["/analytics/top-leads?limit=5", "/analytics/by-time", "/analytics/by-day", "/analytics/engagement?days=7"]
	{
		let response = app.clone().oneshot(get(uri)).await.expect("Analytics call failed.");

		assert_eq!(response.status(), StatusCode::OK, "{uri} must answer 200.");
	}
}

#[tokio::test]
async fn by_date_rejects_malformed_dates() {
	let state = test_state(Arc::new(CountingNotify::default())).await;
	let app = routes::router(state);
	let response = app
		.oneshot(get("/analytics/by-date?start_date=January&end_date=2025-01-31"))
		.await
		.expect("By-date call failed.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn export_returns_csv() {
	let state = test_state(Arc::new(CountingNotify::default())).await;

	queries::insert_open(&state.service.db, &sample_record(1))
		.await
		.expect("Seed insert failed.");

	let app = routes::router(state);
	let response =
		app.oneshot(get("/analytics/export")).await.expect("Export call failed.");

	assert_eq!(response.status(), StatusCode::OK);
	assert!(
		response
			.headers()
			.get(header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(|value| value.starts_with("text/csv"))
			.unwrap_or(false)
	);

	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read export body.");
	let text = String::from_utf8(bytes.to_vec()).expect("Export is not UTF-8.");

	assert!(text.starts_with("email_id,"));
	assert!(text.contains("acti_1"));
}
