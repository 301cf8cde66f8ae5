use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{Error, Result};

const EMAIL_ACTIVITY_TYPE: &str = "activity.email";
const EVENT_PAGE_LIMIT: u32 = 100;
const EVENT_PAGE_MAX: u32 = 10;

/// One observed open of one sent email, normalized from either delivery
/// channel (webhook push or event-log poll).
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmailOpenEvent {
	pub email_id: String,
	pub lead_id: String,
	pub lead_name: Option<String>,
	pub subject: String,
	pub recipient: String,
	pub opens_count: i64,
	#[serde(with = "prospect_domain::time_serde")]
	pub opened_at: OffsetDateTime,
}

#[derive(Debug, serde::Deserialize)]
pub struct WebhookEnvelope {
	pub event: WebhookEvent,
}

#[derive(Debug, serde::Deserialize)]
pub struct WebhookEvent {
	#[serde(default)]
	pub object_type: String,
	#[serde(default)]
	pub action: String,
	#[serde(default)]
	pub data: Value,
}

pub fn open_from_webhook(envelope: &WebhookEnvelope) -> Option<EmailOpenEvent> {
	open_from_event(&envelope.event.object_type, &envelope.event.data)
}

/// Extracts an open event from an email-activity payload. Returns `None` for
/// anything that is not an email activity with at least one recorded open;
/// callers acknowledge and ignore those.
pub fn open_from_event(object_type: &str, data: &Value) -> Option<EmailOpenEvent> {
	if object_type != EMAIL_ACTIVITY_TYPE {
		return None;
	}

	let email_id = data.get("id")?.as_str()?.to_string();
	let lead_id = data.get("lead_id").and_then(|value| value.as_str()).unwrap_or("").to_string();
	let opens = data.get("opens").and_then(|value| value.as_array())?;
	let opened_at = opens
		.iter()
		.filter_map(|open| open.get("opened_at").and_then(|value| value.as_str()))
		.filter_map(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
		.max()?;
	let subject =
		data.get("subject").and_then(|value| value.as_str()).unwrap_or("(no subject)").to_string();
	let recipient = data
		.get("to")
		.and_then(|value| value.as_array())
		.and_then(|to| to.first())
		.and_then(|value| value.as_str())
		.unwrap_or("")
		.to_string();
	let lead_name = data
		.get("lead_name")
		.and_then(|value| value.as_str())
		.filter(|value| !value.trim().is_empty())
		.map(|value| value.to_string());

	Some(EmailOpenEvent {
		email_id,
		lead_id,
		lead_name,
		subject,
		recipient,
		opens_count: opens.len() as i64,
		opened_at,
	})
}

/// Queries the CRM event log for email activities updated after `since`,
/// following cursor pages up to a fixed cap.
pub async fn list_open_events(
	cfg: &prospect_config::CloseConfig,
	since: OffsetDateTime,
) -> Result<Vec<EmailOpenEvent>> {
	crate::require_key(&cfg.api_key, "list_open_events", "providers.closeio.api_key")?;

	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}/event/", cfg.api_base);
	let since_raw = since.format(&Rfc3339).map_err(|_| Error::InvalidResponse {
		message: "Failed to format poll watermark.".to_string(),
	})?;
	let page_limit = EVENT_PAGE_LIMIT.to_string();
	let mut events = Vec::new();
	let mut cursor: Option<String> = None;

	for _ in 0..EVENT_PAGE_MAX {
		let mut request = client.get(&url).basic_auth(&cfg.api_key, Some("")).query(&[
			("object_type", EMAIL_ACTIVITY_TYPE),
			("date_updated__gt", since_raw.as_str()),
			("_limit", page_limit.as_str()),
		]);

		if let Some(cursor) = cursor.as_deref() {
			request = request.query(&[("_cursor", cursor)]);
		}

		let res = request.send().await?.error_for_status().map_err(|err| Error::Api {
			operation: "list_open_events",
			url: url.clone(),
			source: err,
		})?;
		let json: Value = res.json().await?;

		events.extend(parse_event_page(&json));

		cursor = json
			.get("cursor_next")
			.and_then(|value| value.as_str())
			.filter(|value| !value.is_empty())
			.map(|value| value.to_string());

		if cursor.is_none() {
			break;
		}
	}

	Ok(events)
}

/// Looks up a lead's display name; a missing lead is `None`, not an error.
pub async fn fetch_lead_name(
	cfg: &prospect_config::CloseConfig,
	lead_id: &str,
) -> Result<Option<String>> {
	crate::require_key(&cfg.api_key, "fetch_lead_name", "providers.closeio.api_key")?;

	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}/lead/{lead_id}/", cfg.api_base);
	let res = client
		.get(&url)
		.basic_auth(&cfg.api_key, Some(""))
		.query(&[("_fields", "display_name")])
		.send()
		.await?;

	if res.status() == reqwest::StatusCode::NOT_FOUND {
		return Ok(None);
	}

	let res = res.error_for_status().map_err(|err| Error::Api {
		operation: "fetch_lead_name",
		url: url.clone(),
		source: err,
	})?;
	let json: Value = res.json().await?;

	Ok(json
		.get("display_name")
		.and_then(|value| value.as_str())
		.filter(|value| !value.trim().is_empty())
		.map(|value| value.to_string()))
}

fn parse_event_page(json: &Value) -> Vec<EmailOpenEvent> {
	json.get("data")
		.and_then(|value| value.as_array())
		.map(|items| {
			items
				.iter()
				.filter_map(|item| {
					let object_type =
						item.get("object_type").and_then(|value| value.as_str()).unwrap_or("");
					let data = item.get("data")?;

					open_from_event(object_type, data)
				})
				.collect()
		})
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn email_data() -> Value {
		serde_json::json!({
			"id": "acti_123",
			"lead_id": "lead_42",
			"lead_name": "Acme Corp",
			"subject": "Quick question",
			"to": ["dana@acme.test"],
			"opens": [
				{ "opened_at": "2025-01-01T12:00:00+00:00" },
				{ "opened_at": "2025-01-01T12:30:00+00:00" }
			]
		})
	}

	#[test]
	fn latest_open_wins() {
		let event = open_from_event(EMAIL_ACTIVITY_TYPE, &email_data()).expect("Expected event.");

		assert_eq!(event.email_id, "acti_123");
		assert_eq!(event.opens_count, 2);
		assert_eq!(event.opened_at.unix_timestamp(), 1_735_734_600);
		assert_eq!(event.lead_name.as_deref(), Some("Acme Corp"));
	}

	#[test]
	fn ignores_non_email_objects() {
		assert!(open_from_event("activity.call", &email_data()).is_none());
	}

	#[test]
	fn ignores_emails_without_opens() {
		let data = serde_json::json!({ "id": "acti_9", "lead_id": "lead_1", "opens": [] });

		assert!(open_from_event(EMAIL_ACTIVITY_TYPE, &data).is_none());
	}

	#[test]
	fn webhook_envelope_round_trips() {
		let payload = serde_json::json!({
			"event": {
				"object_type": "activity.email",
				"action": "updated",
				"data": email_data()
			}
		});
		let envelope: WebhookEnvelope =
			serde_json::from_value(payload).expect("Envelope parse failed.");
		let event = open_from_webhook(&envelope).expect("Expected event.");

		assert_eq!(event.recipient, "dana@acme.test");
	}

	#[test]
	fn event_page_parses_mixed_objects() {
		let page = serde_json::json!({
			"data": [
				{ "object_type": "activity.email", "action": "updated", "data": email_data() },
				{ "object_type": "activity.note", "action": "created", "data": {} }
			],
			"cursor_next": null
		});
		let events = parse_event_page(&page);

		assert_eq!(events.len(), 1);
	}
}
