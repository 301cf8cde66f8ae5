use serde_json::Value;
use time::format_description::well_known::Rfc3339;

use crate::{Error, Result, closeio::EmailOpenEvent};

const EMBED_COLOR: u32 = 0x57F287;

/// Posts an open notification to the configured Discord webhook.
pub async fn send_open_notification(
	cfg: &prospect_config::DiscordConfig,
	event: &EmailOpenEvent,
	lead_name: &str,
) -> Result<()> {
	let Some(webhook_url) = cfg.webhook_url.as_deref() else {
		return Err(Error::MissingCredential {
			operation: "send_open_notification",
			missing: "providers.discord.webhook_url",
		});
	};
	let client = crate::http_client(cfg.timeout_ms)?;

	client
		.post(webhook_url)
		.json(&open_message(event, lead_name))
		.send()
		.await?
		.error_for_status()
		.map_err(|err| Error::Api {
			operation: "send_open_notification",
			url: webhook_url.to_string(),
			source: err,
		})?;

	Ok(())
}

pub fn open_message(event: &EmailOpenEvent, lead_name: &str) -> Value {
	let opened_at = event.opened_at.format(&Rfc3339).unwrap_or_default();

	serde_json::json!({
		"embeds": [{
			"title": "📬 Email opened",
			"description": format!("**{lead_name}** opened \"{}\"", event.subject),
			"color": EMBED_COLOR,
			"fields": [
				{ "name": "Recipient", "value": event.recipient, "inline": true },
				{ "name": "Opens", "value": event.opens_count.to_string(), "inline": true },
				{ "name": "Lead", "value": event.lead_id, "inline": true },
			],
			"timestamp": opened_at,
		}]
	})
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;

	use super::*;

	#[test]
	fn message_names_lead_and_subject() {
		let event = EmailOpenEvent {
			email_id: "acti_123".to_string(),
			lead_id: "lead_42".to_string(),
			lead_name: None,
			subject: "Quick question".to_string(),
			recipient: "dana@acme.test".to_string(),
			opens_count: 3,
			opened_at: OffsetDateTime::from_unix_timestamp(1_735_732_800)
				.expect("Valid timestamp."),
		};
		let message = open_message(&event, "Acme Corp");
		let embed = &message["embeds"][0];

		assert_eq!(embed["description"], "**Acme Corp** opened \"Quick question\"");
		assert_eq!(embed["fields"][1]["value"], "3");
		assert_eq!(embed["timestamp"], "2025-01-01T12:00:00Z");
	}
}
