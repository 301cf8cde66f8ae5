use time::OffsetDateTime;

use prospect_domain::{CacheStats, event_key};
use prospect_providers::EmailOpenEvent;
use prospect_storage::{models::EmailOpenRecord, queries};

use crate::{NotifierService, Result};

const UNKNOWN_LEAD: &str = "Unknown Lead";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
	Recorded,
	RecordedNotifyFailed,
	DuplicateCache,
	DuplicateStored,
}

impl IngestOutcome {
	pub fn is_recorded(self) -> bool {
		matches!(self, Self::Recorded | Self::RecordedNotifyFailed)
	}
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsResponse {
	pub events_recorded: i64,
	pub cache: CacheStats,
}

impl NotifierService {
	/// The single ingest path for both delivery channels: consult the dedup
	/// cache, insert-or-skip, then notify. The insert's conflict target is the
	/// correctness backstop; the cache only saves redundant outbound sends.
	pub async fn ingest_open(&self, event: &EmailOpenEvent) -> Result<IngestOutcome> {
		let now = OffsetDateTime::now_utc();
		let key = event_key(&event.email_id, event.opened_at);

		{
			let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());

			if cache.seen(&key, now) {
				tracing::debug!(email_id = %event.email_id, "Open already in dedup cache.");

				return Ok(IngestOutcome::DuplicateCache);
			}
		}

		let lead_name = self.resolve_lead_name(event).await;
		let record = EmailOpenRecord {
			email_id: event.email_id.clone(),
			lead_id: event.lead_id.clone(),
			lead_name: lead_name.clone(),
			subject: event.subject.clone(),
			recipient: event.recipient.clone(),
			opens_count: event.opens_count,
			opened_at: event.opened_at,
			notified_at: now,
		};
		let inserted = match queries::insert_open(&self.db, &record).await {
			Ok(inserted) => inserted,
			Err(err) => {
				// Forget the key so a redelivery after a storage hiccup is not
				// mistaken for a duplicate.
				let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());

				cache.forget(&key);

				return Err(err.into());
			},
		};

		if !inserted {
			tracing::debug!(email_id = %event.email_id, "Open already recorded. Skipping notification.");

			return Ok(IngestOutcome::DuplicateStored);
		}
		if self.cfg.providers.discord.webhook_url.is_none() {
			tracing::warn!("Discord webhook is not configured. Notification skipped.");

			return Ok(IngestOutcome::Recorded);
		}

		match self.providers.notify.send_open(&self.cfg.providers.discord, event, &lead_name).await
		{
			Ok(()) => {
				tracing::info!(
					email_id = %event.email_id,
					lead = %lead_name,
					"Open recorded and notification sent."
				);

				Ok(IngestOutcome::Recorded)
			},
			Err(err) => {
				tracing::error!(error = %err, email_id = %event.email_id, "Notification failed. Record kept.");

				Ok(IngestOutcome::RecordedNotifyFailed)
			},
		}
	}

	pub async fn stats(&self) -> Result<StatsResponse> {
		Ok(StatsResponse {
			events_recorded: queries::total_opens(&self.db).await?,
			cache: self.cache_stats(),
		})
	}

	/// Sends a synthetic notification so operators can confirm the webhook
	/// wiring without waiting for a real open.
	pub async fn send_test_notification(&self) -> Result<()> {
		let event = EmailOpenEvent {
			email_id: "test_notification".to_string(),
			lead_id: "test_lead".to_string(),
			lead_name: Some("Test Lead".to_string()),
			subject: "Test notification".to_string(),
			recipient: "you@example.com".to_string(),
			opens_count: 1,
			opened_at: OffsetDateTime::now_utc(),
		};

		self.providers
			.notify
			.send_open(&self.cfg.providers.discord, &event, "Test Lead")
			.await?;

		Ok(())
	}

	async fn resolve_lead_name(&self, event: &EmailOpenEvent) -> String {
		if let Some(name) = event.lead_name.as_deref().filter(|name| !name.trim().is_empty()) {
			return name.to_string();
		}
		if event.lead_id.is_empty() {
			return UNKNOWN_LEAD.to_string();
		}

		match self.providers.crm.lead_name(&self.cfg.providers.closeio, &event.lead_id).await {
			Ok(Some(name)) => name,
			Ok(None) => UNKNOWN_LEAD.to_string(),
			Err(err) => {
				tracing::warn!(error = %err, lead_id = %event.lead_id, "Lead lookup failed.");

				UNKNOWN_LEAD.to_string()
			},
		}
	}
}
