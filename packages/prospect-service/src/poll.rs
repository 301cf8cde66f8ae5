use time::{Duration, OffsetDateTime};

use prospect_storage::queries;

use crate::{NotifierService, Result};

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct PollOutcome {
	pub fetched: usize,
	pub recorded: usize,
	pub duplicates: usize,
	pub failures: usize,
}

impl NotifierService {
	/// One reconciliation cycle against the CRM event log. A fetch error
	/// aborts the cycle and leaves the watermark untouched; per-event ingest
	/// errors are counted but do not stop the remaining events. The watermark
	/// only advances when every fetched event was handled, so a partially
	/// failed window is re-fetched and dedup absorbs the overlap.
	pub async fn poll_once(&self, now: OffsetDateTime) -> Result<PollOutcome> {
		let since = match queries::get_watermark(&self.db).await? {
			Some(watermark) => watermark,
			// First poll: look back one interval instead of replaying history.
			None => now - Duration::seconds(self.cfg.notifier.polling_interval_seconds as i64),
		};
		let events =
			self.providers.crm.list_open_events(&self.cfg.providers.closeio, since).await?;
		let mut outcome = PollOutcome { fetched: events.len(), ..Default::default() };

		for event in &events {
			match self.ingest_open(event).await {
				Ok(result) if result.is_recorded() => outcome.recorded += 1,
				Ok(_) => outcome.duplicates += 1,
				Err(err) => {
					outcome.failures += 1;

					tracing::error!(
						error = %err,
						email_id = %event.email_id,
						"Failed to ingest polled event."
					);
				},
			}
		}

		if outcome.failures == 0 {
			queries::set_watermark(&self.db, now).await?;
		} else {
			tracing::warn!(
				failures = outcome.failures,
				"Keeping poll watermark. The window will be re-fetched."
			);
		}

		Ok(outcome)
	}
}
