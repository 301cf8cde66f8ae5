use std::time::Duration;

use time::OffsetDateTime;
use tokio::time as tokio_time;

use crate::state::AppState;

/// Background reconciliation against the CRM event log. Cycle failures are
/// logged and retried on the next interval; the watermark logic inside
/// `poll_once` guarantees no event is silently skipped.
pub async fn run(state: AppState) {
	let interval =
		Duration::from_secs(state.service.cfg.notifier.polling_interval_seconds);

	tracing::info!(interval_secs = interval.as_secs(), "CRM polling loop started.");

	loop {
		let now = OffsetDateTime::now_utc();

		match state.service.poll_once(now).await {
			Ok(outcome) => {
				tracing::info!(
					fetched = outcome.fetched,
					recorded = outcome.recorded,
					duplicates = outcome.duplicates,
					failures = outcome.failures,
					"Poll cycle complete."
				);
			},
			Err(err) => {
				tracing::error!(error = %err, "Poll cycle failed. Retrying next interval.");
			},
		}

		tokio_time::sleep(interval).await;
	}
}
