use std::collections::HashMap;

use time::{Duration, OffsetDateTime};

/// Short-lived memory of already-processed event keys. This only suppresses
/// duplicate outbound notifications during transient re-delivery; the store's
/// unique key on `(email_id, opened_at)` is the correctness backstop, so
/// losing this state costs at most one duplicate notification.
#[derive(Debug)]
pub struct DedupCache {
	retention: Duration,
	entries: HashMap<String, OffsetDateTime>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
	pub tracked: usize,
	#[serde(with = "crate::time_serde::option")]
	pub oldest_inserted_at: Option<OffsetDateTime>,
}

impl DedupCache {
	pub fn new(retention_hours: i64) -> Self {
		Self { retention: Duration::hours(retention_hours.max(1)), entries: HashMap::new() }
	}

	/// Returns whether `key` was recorded within the retention window and, if
	/// not, records it at `now`. Check-and-insert is one logical step; callers
	/// serialize access with a mutex.
	pub fn seen(&mut self, key: &str, now: OffsetDateTime) -> bool {
		self.purge_expired(now);

		if self.entries.contains_key(key) {
			return true;
		}

		self.entries.insert(key.to_string(), now);

		false
	}

	/// Drops a key recorded by [`Self::seen`], e.g. when the persist step that
	/// followed it failed and the event should be accepted again.
	pub fn forget(&mut self, key: &str) {
		self.entries.remove(key);
	}

	pub fn purge_expired(&mut self, now: OffsetDateTime) {
		let retention = self.retention;

		self.entries.retain(|_, inserted_at| now - *inserted_at < retention);
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			tracked: self.entries.len(),
			oldest_inserted_at: self.entries.values().min().copied(),
		}
	}
}

/// Stable identity of one open event, matching the store's unique key.
pub fn event_key(email_id: &str, opened_at: OffsetDateTime) -> String {
	format!("{email_id}:{}", opened_at.unix_timestamp())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn same_key_different_open_time_is_distinct() {
		let base = OffsetDateTime::from_unix_timestamp(1_735_732_800).expect("Valid timestamp.");

		assert_ne!(event_key("email_1", base), event_key("email_1", base + Duration::minutes(5)));
	}
}
