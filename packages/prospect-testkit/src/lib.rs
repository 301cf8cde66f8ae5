mod error;

pub use error::{Error, Result};

use sqlx::sqlite::SqlitePoolOptions;
use time::{Duration, OffsetDateTime};

use prospect_providers::EmailOpenEvent;
use prospect_storage::{db::Db, models::EmailOpenRecord};

/// Noon UTC on 2025-01-01; a fixed base keeps test data deterministic.
pub const BASE_TIMESTAMP: i64 = 1_735_732_800;

/// Fresh in-memory SQLite database with the schema applied. A single
/// connection keeps every query on the same in-memory instance.
pub async fn memory_db() -> Result<Db> {
	let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await?;
	let db = Db { pool };

	db.ensure_schema().await?;

	Ok(db)
}

pub fn base_time() -> OffsetDateTime {
	OffsetDateTime::from_unix_timestamp(BASE_TIMESTAMP)
		.unwrap_or_else(|_| OffsetDateTime::UNIX_EPOCH)
}

/// Deterministic open event; `n` varies the identifiers and the open time.
pub fn sample_open(n: i64) -> EmailOpenEvent {
	EmailOpenEvent {
		email_id: format!("acti_{n}"),
		lead_id: format!("lead_{n}"),
		lead_name: Some(format!("Lead {n}")),
		subject: format!("Subject {n}"),
		recipient: format!("contact{n}@example.test"),
		opens_count: 1,
		opened_at: base_time() + Duration::minutes(n),
	}
}

/// Deterministic persisted record matching [`sample_open`].
pub fn sample_record(n: i64) -> EmailOpenRecord {
	EmailOpenRecord {
		email_id: format!("acti_{n}"),
		lead_id: format!("lead_{n}"),
		lead_name: format!("Lead {n}"),
		subject: format!("Subject {n}"),
		recipient: format!("contact{n}@example.test"),
		opens_count: 1,
		opened_at: base_time() + Duration::minutes(n),
		notified_at: base_time() + Duration::minutes(n + 1),
	}
}
