use sqlx::{Row, sqlite::SqliteRow};
use time::{Duration, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::{
	Error, Result,
	db::Db,
	models::{
		DateBucket, DayBucket, EmailOpenRecord, EngagementMetrics, HourBucket, LeadBucket,
		OpenSummary,
	},
};

const RECORD_COLUMNS: &str = "\
email_id, lead_id, lead_name, subject, recipient, opens_count, opened_at, notified_at";

const DAY_NAMES: [&str; 7] =
	["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

/// Timestamps are stored as UTC RFC 3339 text so lexicographic comparison in
/// SQL matches chronological order and `date()`/`strftime()` parse them.
fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
	let utc = ts.to_offset(UtcOffset::UTC);

	utc.format(&Rfc3339).map_err(|_| Error::InvalidTimestamp { value: format!("{utc:?}") })
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
	OffsetDateTime::parse(raw, &Rfc3339)
		.map_err(|_| Error::InvalidTimestamp { value: raw.to_string() })
}

fn row_to_record(row: &SqliteRow) -> Result<EmailOpenRecord> {
	let opened_at: String = row.try_get("opened_at")?;
	let notified_at: String = row.try_get("notified_at")?;

	Ok(EmailOpenRecord {
		email_id: row.try_get("email_id")?,
		lead_id: row.try_get("lead_id")?,
		lead_name: row.try_get("lead_name")?,
		subject: row.try_get("subject")?,
		recipient: row.try_get("recipient")?,
		opens_count: row.try_get("opens_count")?,
		opened_at: parse_timestamp(&opened_at)?,
		notified_at: parse_timestamp(&notified_at)?,
	})
}

/// Returns whether the record was newly inserted. A conflict on the primary
/// key means the event is already recorded and is not an error.
pub async fn insert_open(db: &Db, record: &EmailOpenRecord) -> Result<bool> {
	let opened_at = format_timestamp(record.opened_at)?;
	let notified_at = format_timestamp(record.notified_at)?;
	let result = sqlx::query(
		"\
INSERT INTO email_opens (email_id, lead_id, lead_name, subject, recipient, opens_count, opened_at, notified_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT (email_id, opened_at) DO NOTHING",
	)
	.bind(&record.email_id)
	.bind(&record.lead_id)
	.bind(&record.lead_name)
	.bind(&record.subject)
	.bind(&record.recipient)
	.bind(record.opens_count)
	.bind(&opened_at)
	.bind(&notified_at)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn total_opens(db: &Db) -> Result<i64> {
	let row = sqlx::query("SELECT COUNT(*) AS total FROM email_opens").fetch_one(&db.pool).await?;

	Ok(row.try_get("total")?)
}

pub async fn summary(db: &Db) -> Result<OpenSummary> {
	let row = sqlx::query(
		"\
SELECT
	COUNT(*) AS total_opens,
	COUNT(DISTINCT email_id) AS unique_emails,
	COUNT(DISTINCT lead_id) AS unique_leads
FROM email_opens",
	)
	.fetch_one(&db.pool)
	.await?;

	Ok(OpenSummary {
		total_opens: row.try_get("total_opens")?,
		unique_emails: row.try_get("unique_emails")?,
		unique_leads: row.try_get("unique_leads")?,
	})
}

pub async fn recent(db: &Db, limit: i64) -> Result<Vec<EmailOpenRecord>> {
	let rows = sqlx::query(&format!(
		"SELECT {RECORD_COLUMNS} FROM email_opens ORDER BY opened_at DESC LIMIT ?1"
	))
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	rows.iter().map(row_to_record).collect()
}

pub async fn all_opens(db: &Db) -> Result<Vec<EmailOpenRecord>> {
	let rows =
		sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM email_opens ORDER BY opened_at ASC"))
			.fetch_all(&db.pool)
			.await?;

	rows.iter().map(row_to_record).collect()
}

pub async fn by_lead(db: &Db, lead_id: &str) -> Result<Vec<EmailOpenRecord>> {
	let rows = sqlx::query(&format!(
		"SELECT {RECORD_COLUMNS} FROM email_opens WHERE lead_id = ?1 ORDER BY opened_at DESC"
	))
	.bind(lead_id)
	.fetch_all(&db.pool)
	.await?;

	rows.iter().map(row_to_record).collect()
}

pub async fn by_date(db: &Db, start_date: &str, end_date: &str) -> Result<Vec<DateBucket>> {
	let rows = sqlx::query(
		"\
SELECT
	date(opened_at) AS day,
	COUNT(*) AS opens_count,
	COUNT(DISTINCT lead_id) AS unique_leads
FROM email_opens
WHERE date(opened_at) >= ?1 AND date(opened_at) <= ?2
GROUP BY day
ORDER BY day",
	)
	.bind(start_date)
	.bind(end_date)
	.fetch_all(&db.pool)
	.await?;

	rows.iter()
		.map(|row| {
			Ok(DateBucket {
				date: row.try_get("day")?,
				opens_count: row.try_get("opens_count")?,
				unique_leads: row.try_get("unique_leads")?,
			})
		})
		.collect()
}

pub async fn top_leads(db: &Db, limit: i64) -> Result<Vec<LeadBucket>> {
	let rows = sqlx::query(
		"\
SELECT
	lead_id,
	MAX(lead_name) AS lead_name,
	COUNT(*) AS total_opens,
	MAX(opened_at) AS last_open_at
FROM email_opens
GROUP BY lead_id
ORDER BY total_opens DESC, last_open_at DESC
LIMIT ?1",
	)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	rows.iter()
		.map(|row| {
			Ok(LeadBucket {
				lead_id: row.try_get("lead_id")?,
				lead_name: row.try_get("lead_name")?,
				total_opens: row.try_get("total_opens")?,
				last_open_at: row.try_get("last_open_at")?,
			})
		})
		.collect()
}

pub async fn by_hour(db: &Db) -> Result<Vec<HourBucket>> {
	let rows = sqlx::query(
		"\
SELECT
	CAST(strftime('%H', opened_at) AS INTEGER) AS hour,
	COUNT(*) AS opens_count,
	COUNT(DISTINCT lead_id) AS unique_leads
FROM email_opens
GROUP BY hour
ORDER BY hour",
	)
	.fetch_all(&db.pool)
	.await?;

	rows.iter()
		.map(|row| {
			Ok(HourBucket {
				hour: row.try_get("hour")?,
				opens_count: row.try_get("opens_count")?,
				unique_leads: row.try_get("unique_leads")?,
			})
		})
		.collect()
}

pub async fn by_weekday(db: &Db) -> Result<Vec<DayBucket>> {
	let rows = sqlx::query(
		"\
SELECT
	CAST(strftime('%w', opened_at) AS INTEGER) AS day_of_week,
	COUNT(*) AS opens_count,
	COUNT(DISTINCT lead_id) AS unique_leads
FROM email_opens
GROUP BY day_of_week
ORDER BY day_of_week",
	)
	.fetch_all(&db.pool)
	.await?;

	rows.iter()
		.map(|row| {
			let day_of_week: i64 = row.try_get("day_of_week")?;
			let day_name = DAY_NAMES
				.get(day_of_week.clamp(0, 6) as usize)
				.copied()
				.unwrap_or("Unknown")
				.to_string();

			Ok(DayBucket {
				day_of_week,
				day_name,
				opens_count: row.try_get("opens_count")?,
				unique_leads: row.try_get("unique_leads")?,
			})
		})
		.collect()
}

pub async fn engagement(db: &Db, days: i64, now: OffsetDateTime) -> Result<EngagementMetrics> {
	let since = format_timestamp(now - Duration::days(days))?;
	let totals = sqlx::query(
		"\
SELECT
	COUNT(*) AS total_opens,
	COUNT(DISTINCT email_id) AS unique_emails,
	COUNT(DISTINCT lead_id) AS unique_leads
FROM email_opens
WHERE opened_at >= ?1",
	)
	.bind(&since)
	.fetch_one(&db.pool)
	.await?;
	let total_opens: i64 = totals.try_get("total_opens")?;
	let unique_emails: i64 = totals.try_get("unique_emails")?;
	let unique_leads: i64 = totals.try_get("unique_leads")?;
	let max_row = sqlx::query(
		"\
SELECT COUNT(*) AS opens
FROM email_opens
WHERE opened_at >= ?1
GROUP BY email_id
ORDER BY opens DESC
LIMIT 1",
	)
	.bind(&since)
	.fetch_optional(&db.pool)
	.await?;
	let max_opens_per_email =
		max_row.map(|row| row.try_get::<i64, _>("opens")).transpose()?.unwrap_or(0);
	let avg_opens_per_email = if unique_emails > 0 {
		total_opens as f64 / unique_emails as f64
	} else {
		0.0
	};

	Ok(EngagementMetrics {
		period_days: days,
		total_opens,
		unique_emails,
		unique_leads,
		avg_opens_per_email,
		max_opens_per_email,
	})
}

pub async fn get_watermark(db: &Db) -> Result<Option<OffsetDateTime>> {
	let row = sqlx::query("SELECT last_polled_at FROM poll_state WHERE id = 1")
		.fetch_optional(&db.pool)
		.await?;

	row.map(|row| {
		let raw: String = row.try_get("last_polled_at")?;

		parse_timestamp(&raw)
	})
	.transpose()
}

pub async fn set_watermark(db: &Db, at: OffsetDateTime) -> Result<()> {
	let raw = format_timestamp(at)?;

	sqlx::query(
		"\
INSERT INTO poll_state (id, last_polled_at)
VALUES (1, ?1)
ON CONFLICT (id) DO UPDATE SET last_polled_at = excluded.last_polled_at",
	)
	.bind(&raw)
	.execute(&db.pool)
	.await?;

	Ok(())
}
