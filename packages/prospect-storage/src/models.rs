use time::OffsetDateTime;

/// One persisted open notification. Append-only; the primary key on
/// `(email_id, opened_at)` is the dedup backstop.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmailOpenRecord {
	pub email_id: String,
	pub lead_id: String,
	pub lead_name: String,
	pub subject: String,
	pub recipient: String,
	pub opens_count: i64,
	#[serde(with = "prospect_domain::time_serde")]
	pub opened_at: OffsetDateTime,
	#[serde(with = "prospect_domain::time_serde")]
	pub notified_at: OffsetDateTime,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OpenSummary {
	pub total_opens: i64,
	pub unique_emails: i64,
	pub unique_leads: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DateBucket {
	pub date: String,
	pub opens_count: i64,
	pub unique_leads: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LeadBucket {
	pub lead_id: String,
	pub lead_name: String,
	pub total_opens: i64,
	pub last_open_at: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HourBucket {
	pub hour: i64,
	pub opens_count: i64,
	pub unique_leads: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DayBucket {
	pub day_of_week: i64,
	pub day_name: String,
	pub opens_count: i64,
	pub unique_leads: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EngagementMetrics {
	pub period_days: i64,
	pub total_opens: i64,
	pub unique_emails: i64,
	pub unique_leads: i64,
	pub avg_opens_per_email: f64,
	pub max_opens_per_email: i64,
}
