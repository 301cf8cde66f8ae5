use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use prospect_storage::{
	models::{
		DateBucket, DayBucket, EmailOpenRecord, EngagementMetrics, HourBucket, LeadBucket,
		OpenSummary,
	},
	queries,
};

use crate::{Error, NotifierService, Result};

const RECENT_DEFAULT: i64 = 50;
const RECENT_MAX: i64 = 500;
const TOP_LEADS_DEFAULT: i64 = 10;
const TOP_LEADS_MAX: i64 = 100;
const ENGAGEMENT_DEFAULT_DAYS: i64 = 30;
const ENGAGEMENT_MAX_DAYS: i64 = 365;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

impl NotifierService {
	pub async fn analytics_summary(&self) -> Result<OpenSummary> {
		Ok(queries::summary(&self.db).await?)
	}

	pub async fn analytics_recent(&self, limit: Option<i64>) -> Result<Vec<EmailOpenRecord>> {
		let limit = limit.unwrap_or(RECENT_DEFAULT).clamp(1, RECENT_MAX);

		Ok(queries::recent(&self.db, limit).await?)
	}

	pub async fn analytics_by_date(
		&self,
		start_date: &str,
		end_date: &str,
	) -> Result<Vec<DateBucket>> {
		for (label, value) in [("start_date", start_date), ("end_date", end_date)] {
			if time::Date::parse(value, DATE_FORMAT).is_err() {
				return Err(Error::InvalidRequest {
					message: format!("{label} must be a YYYY-MM-DD date."),
				});
			}
		}
		if start_date > end_date {
			return Err(Error::InvalidRequest {
				message: "start_date must not be after end_date.".to_string(),
			});
		}

		Ok(queries::by_date(&self.db, start_date, end_date).await?)
	}

	pub async fn analytics_by_lead(&self, lead_id: &str) -> Result<Vec<EmailOpenRecord>> {
		if lead_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "lead_id must be non-empty.".to_string() });
		}

		Ok(queries::by_lead(&self.db, lead_id).await?)
	}

	pub async fn analytics_top_leads(&self, limit: Option<i64>) -> Result<Vec<LeadBucket>> {
		let limit = limit.unwrap_or(TOP_LEADS_DEFAULT).clamp(1, TOP_LEADS_MAX);

		Ok(queries::top_leads(&self.db, limit).await?)
	}

	pub async fn analytics_by_time(&self) -> Result<Vec<HourBucket>> {
		Ok(queries::by_hour(&self.db).await?)
	}

	pub async fn analytics_by_day(&self) -> Result<Vec<DayBucket>> {
		Ok(queries::by_weekday(&self.db).await?)
	}

	pub async fn analytics_engagement(&self, days: Option<i64>) -> Result<EngagementMetrics> {
		let days = days.unwrap_or(ENGAGEMENT_DEFAULT_DAYS).clamp(1, ENGAGEMENT_MAX_DAYS);

		Ok(queries::engagement(&self.db, days, OffsetDateTime::now_utc()).await?)
	}

	/// Full dump of the notification log as CSV, oldest first.
	pub async fn analytics_export_csv(&self) -> Result<String> {
		let records = queries::all_opens(&self.db).await?;
		let mut writer = csv::Writer::from_writer(Vec::new());

		for record in &records {
			writer.serialize(record)?;
		}

		let bytes = writer.into_inner().map_err(|_| Error::Export)?;

		String::from_utf8(bytes).map_err(|_| Error::Export)
	}
}
