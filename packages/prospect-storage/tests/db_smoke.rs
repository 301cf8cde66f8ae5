use time::Duration;

use prospect_storage::queries;
use prospect_testkit::{base_time, memory_db, sample_record};

#[tokio::test]
async fn duplicate_insert_is_skipped() {
	let db = memory_db().await.expect("Failed to create test database.");
	let record = sample_record(1);

	assert!(queries::insert_open(&db, &record).await.expect("First insert failed."));
	assert!(!queries::insert_open(&db, &record).await.expect("Second insert failed."));
	assert_eq!(queries::total_opens(&db).await.expect("Count failed."), 1);
}

#[tokio::test]
async fn same_email_different_open_time_is_a_new_row() {
	let db = memory_db().await.expect("Failed to create test database.");
	let first = sample_record(1);
	let mut second = sample_record(1);

	second.opened_at += Duration::hours(2);

	assert!(queries::insert_open(&db, &first).await.expect("First insert failed."));
	assert!(queries::insert_open(&db, &second).await.expect("Second insert failed."));
	assert_eq!(queries::total_opens(&db).await.expect("Count failed."), 2);
}

#[tokio::test]
async fn summary_counts_distinct_emails_and_leads() {
	let db = memory_db().await.expect("Failed to create test database.");

	for n in 1..=3 {
		queries::insert_open(&db, &sample_record(n)).await.expect("Insert failed.");
	}

	let mut repeat = sample_record(1);

	repeat.opened_at += Duration::hours(1);
	queries::insert_open(&db, &repeat).await.expect("Insert failed.");

	let summary = queries::summary(&db).await.expect("Summary failed.");

	assert_eq!(summary.total_opens, 4);
	assert_eq!(summary.unique_emails, 3);
	assert_eq!(summary.unique_leads, 3);
}

#[tokio::test]
async fn recent_returns_newest_first() {
	let db = memory_db().await.expect("Failed to create test database.");

	for n in 1..=3 {
		queries::insert_open(&db, &sample_record(n)).await.expect("Insert failed.");
	}

	let recent = queries::recent(&db, 2).await.expect("Recent failed.");

	assert_eq!(recent.len(), 2);
	assert_eq!(recent[0].email_id, "acti_3");
	assert_eq!(recent[1].email_id, "acti_2");
}

#[tokio::test]
async fn by_date_buckets_by_day() {
	let db = memory_db().await.expect("Failed to create test database.");
	let mut next_day = sample_record(9);

	next_day.opened_at += Duration::days(1);
	queries::insert_open(&db, &sample_record(1)).await.expect("Insert failed.");
	queries::insert_open(&db, &sample_record(2)).await.expect("Insert failed.");
	queries::insert_open(&db, &next_day).await.expect("Insert failed.");

	let buckets =
		queries::by_date(&db, "2025-01-01", "2025-01-02").await.expect("By-date failed.");

	assert_eq!(buckets.len(), 2);
	assert_eq!(buckets[0].date, "2025-01-01");
	assert_eq!(buckets[0].opens_count, 2);
	assert_eq!(buckets[1].date, "2025-01-02");
	assert_eq!(buckets[1].opens_count, 1);
}

#[tokio::test]
async fn top_leads_orders_by_open_count() {
	let db = memory_db().await.expect("Failed to create test database.");

	queries::insert_open(&db, &sample_record(1)).await.expect("Insert failed.");

	for hours in 1..=2 {
		let mut repeat = sample_record(2);

		repeat.opened_at += Duration::hours(hours);
		queries::insert_open(&db, &repeat).await.expect("Insert failed.");
	}

	let leads = queries::top_leads(&db, 10).await.expect("Top-leads failed.");

	assert_eq!(leads[0].lead_id, "lead_2");
	assert_eq!(leads[0].total_opens, 2);
	assert_eq!(leads[1].lead_id, "lead_1");
}

#[tokio::test]
async fn hour_and_weekday_buckets_parse() {
	let db = memory_db().await.expect("Failed to create test database.");

	queries::insert_open(&db, &sample_record(1)).await.expect("Insert failed.");

	let hours = queries::by_hour(&db).await.expect("By-hour failed.");
	let days = queries::by_weekday(&db).await.expect("By-weekday failed.");

	// Base time is noon UTC on Wednesday 2025-01-01.
	assert_eq!(hours.len(), 1);
	assert_eq!(hours[0].hour, 12);
	assert_eq!(days.len(), 1);
	assert_eq!(days[0].day_of_week, 3);
	assert_eq!(days[0].day_name, "Wednesday");
}

#[tokio::test]
async fn engagement_window_excludes_old_opens() {
	let db = memory_db().await.expect("Failed to create test database.");
	let mut old = sample_record(8);

	old.opened_at -= Duration::days(60);
	queries::insert_open(&db, &old).await.expect("Insert failed.");
	queries::insert_open(&db, &sample_record(1)).await.expect("Insert failed.");

	let now = base_time() + Duration::hours(1);
	let metrics = queries::engagement(&db, 30, now).await.expect("Engagement failed.");

	assert_eq!(metrics.period_days, 30);
	assert_eq!(metrics.total_opens, 1);
	assert_eq!(metrics.unique_emails, 1);
	assert_eq!(metrics.max_opens_per_email, 1);
	assert!((metrics.avg_opens_per_email - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn watermark_round_trips() {
	let db = memory_db().await.expect("Failed to create test database.");

	assert!(queries::get_watermark(&db).await.expect("Get failed.").is_none());

	let first = base_time();
	let second = base_time() + Duration::minutes(5);

	queries::set_watermark(&db, first).await.expect("Set failed.");
	assert_eq!(queries::get_watermark(&db).await.expect("Get failed."), Some(first));

	queries::set_watermark(&db, second).await.expect("Set failed.");
	assert_eq!(queries::get_watermark(&db).await.expect("Get failed."), Some(second));
}
