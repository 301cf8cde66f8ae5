use std::time::Duration;

use serde_json::Value;
use tokio::time as tokio_time;

use crate::{Error, Result};

/// Triggers a Bright Data dataset collection for one LinkedIn company page and
/// returns the first collected record.
pub async fn scrape_company(
	cfg: &prospect_config::BrightDataConfig,
	url: &str,
) -> Result<Value> {
	let records =
		trigger_and_wait(cfg, &cfg.dataset_company, serde_json::json!([{ "url": url }])).await?;

	first_record(records, url)
}

/// Fetches recent posts for a company page, newest first, capped at `limit`.
pub async fn company_posts(
	cfg: &prospect_config::BrightDataConfig,
	url: &str,
	limit: usize,
) -> Result<Vec<Value>> {
	let records =
		trigger_and_wait(cfg, &cfg.dataset_posts, serde_json::json!([{ "url": url }])).await?;
	let Value::Array(mut posts) = records else {
		return Err(Error::InvalidResponse {
			message: format!("Posts snapshot for {url} is not an array."),
		});
	};

	posts.truncate(limit);

	Ok(posts)
}

/// Fetches one person profile.
pub async fn scrape_profile(
	cfg: &prospect_config::BrightDataConfig,
	url: &str,
) -> Result<Value> {
	let records =
		trigger_and_wait(cfg, &cfg.dataset_profile, serde_json::json!([{ "url": url }])).await?;

	first_record(records, url)
}

/// Dataset collections are asynchronous: trigger returns a snapshot id, and
/// the snapshot endpoint answers 202 until the collection is ready.
async fn trigger_and_wait(
	cfg: &prospect_config::BrightDataConfig,
	dataset_id: &str,
	inputs: Value,
) -> Result<Value> {
	crate::require_key(&cfg.api_key, "linkedin", "providers.brightdata.api_key")?;

	let client = crate::http_client(cfg.timeout_ms)?;
	let trigger_url = format!("{}/trigger", cfg.api_base);
	let res = client
		.post(&trigger_url)
		.bearer_auth(&cfg.api_key)
		.query(&[("dataset_id", dataset_id), ("format", "json")])
		.json(&inputs)
		.send()
		.await?
		.error_for_status()
		.map_err(|err| Error::Api {
			operation: "linkedin_trigger",
			url: trigger_url.clone(),
			source: err,
		})?;
	let json: Value = res.json().await?;
	let snapshot_id = json
		.get("snapshot_id")
		.and_then(|value| value.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Trigger response is missing snapshot_id.".to_string(),
		})?
		.to_string();
	let snapshot_url = format!("{}/snapshot/{snapshot_id}", cfg.api_base);

	for _ in 0..cfg.snapshot_poll_max {
		let res = client
			.get(&snapshot_url)
			.bearer_auth(&cfg.api_key)
			.query(&[("format", "json")])
			.send()
			.await?;

		if res.status() == reqwest::StatusCode::ACCEPTED {
			tokio_time::sleep(Duration::from_millis(cfg.snapshot_poll_ms)).await;

			continue;
		}

		let res = res.error_for_status().map_err(|err| Error::Api {
			operation: "linkedin_snapshot",
			url: snapshot_url.clone(),
			source: err,
		})?;

		return Ok(res.json().await?);
	}

	Err(Error::InvalidResponse {
		message: format!("Snapshot {snapshot_id} was not ready in time."),
	})
}

fn first_record(records: Value, url: &str) -> Result<Value> {
	match records {
		Value::Array(mut items) if !items.is_empty() => Ok(items.remove(0)),
		Value::Array(_) => Err(Error::InvalidResponse {
			message: format!("Snapshot for {url} contained no records."),
		}),
		other => Ok(other),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_record_unwraps_single_element() {
		let records = serde_json::json!([{ "name": "Acme Corp" }]);
		let record = first_record(records, "https://linkedin.test/acme").expect("Parse failed.");

		assert_eq!(record["name"], "Acme Corp");
	}

	#[test]
	fn empty_snapshot_is_an_error() {
		assert!(first_record(serde_json::json!([]), "https://linkedin.test/acme").is_err());
	}
}
