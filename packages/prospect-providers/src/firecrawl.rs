use std::time::Duration;

use serde_json::Value;
use tokio::time as tokio_time;

use crate::{Error, Result};

const CRAWL_POLL_INTERVAL_MS: u64 = 2_000;
const CRAWL_POLL_MAX: u32 = 90;

#[derive(Debug, Clone, serde::Serialize)]
pub struct WebsiteContent {
	pub url: String,
	pub title: Option<String>,
	pub markdown: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CrawledPage {
	pub url: String,
	pub title: Option<String>,
	pub markdown: String,
}

/// Fetches one page as markdown. Transport errors are retried up to
/// `max_retries` times; HTTP status errors fail immediately since the API
/// will keep returning them.
pub async fn scrape_url(
	cfg: &prospect_config::FirecrawlConfig,
	url: &str,
) -> Result<WebsiteContent> {
	require_firecrawl_key(cfg, "scrape")?;

	let client = crate::http_client(cfg.timeout_ms)?;
	let endpoint = format!("{}/scrape", cfg.api_base);
	let body = serde_json::json!({ "url": url, "formats": ["markdown"] });
	let mut last_err = None;

	for _ in 0..=cfg.max_retries {
		match client.post(&endpoint).bearer_auth(&cfg.api_key).json(&body).send().await {
			Ok(res) => {
				let res = res.error_for_status().map_err(|err| Error::Api {
					operation: "scrape",
					url: url.to_string(),
					source: err,
				})?;
				let json: Value = res.json().await?;

				return parse_scrape_response(url, json);
			},
			Err(err) => {
				last_err = Some(err);
			},
		}
	}

	Err(match last_err {
		Some(err) => Error::Api { operation: "scrape", url: url.to_string(), source: err },
		None => Error::InvalidResponse { message: format!("Scrape of {url} never ran.") },
	})
}

/// Starts a crawl job and polls it until completion, returning up to
/// `max_pages` scraped pages.
pub async fn crawl_site(
	cfg: &prospect_config::FirecrawlConfig,
	url: &str,
	max_pages: u32,
) -> Result<Vec<CrawledPage>> {
	require_firecrawl_key(cfg, "crawl")?;

	let client = crate::http_client(cfg.timeout_ms)?;
	let endpoint = format!("{}/crawl", cfg.api_base);
	let body = serde_json::json!({
		"url": url,
		"limit": max_pages.max(1),
		"scrapeOptions": { "formats": ["markdown"] },
	});
	let res = client
		.post(&endpoint)
		.bearer_auth(&cfg.api_key)
		.json(&body)
		.send()
		.await?
		.error_for_status()
		.map_err(|err| Error::Api { operation: "crawl", url: url.to_string(), source: err })?;
	let json: Value = res.json().await?;
	let job_id = json
		.get("id")
		.and_then(|value| value.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Crawl response is missing a job id.".to_string(),
		})?
		.to_string();
	let status_endpoint = format!("{}/crawl/{job_id}", cfg.api_base);

	for _ in 0..CRAWL_POLL_MAX {
		let res = client
			.get(&status_endpoint)
			.bearer_auth(&cfg.api_key)
			.send()
			.await?
			.error_for_status()
			.map_err(|err| Error::Api { operation: "crawl", url: url.to_string(), source: err })?;
		let json: Value = res.json().await?;
		let status = json.get("status").and_then(|value| value.as_str()).unwrap_or("");

		match status {
			"completed" => return parse_crawl_pages(json),
			"failed" | "cancelled" => {
				return Err(Error::InvalidResponse {
					message: format!("Crawl of {url} ended with status {status:?}."),
				});
			},
			_ => {},
		}

		tokio_time::sleep(Duration::from_millis(CRAWL_POLL_INTERVAL_MS)).await;
	}

	Err(Error::InvalidResponse { message: format!("Crawl of {url} did not complete in time.") })
}

fn require_firecrawl_key(
	cfg: &prospect_config::FirecrawlConfig,
	operation: &'static str,
) -> Result<()> {
	crate::require_key(&cfg.api_key, operation, "providers.firecrawl.api_key")
}

fn parse_scrape_response(url: &str, json: Value) -> Result<WebsiteContent> {
	let data = json.get("data").unwrap_or(&json);
	let markdown = data
		.get("markdown")
		.and_then(|value| value.as_str())
		.ok_or_else(|| Error::InvalidResponse {
			message: format!("Scrape of {url} returned no markdown."),
		})?
		.to_string();
	let title = data
		.get("metadata")
		.and_then(|metadata| metadata.get("title"))
		.and_then(|value| value.as_str())
		.map(|value| value.to_string());

	Ok(WebsiteContent { url: url.to_string(), title, markdown })
}

fn parse_crawl_pages(json: Value) -> Result<Vec<CrawledPage>> {
	let items = json
		.get("data")
		.and_then(|value| value.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Crawl response is missing a data array.".to_string(),
		})?;
	let mut pages = Vec::with_capacity(items.len());

	for item in items {
		let Some(markdown) = item.get("markdown").and_then(|value| value.as_str()) else {
			continue;
		};
		let metadata = item.get("metadata");
		let url = metadata
			.and_then(|metadata| metadata.get("sourceURL"))
			.and_then(|value| value.as_str())
			.unwrap_or("")
			.to_string();
		let title = metadata
			.and_then(|metadata| metadata.get("title"))
			.and_then(|value| value.as_str())
			.map(|value| value.to_string());

		pages.push(CrawledPage { url, title, markdown: markdown.to_string() });
	}

	Ok(pages)
}
