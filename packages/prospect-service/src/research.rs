use std::path::{Path, PathBuf};

use serde_json::Value;
use time::OffsetDateTime;

use prospect_providers::{firecrawl, linkedin};

use crate::{
	EnrichmentPipeline, Result,
	enrichment::{safe_file_stem, timestamp_slug, write_json},
};

const KEY_POINT_CAP: usize = 20;
const MIN_KEY_POINT_CHARS: usize = 4;
const POSTS_LIMIT: usize = 10;

#[derive(Debug, serde::Serialize)]
pub struct ResearchReport {
	pub company_name: String,
	pub website_url: Option<String>,
	pub linkedin_url: Option<String>,
	pub website: Option<WebsiteResearch>,
	pub linkedin_company: Option<Value>,
	pub linkedin_posts: Vec<Value>,
	#[serde(with = "prospect_domain::time_serde")]
	pub generated_at: OffsetDateTime,
}

#[derive(Debug, serde::Serialize)]
pub struct WebsiteResearch {
	pub pages: Vec<PageSummary>,
	pub key_points: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct PageSummary {
	pub url: String,
	pub title: Option<String>,
	pub markdown_chars: usize,
}

/// Headings and top-level bullets are a cheap proxy for what a site thinks is
/// important about itself.
pub fn extract_key_points(markdown: &str, cap: usize) -> Vec<String> {
	let mut points = Vec::new();

	for line in markdown.lines() {
		let trimmed = line.trim();
		let point = if trimmed.starts_with('#') {
			trimmed.trim_start_matches('#').trim()
		} else if let Some(bullet) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* "))
		{
			bullet.trim()
		} else {
			continue;
		};

		if point.chars().count() < MIN_KEY_POINT_CHARS {
			continue;
		}
		if points.iter().any(|existing: &String| existing == point) {
			continue;
		}

		points.push(point.to_string());

		if points.len() >= cap {
			break;
		}
	}

	points
}

impl EnrichmentPipeline {
	/// Each research leg degrades independently: a failed crawl or LinkedIn
	/// fetch is logged and the rest of the report still completes.
	pub async fn research(
		&self,
		company_name: &str,
		website: Option<&str>,
		linkedin_url: Option<&str>,
		max_pages: u32,
	) -> ResearchReport {
		let mut report = ResearchReport {
			company_name: company_name.to_string(),
			website_url: website.map(|url| url.to_string()),
			linkedin_url: linkedin_url.map(|url| url.to_string()),
			website: None,
			linkedin_company: None,
			linkedin_posts: Vec::new(),
			generated_at: OffsetDateTime::now_utc(),
		};

		if let Some(url) = website {
			match firecrawl::crawl_site(&self.cfg.providers.firecrawl, url, max_pages).await {
				Ok(pages) => {
					let mut combined = String::new();

					for page in &pages {
						combined.push_str(&page.markdown);
						combined.push('\n');
					}

					report.website = Some(WebsiteResearch {
						pages: pages
							.iter()
							.map(|page| PageSummary {
								url: page.url.clone(),
								title: page.title.clone(),
								markdown_chars: page.markdown.chars().count(),
							})
							.collect(),
						key_points: extract_key_points(&combined, KEY_POINT_CAP),
					});

					tracing::info!(url, pages = pages.len(), "Website crawl complete.");
				},
				Err(err) => {
					tracing::warn!(error = %err, url, "Website crawl failed.");
				},
			}
		}

		if let Some(url) = linkedin_url {
			match linkedin::scrape_company(&self.cfg.providers.brightdata, url).await {
				Ok(company) => report.linkedin_company = Some(company),
				Err(err) => {
					tracing::warn!(error = %err, url, "LinkedIn company fetch failed.");
				},
			}

			match linkedin::company_posts(&self.cfg.providers.brightdata, url, POSTS_LIMIT).await {
				Ok(posts) => report.linkedin_posts = posts,
				Err(err) => {
					tracing::warn!(error = %err, url, "LinkedIn posts fetch failed.");
				},
			}
		}

		report
	}

	pub async fn linkedin_profile(&self, url: &str) -> Result<Value> {
		Ok(linkedin::scrape_profile(&self.cfg.providers.brightdata, url).await?)
	}

	pub fn write_research(
		&self,
		report: &ResearchReport,
		output_dir: Option<&Path>,
	) -> Result<PathBuf> {
		let dir = output_dir.unwrap_or(&self.cfg.enrichment.output_dir);
		let stem = safe_file_stem(&report.company_name);
		let timestamp = timestamp_slug(report.generated_at);
		let path = dir.join(format!("{stem}_research_{timestamp}.json"));

		write_json(&path, report)?;

		Ok(path)
	}

	pub fn write_profile(&self, profile: &Value, output_dir: Option<&Path>) -> Result<PathBuf> {
		let dir = output_dir.unwrap_or(&self.cfg.enrichment.output_dir);
		let timestamp = timestamp_slug(OffsetDateTime::now_utc());
		let path = dir.join(format!("linkedin_profile_{timestamp}.json"));

		write_json(&path, profile)?;

		Ok(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_points_take_headings_and_bullets() {
		let markdown = "\
# Acme Corp
Plain paragraph text.
- Forged anvils since 1952
* Same-day delivery
- Forged anvils since 1952
## Products
-x";
		let points = extract_key_points(markdown, 10);

		assert_eq!(
			points,
			vec![
				"Acme Corp".to_string(),
				"Forged anvils since 1952".to_string(),
				"Same-day delivery".to_string(),
				"Products".to_string(),
			]
		);
	}

	#[test]
	fn key_points_respect_the_cap() {
		let markdown = "# One\n# Two\n# Three\n";

		assert_eq!(extract_key_points(markdown, 2).len(), 2);
	}
}
