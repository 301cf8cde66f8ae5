use std::{
	collections::HashMap,
	fs,
	path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use prospect_config::Config;
use prospect_domain::{ExtractionSchema, PromptTemplate, validate_extraction};

use crate::{EnrichmentProviders, Error, Result};

/// Page content is clipped before prompting so one oversized page cannot blow
/// the model's context window.
const MAX_CONTENT_CHARS: usize = 60_000;

const FILE_TIMESTAMP_FORMAT: &[FormatItem<'static>] =
	format_description!("[year][month][day]_[hour][minute][second]");

#[derive(Debug, Clone, serde::Serialize)]
pub struct EnrichmentResult {
	pub company_name: String,
	pub url: String,
	pub schema_used: String,
	pub prompt_used: String,
	pub extracted_data: Map<String, Value>,
	pub model_used: String,
	#[serde(with = "prospect_domain::time_serde")]
	pub enriched_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct BatchRow {
	pub name: String,
	pub url: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchError {
	pub row: usize,
	pub name: String,
	pub url: String,
	pub error: String,
}

#[derive(Debug, serde::Serialize)]
pub struct BatchReport {
	pub results: Vec<EnrichmentResult>,
	pub errors: Vec<BatchError>,
	#[serde(with = "prospect_domain::time_serde")]
	pub started_at: OffsetDateTime,
}

/// Scrape → render → extract → validate → write, with the schema and prompt
/// loaded once per invocation and reused across batch rows.
pub struct EnrichmentPipeline {
	pub cfg: Config,
	providers: EnrichmentProviders,
}

impl EnrichmentPipeline {
	pub fn new(cfg: Config) -> Self {
		Self::with_providers(cfg, EnrichmentProviders::http())
	}

	pub fn with_providers(cfg: Config, providers: EnrichmentProviders) -> Self {
		Self { cfg, providers }
	}

	pub fn load_schema(&self, name: &str) -> Result<ExtractionSchema> {
		let dir = &self.cfg.enrichment.schemas_dir;
		let path = dir.join(format!("{name}.json"));

		if !path.is_file() {
			return Err(Error::NotFound { name: name.to_string(), dir: dir.clone() });
		}

		Ok(ExtractionSchema::from_file(&path)?)
	}

	pub fn load_prompt(&self, name: &str) -> Result<PromptTemplate> {
		let dir = &self.cfg.enrichment.prompts_dir;

		for extension in ["txt", "md"] {
			let path = dir.join(format!("{name}.{extension}"));

			if path.is_file() {
				return Ok(PromptTemplate::from_file(&path)?);
			}
		}

		Err(Error::NotFound { name: name.to_string(), dir: dir.clone() })
	}

	pub fn list_schemas(&self) -> Result<Vec<ExtractionSchema>> {
		let dir = &self.cfg.enrichment.schemas_dir;
		let mut schemas = Vec::new();

		for path in sorted_files(dir, &["json"])? {
			schemas.push(ExtractionSchema::from_file(&path)?);
		}

		Ok(schemas)
	}

	pub fn list_prompts(&self) -> Result<Vec<PromptTemplate>> {
		let dir = &self.cfg.enrichment.prompts_dir;
		let mut prompts = Vec::new();

		for path in sorted_files(dir, &["txt", "md"])? {
			prompts.push(PromptTemplate::from_file(&path)?);
		}

		Ok(prompts)
	}

	pub async fn enrich_url(
		&self,
		url: &str,
		schema: &ExtractionSchema,
		prompt: &PromptTemplate,
		company_name: Option<&str>,
		vars: &HashMap<String, String>,
	) -> Result<EnrichmentResult> {
		let content =
			self.providers.scrape.scrape_url(&self.cfg.providers.firecrawl, url).await?;

		tracing::info!(url, chars = content.markdown.len(), "Scraped page.");

		let rendered = render_prompt(prompt, schema, &content.markdown, company_name, vars)?;
		let extracted =
			self.providers.extract.extract(&self.cfg.providers.llm, &rendered).await?;
		let extracted_data = validate_extraction(schema, extracted)?;

		Ok(EnrichmentResult {
			company_name: company_name.unwrap_or(url).to_string(),
			url: url.to_string(),
			schema_used: schema.name.clone(),
			prompt_used: prompt.name.clone(),
			extracted_data,
			model_used: self.cfg.providers.llm.model.clone(),
			enriched_at: OffsetDateTime::now_utc(),
		})
	}

	/// Rows are independent: a failed row becomes an error entry and the rest
	/// of the batch keeps going.
	pub async fn run_batch(
		&self,
		rows: &[BatchRow],
		schema: &ExtractionSchema,
		prompt: &PromptTemplate,
	) -> BatchReport {
		let mut report = BatchReport {
			results: Vec::new(),
			errors: Vec::new(),
			started_at: OffsetDateTime::now_utc(),
		};

		for (index, row) in rows.iter().enumerate() {
			let row_number = index + 1;

			if row.url.trim().is_empty() {
				report.errors.push(BatchError {
					row: row_number,
					name: row.name.clone(),
					url: row.url.clone(),
					error: "Row has no URL.".to_string(),
				});

				continue;
			}

			let company_name = (!row.name.trim().is_empty()).then_some(row.name.as_str());

			match self
				.enrich_url(&row.url, schema, prompt, company_name, &HashMap::new())
				.await
			{
				Ok(result) => report.results.push(result),
				Err(err) => {
					tracing::warn!(error = %err, url = %row.url, "Batch row failed.");

					report.errors.push(BatchError {
						row: row_number,
						name: row.name.clone(),
						url: row.url.clone(),
						error: err.to_string(),
					});
				},
			}
		}

		report
	}

	pub fn read_batch_rows(
		path: &Path,
		url_column: &str,
		name_column: &str,
	) -> Result<Vec<BatchRow>> {
		let mut reader = csv::Reader::from_path(path)?;
		let headers = reader.headers()?.clone();
		let url_index = headers.iter().position(|header| header == url_column).ok_or_else(|| {
			Error::InvalidRequest { message: format!("CSV has no {url_column:?} column.") }
		})?;
		let name_index = headers.iter().position(|header| header == name_column);
		let mut rows = Vec::new();

		for record in reader.records() {
			let record = record?;
			let url = record.get(url_index).unwrap_or("").trim().to_string();
			let name = name_index
				.and_then(|index| record.get(index))
				.unwrap_or("")
				.trim()
				.to_string();

			rows.push(BatchRow { name, url });
		}

		Ok(rows)
	}

	pub fn write_result(
		&self,
		result: &EnrichmentResult,
		output: Option<&Path>,
	) -> Result<PathBuf> {
		let path = match output {
			Some(path) => path.to_path_buf(),
			None => {
				let stem = safe_file_stem(&result.company_name);
				let timestamp = timestamp_slug(result.enriched_at);

				self.cfg.enrichment.output_dir.join(format!("{stem}_{timestamp}.json"))
			},
		};

		write_json(&path, result)?;

		Ok(path)
	}

	pub fn write_batch(&self, report: &BatchReport) -> Result<PathBuf> {
		let timestamp = timestamp_slug(report.started_at);
		let path = self.cfg.enrichment.output_dir.join(format!("batch_{timestamp}.json"));

		write_json(&path, report)?;

		Ok(path)
	}
}

pub(crate) fn write_json<T>(path: &Path, value: &T) -> Result<()>
where
	T: serde::Serialize,
{
	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		fs::create_dir_all(parent)
			.map_err(|err| Error::WriteOutput { path: path.to_path_buf(), source: err })?;
	}

	let payload = serde_json::to_string_pretty(value)?;

	fs::write(path, payload)
		.map_err(|err| Error::WriteOutput { path: path.to_path_buf(), source: err })
}

fn sorted_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
	let entries = fs::read_dir(dir)
		.map_err(|err| Error::ReadInput { path: dir.to_path_buf(), source: err })?;
	let mut paths = Vec::new();

	for entry in entries {
		let entry =
			entry.map_err(|err| Error::ReadInput { path: dir.to_path_buf(), source: err })?;
		let path = entry.path();
		let matches = path
			.extension()
			.and_then(|extension| extension.to_str())
			.map(|extension| extensions.contains(&extension))
			.unwrap_or(false);

		if path.is_file() && matches {
			paths.push(path);
		}
	}

	paths.sort();

	Ok(paths)
}

fn render_prompt(
	template: &PromptTemplate,
	schema: &ExtractionSchema,
	content: &str,
	company_name: Option<&str>,
	extra_vars: &HashMap<String, String>,
) -> Result<String> {
	let mut vars = extra_vars.clone();

	if let Some(name) = company_name {
		vars.entry("company_name".to_string()).or_insert_with(|| name.to_string());
	}

	let clipped = truncate_chars(content, MAX_CONTENT_CHARS);
	let inline_content = template.variables.iter().any(|variable| variable == "website_content");

	if inline_content {
		vars.insert("website_content".to_string(), clipped.clone());
	}

	let mut rendered = template.render(&vars)?;

	if !inline_content {
		rendered.push_str("\n\n---\n\nWebsite content:\n\n");
		rendered.push_str(&clipped);
	}

	rendered.push_str("\n\nReturn a single JSON object with these fields:\n");
	rendered.push_str(&schema.field_instructions());
	rendered.push_str("\nRespond with JSON only.");

	Ok(rendered)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
	if text.chars().count() <= max_chars {
		return text.to_string();
	}

	let mut out: String = text.chars().take(max_chars).collect();

	out.push_str("\n[content truncated]");

	out
}

pub fn safe_file_stem(name: &str) -> String {
	let cleaned: String = name
		.chars()
		.filter(|character| character.is_alphanumeric() || matches!(character, ' ' | '-' | '_'))
		.collect();
	let cleaned = cleaned.trim().replace(' ', "_");

	if cleaned.is_empty() { "enrichment".to_string() } else { cleaned }
}

pub(crate) fn timestamp_slug(ts: OffsetDateTime) -> String {
	ts.format(FILE_TIMESTAMP_FORMAT).unwrap_or_else(|_| ts.unix_timestamp().to_string())
}
