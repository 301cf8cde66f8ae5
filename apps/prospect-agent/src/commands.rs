use std::{collections::HashMap, path::Path};

use color_eyre::eyre;

use prospect_config::Config;
use prospect_service::{EnrichmentPipeline, Error as ServiceError};

pub fn list_schemas(pipeline: &EnrichmentPipeline) -> color_eyre::Result<()> {
	let schemas = match pipeline.list_schemas() {
		Ok(schemas) => schemas,
		Err(ServiceError::ReadInput { path, .. }) => {
			println!("Schemas directory not found: {}", path.display());

			return Ok(());
		},
		Err(err) => return Err(err.into()),
	};

	if schemas.is_empty() {
		println!("No extraction schemas found.");

		return Ok(());
	}

	for schema in schemas {
		println!("{:<24} {:>2} fields  {}", schema.name, schema.fields.len(), schema.description);
	}

	Ok(())
}

pub fn list_prompts(pipeline: &EnrichmentPipeline) -> color_eyre::Result<()> {
	let prompts = match pipeline.list_prompts() {
		Ok(prompts) => prompts,
		Err(ServiceError::ReadInput { path, .. }) => {
			println!("Prompts directory not found: {}", path.display());

			return Ok(());
		},
		Err(err) => return Err(err.into()),
	};

	if prompts.is_empty() {
		println!("No prompt templates found.");

		return Ok(());
	}

	for prompt in prompts {
		let variables =
			if prompt.variables.is_empty() { "none".to_string() } else { prompt.variables.join(", ") };

		println!("{:<24} variables: {variables}", prompt.name);
	}

	Ok(())
}

pub async fn enrich(
	pipeline: &EnrichmentPipeline,
	url: &str,
	schema_name: &str,
	prompt_name: &str,
	company: Option<&str>,
	output: Option<std::path::PathBuf>,
	raw_vars: &[String],
) -> color_eyre::Result<()> {
	let vars = parse_vars(raw_vars)?;
	let schema = pipeline.load_schema(schema_name)?;

	println!("Loaded schema: {}", schema.name);

	let prompt = pipeline.load_prompt(prompt_name)?;

	println!("Loaded prompt: {}", prompt.name);
	println!("Enriching {url} ...");

	let result = pipeline.enrich_url(url, &schema, &prompt, company, &vars).await?;

	println!("\nExtracted {} fields:", result.extracted_data.len());
	println!("{}", serde_json::to_string_pretty(&result.extracted_data)?);

	let path = pipeline.write_result(&result, output.as_deref())?;

	println!("\nSaved to: {}", path.display());

	Ok(())
}

pub async fn batch(
	pipeline: &EnrichmentPipeline,
	input: &Path,
	schema_name: &str,
	prompt_name: &str,
	url_column: &str,
	name_column: &str,
) -> color_eyre::Result<()> {
	let rows = EnrichmentPipeline::read_batch_rows(input, url_column, name_column)?;

	if rows.is_empty() {
		println!("No rows found in {}.", input.display());

		return Ok(());
	}

	println!("Processing {} URLs ...", rows.len());

	let schema = pipeline.load_schema(schema_name)?;
	let prompt = pipeline.load_prompt(prompt_name)?;
	let report = pipeline.run_batch(&rows, &schema, &prompt).await;
	let path = pipeline.write_batch(&report)?;

	println!("Processed {}/{} successfully.", report.results.len(), rows.len());

	for error in &report.errors {
		println!("  row {}: {} ({})", error.row, error.error, error.url);
	}

	println!("Saved to: {}", path.display());

	if !report.errors.is_empty() {
		return Err(eyre::eyre!("{} of {} rows failed.", report.errors.len(), rows.len()));
	}

	Ok(())
}

pub async fn research(
	pipeline: &EnrichmentPipeline,
	company: &str,
	website: Option<&str>,
	linkedin: Option<&str>,
	max_pages: u32,
	output_dir: Option<&Path>,
) -> color_eyre::Result<()> {
	if website.is_none() && linkedin.is_none() {
		return Err(eyre::eyre!("Provide --website and/or --linkedin to research."));
	}

	println!("Researching {company} ...");

	let report = pipeline.research(company, website, linkedin, max_pages).await;

	if let Some(website) = &report.website {
		println!(
			"Website: {} pages scraped, {} key points.",
			website.pages.len(),
			website.key_points.len()
		);
	}
	if report.linkedin_company.is_some() {
		println!("LinkedIn company data fetched.");
	}
	if !report.linkedin_posts.is_empty() {
		println!("Fetched {} LinkedIn posts.", report.linkedin_posts.len());
	}

	let path = pipeline.write_research(&report, output_dir)?;

	println!("Saved to: {}", path.display());

	Ok(())
}

pub async fn linkedin_profile(
	pipeline: &EnrichmentPipeline,
	url: &str,
	output_dir: Option<&Path>,
) -> color_eyre::Result<()> {
	println!("Fetching LinkedIn profile {url} ...");

	let profile = pipeline.linkedin_profile(url).await?;
	let path = pipeline.write_profile(&profile, output_dir)?;

	println!("Saved to: {}", path.display());

	Ok(())
}

pub fn config_check(cfg: &Config) -> color_eyre::Result<()> {
	let checks = [
		("Firecrawl API key", !cfg.providers.firecrawl.api_key.trim().is_empty()),
		("Anthropic API key", !cfg.providers.llm.api_key.trim().is_empty()),
		("Close API key", !cfg.providers.closeio.api_key.trim().is_empty()),
		("Bright Data API key", !cfg.providers.brightdata.api_key.trim().is_empty()),
		("Discord webhook URL", cfg.providers.discord.webhook_url.is_some()),
		("Schemas directory", cfg.enrichment.schemas_dir.is_dir()),
		("Prompts directory", cfg.enrichment.prompts_dir.is_dir()),
	];

	for (name, ok) in checks {
		println!("{} {name}", if ok { "✓" } else { "✗" });
	}

	Ok(())
}

fn parse_vars(raw: &[String]) -> color_eyre::Result<HashMap<String, String>> {
	let mut vars = HashMap::new();

	for entry in raw {
		let Some((key, value)) = entry.split_once('=') else {
			return Err(eyre::eyre!("Invalid variable {entry:?}. Use key=value."));
		};

		vars.insert(key.trim().to_string(), value.trim().to_string());
	}

	Ok(vars)
}
