pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prospect_service::EnrichmentPipeline;

#[derive(Debug, Parser)]
#[command(
	version = prospect_cli::VERSION,
	rename_all = "kebab",
	styles = prospect_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// List the available extraction schemas.
	ListSchemas,
	/// List the available prompt templates and their variables.
	ListPrompts,
	/// Enrich one website URL using a prompt template and extraction schema.
	Enrich {
		url: String,
		#[arg(long, short = 's')]
		schema: String,
		#[arg(long, short = 'p')]
		prompt: String,
		#[arg(long)]
		company: Option<String>,
		#[arg(long, value_name = "FILE")]
		output: Option<PathBuf>,
		#[arg(long = "var", value_name = "KEY=VALUE")]
		vars: Vec<String>,
	},
	/// Enrich every URL in a CSV file, continuing past per-row failures.
	Batch {
		input: PathBuf,
		#[arg(long, short = 's')]
		schema: String,
		#[arg(long, short = 'p')]
		prompt: String,
		#[arg(long = "url-col", default_value = "url")]
		url_col: String,
		#[arg(long = "name-col", default_value = "name")]
		name_col: String,
	},
	/// Research a company from its website and LinkedIn presence.
	Research {
		company: String,
		#[arg(long, short = 'w')]
		website: Option<String>,
		#[arg(long, short = 'l')]
		linkedin: Option<String>,
		#[arg(long, short = 'm', default_value_t = 5)]
		max_pages: u32,
		#[arg(long = "output-dir", short = 'o', value_name = "DIR")]
		output_dir: Option<PathBuf>,
	},
	/// Fetch one LinkedIn profile.
	LinkedinProfile {
		url: String,
		#[arg(long = "output-dir", short = 'o', value_name = "DIR")]
		output_dir: Option<PathBuf>,
	},
	/// Report which credentials and directories are configured.
	ConfigCheck,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = prospect_config::load(&args.config)?;

	init_tracing(&config);

	let pipeline = EnrichmentPipeline::new(config);

	match args.command {
		Command::ListSchemas => commands::list_schemas(&pipeline),
		Command::ListPrompts => commands::list_prompts(&pipeline),
		Command::Enrich { url, schema, prompt, company, output, vars } => {
			commands::enrich(&pipeline, &url, &schema, &prompt, company.as_deref(), output, &vars)
				.await
		},
		Command::Batch { input, schema, prompt, url_col, name_col } => {
			commands::batch(&pipeline, &input, &schema, &prompt, &url_col, &name_col).await
		},
		Command::Research { company, website, linkedin, max_pages, output_dir } => {
			commands::research(
				&pipeline,
				&company,
				website.as_deref(),
				linkedin.as_deref(),
				max_pages,
				output_dir.as_deref(),
			)
			.await
		},
		Command::LinkedinProfile { url, output_dir } => {
			commands::linkedin_profile(&pipeline, &url, output_dir.as_deref()).await
		},
		Command::ConfigCheck => commands::config_check(&pipeline.cfg),
	}
}

fn init_tracing(config: &prospect_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
