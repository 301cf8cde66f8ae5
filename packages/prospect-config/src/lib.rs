mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	BrightDataConfig, CloseConfig, Config, DiscordConfig, Enrichment, FirecrawlConfig,
	LlmProviderConfig, Notifier, Providers, Service, Sqlite, Storage,
};

use std::{env, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env_overrides(&mut cfg, |name| env::var(name).ok());

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Environment variables take precedence over file values, so deployments can
/// keep secrets out of the config file entirely.
pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(value) = lookup("FIRECRAWL_API_KEY") {
		cfg.providers.firecrawl.api_key = value;
	}
	if let Some(value) = lookup("ANTHROPIC_API_KEY") {
		cfg.providers.llm.api_key = value;
	}
	if let Some(value) = lookup("CLOSEIO_API_KEY") {
		cfg.providers.closeio.api_key = value;
	}
	if let Some(value) = lookup("BRIGHTDATA_API_KEY") {
		cfg.providers.brightdata.api_key = value;
	}
	if let Some(value) = lookup("DISCORD_WEBHOOK_URL") {
		cfg.providers.discord.webhook_url = Some(value);
	}
	if let Some(value) = lookup("PROSPECT_HTTP_BIND") {
		cfg.service.http_bind = value;
	}
	if let Some(value) = lookup("POLLING_ENABLED") {
		cfg.notifier.polling_enabled = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
	}
	if let Some(value) = lookup("POLLING_INTERVAL_SECONDS")
		&& let Ok(parsed) = value.parse()
	{
		cfg.notifier.polling_interval_seconds = parsed;
	}
	if let Some(value) = lookup("CACHE_RETENTION_HOURS")
		&& let Ok(parsed) = value.parse()
	{
		cfg.notifier.cache_retention_hours = parsed;
	}
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "storage.sqlite.path must be non-empty.".to_string(),
		});
	}
	if cfg.storage.sqlite.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.sqlite.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.llm.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.llm.model must be non-empty.".to_string(),
		});
	}
	if cfg.providers.llm.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.llm.max_tokens must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be zero or greater.".to_string(),
		});
	}

	for (label, timeout) in [
		("firecrawl", cfg.providers.firecrawl.timeout_ms),
		("llm", cfg.providers.llm.timeout_ms),
		("closeio", cfg.providers.closeio.timeout_ms),
		("discord", cfg.providers.discord.timeout_ms),
		("brightdata", cfg.providers.brightdata.timeout_ms),
	] {
		if timeout == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	if cfg.providers.brightdata.snapshot_poll_ms == 0 {
		return Err(Error::Validation {
			message: "providers.brightdata.snapshot_poll_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.brightdata.snapshot_poll_max == 0 {
		return Err(Error::Validation {
			message: "providers.brightdata.snapshot_poll_max must be greater than zero.".to_string(),
		});
	}
	if cfg.notifier.polling_interval_seconds == 0 {
		return Err(Error::Validation {
			message: "notifier.polling_interval_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.notifier.cache_retention_hours <= 0 {
		return Err(Error::Validation {
			message: "notifier.cache_retention_hours must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.discord
		.webhook_url
		.as_deref()
		.map(|url| url.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.discord.webhook_url = None;
	}

	for base in [
		&mut cfg.providers.firecrawl.api_base,
		&mut cfg.providers.llm.api_base,
		&mut cfg.providers.closeio.api_base,
		&mut cfg.providers.brightdata.api_base,
	] {
		while base.ends_with('/') {
			base.pop();
		}
	}
}
