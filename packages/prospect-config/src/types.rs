use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	#[serde(default)]
	pub storage: Storage,
	#[serde(default)]
	pub providers: Providers,
	#[serde(default)]
	pub enrichment: Enrichment,
	#[serde(default)]
	pub notifier: Notifier,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { http_bind: "127.0.0.1:8000".to_string(), log_level: "info".to_string() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
	#[serde(default)]
	pub sqlite: Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Sqlite {
	pub path: PathBuf,
	pub pool_max_conns: u32,
}
impl Default for Sqlite {
	fn default() -> Self {
		Self { path: PathBuf::from("data/email_opens.db"), pool_max_conns: 4 }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Providers {
	#[serde(default)]
	pub firecrawl: FirecrawlConfig,
	#[serde(default)]
	pub llm: LlmProviderConfig,
	#[serde(default)]
	pub closeio: CloseConfig,
	#[serde(default)]
	pub discord: DiscordConfig,
	#[serde(default)]
	pub brightdata: BrightDataConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirecrawlConfig {
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
	pub max_retries: u32,
}
impl Default for FirecrawlConfig {
	fn default() -> Self {
		Self {
			api_base: "https://api.firecrawl.dev/v1".to_string(),
			api_key: String::new(),
			timeout_ms: 60_000,
			max_retries: 1,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub max_tokens: u32,
	pub temperature: f32,
	pub timeout_ms: u64,
}
impl Default for LlmProviderConfig {
	fn default() -> Self {
		Self {
			api_base: "https://api.anthropic.com/v1".to_string(),
			api_key: String::new(),
			path: "/messages".to_string(),
			model: "claude-sonnet-4-20250514".to_string(),
			max_tokens: 4_096,
			temperature: 0.0,
			timeout_ms: 60_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloseConfig {
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
}
impl Default for CloseConfig {
	fn default() -> Self {
		Self {
			api_base: "https://api.close.com/api/v1".to_string(),
			api_key: String::new(),
			timeout_ms: 30_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
	pub webhook_url: Option<String>,
	pub timeout_ms: u64,
}
impl Default for DiscordConfig {
	fn default() -> Self {
		Self { webhook_url: None, timeout_ms: 10_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrightDataConfig {
	pub api_base: String,
	pub api_key: String,
	pub dataset_company: String,
	pub dataset_profile: String,
	pub dataset_posts: String,
	pub timeout_ms: u64,
	pub snapshot_poll_ms: u64,
	pub snapshot_poll_max: u32,
}
impl Default for BrightDataConfig {
	fn default() -> Self {
		Self {
			api_base: "https://api.brightdata.com/datasets/v3".to_string(),
			api_key: String::new(),
			dataset_company: "gd_l1vikfnt1wgvvqz95w".to_string(),
			dataset_profile: "gd_l1viktl72bvl7bjuj0".to_string(),
			dataset_posts: "gd_lyy3tktm25m4avu764".to_string(),
			timeout_ms: 30_000,
			snapshot_poll_ms: 5_000,
			snapshot_poll_max: 60,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Enrichment {
	pub prompts_dir: PathBuf,
	pub schemas_dir: PathBuf,
	pub output_dir: PathBuf,
}
impl Default for Enrichment {
	fn default() -> Self {
		Self {
			prompts_dir: PathBuf::from("prompts"),
			schemas_dir: PathBuf::from("schemas"),
			output_dir: PathBuf::from("output"),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Notifier {
	pub polling_enabled: bool,
	pub polling_interval_seconds: u64,
	pub cache_retention_hours: i64,
}
impl Default for Notifier {
	fn default() -> Self {
		Self { polling_enabled: true, polling_interval_seconds: 300, cache_retention_hours: 24 }
	}
}
