pub mod analytics;
pub mod enrichment;
pub mod ingest;
pub mod poll;
pub mod research;

use std::{
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};

use serde_json::Value;
use time::OffsetDateTime;

use prospect_config::{CloseConfig, Config, DiscordConfig, FirecrawlConfig, LlmProviderConfig};
use prospect_domain::{CacheStats, DedupCache};
use prospect_providers::{EmailOpenEvent, WebsiteContent, closeio, discord, extractor, firecrawl};
use prospect_storage::db::Db;

pub use enrichment::{BatchError, BatchReport, BatchRow, EnrichmentPipeline, EnrichmentResult};
pub use ingest::{IngestOutcome, StatsResponse};
pub use poll::PollOutcome;
pub use research::{PageSummary, ResearchReport, WebsiteResearch};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Domain(#[from] prospect_domain::Error),
	#[error(transparent)]
	Provider(#[from] prospect_providers::Error),
	#[error(transparent)]
	Storage(#[from] prospect_storage::Error),
	#[error(transparent)]
	Csv(#[from] csv::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error("Failed to write {path:?}.")]
	WriteOutput { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to read {path:?}.")]
	ReadInput { path: std::path::PathBuf, source: std::io::Error },
	#[error("{name:?} not found under {dir:?}.")]
	NotFound { name: String, dir: std::path::PathBuf },
	#[error("{message}")]
	InvalidRequest { message: String },
	#[error("Failed to render CSV export.")]
	Export,
}

/// Provider seams mirror the outbound HTTP calls so tests can script them.
pub trait ScrapeProvider
where
	Self: Send + Sync,
{
	fn scrape_url<'a>(
		&'a self,
		cfg: &'a FirecrawlConfig,
		url: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<WebsiteContent>>;
}

pub trait ExtractProvider
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<Value>>;
}

pub trait NotifyProvider
where
	Self: Send + Sync,
{
	fn send_open<'a>(
		&'a self,
		cfg: &'a DiscordConfig,
		event: &'a EmailOpenEvent,
		lead_name: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<()>>;
}

pub trait CrmProvider
where
	Self: Send + Sync,
{
	fn list_open_events<'a>(
		&'a self,
		cfg: &'a CloseConfig,
		since: OffsetDateTime,
	) -> BoxFuture<'a, prospect_providers::Result<Vec<EmailOpenEvent>>>;

	fn lead_name<'a>(
		&'a self,
		cfg: &'a CloseConfig,
		lead_id: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<Option<String>>>;
}

pub struct HttpScrape;
impl ScrapeProvider for HttpScrape {
	fn scrape_url<'a>(
		&'a self,
		cfg: &'a FirecrawlConfig,
		url: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<WebsiteContent>> {
		Box::pin(firecrawl::scrape_url(cfg, url))
	}
}

pub struct HttpExtract;
impl ExtractProvider for HttpExtract {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<Value>> {
		Box::pin(extractor::extract(cfg, prompt))
	}
}

pub struct HttpNotify;
impl NotifyProvider for HttpNotify {
	fn send_open<'a>(
		&'a self,
		cfg: &'a DiscordConfig,
		event: &'a EmailOpenEvent,
		lead_name: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<()>> {
		Box::pin(discord::send_open_notification(cfg, event, lead_name))
	}
}

pub struct HttpCrm;
impl CrmProvider for HttpCrm {
	fn list_open_events<'a>(
		&'a self,
		cfg: &'a CloseConfig,
		since: OffsetDateTime,
	) -> BoxFuture<'a, prospect_providers::Result<Vec<EmailOpenEvent>>> {
		Box::pin(closeio::list_open_events(cfg, since))
	}

	fn lead_name<'a>(
		&'a self,
		cfg: &'a CloseConfig,
		lead_id: &'a str,
	) -> BoxFuture<'a, prospect_providers::Result<Option<String>>> {
		Box::pin(closeio::fetch_lead_name(cfg, lead_id))
	}
}

#[derive(Clone)]
pub struct NotifierProviders {
	pub notify: Arc<dyn NotifyProvider>,
	pub crm: Arc<dyn CrmProvider>,
}
impl NotifierProviders {
	pub fn http() -> Self {
		Self { notify: Arc::new(HttpNotify), crm: Arc::new(HttpCrm) }
	}
}

#[derive(Clone)]
pub struct EnrichmentProviders {
	pub scrape: Arc<dyn ScrapeProvider>,
	pub extract: Arc<dyn ExtractProvider>,
}
impl EnrichmentProviders {
	pub fn http() -> Self {
		Self { scrape: Arc::new(HttpScrape), extract: Arc::new(HttpExtract) }
	}
}

/// Shared state of the relay: webhook handlers and the polling loop both feed
/// [`NotifierService::ingest_open`], so dedup and persistence behave the same
/// regardless of which channel delivered an event.
pub struct NotifierService {
	pub cfg: Config,
	pub db: Db,
	cache: Mutex<DedupCache>,
	providers: NotifierProviders,
}
impl NotifierService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_providers(cfg, db, NotifierProviders::http())
	}

	pub fn with_providers(cfg: Config, db: Db, providers: NotifierProviders) -> Self {
		let cache = Mutex::new(DedupCache::new(cfg.notifier.cache_retention_hours));

		Self { cfg, db, cache, providers }
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.lock().unwrap_or_else(|err| err.into_inner()).stats()
	}
}
