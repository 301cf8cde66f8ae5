pub mod closeio;
pub mod discord;
pub mod extractor;
pub mod firecrawl;
pub mod linkedin;

mod error;

pub use closeio::{EmailOpenEvent, WebhookEnvelope, open_from_event, open_from_webhook};
pub use error::{Error, Result};
pub use firecrawl::{CrawledPage, WebsiteContent};

use std::time::Duration;

use reqwest::Client;

pub(crate) fn http_client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

pub(crate) fn require_key(
	key: &str,
	operation: &'static str,
	missing: &'static str,
) -> Result<()> {
	if key.trim().is_empty() {
		return Err(Error::MissingCredential { operation, missing });
	}

	Ok(())
}
