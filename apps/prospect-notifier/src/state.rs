use std::sync::Arc;

use prospect_service::NotifierService;
use prospect_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<NotifierService>,
}
impl AppState {
	pub async fn new(config: prospect_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.sqlite).await?;

		db.ensure_schema().await?;

		Ok(Self::with_service(NotifierService::new(config, db)))
	}

	pub fn with_service(service: NotifierService) -> Self {
		Self { service: Arc::new(service) }
	}
}
