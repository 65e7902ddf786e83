use std::sync::Arc;

use sift_service::SiftService;
use sift_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SiftService>,
}
impl AppState {
	/// Connects to Postgres and ensures the host tables exist.
	pub async fn new(config: sift_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;
		let service = SiftService::new(config, db)?;

		service.db.ensure_schema(&service.schema).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: SiftService) -> Self {
		Self { service: Arc::new(service) }
	}
}
