pub mod search;
pub mod sorts;

mod error;

pub use error::{Error, Result};
pub use search::{SearchItem, SearchRequest, SearchResponse};
pub use sorts::{PresetDescription, SortCatalog};

use std::sync::Arc;

use time::UtcOffset;

use sift_config::Config;
use sift_ranking::{HostSchema, PgEscaper, SqlEscaper, StrategyRegistry};
use sift_storage::db::Db;

pub struct SiftService {
	pub cfg: Config,
	pub db: Db,
	pub schema: HostSchema,
	pub registry: StrategyRegistry,
	escaper: Arc<dyn SqlEscaper>,
	site_offset: UtcOffset,
}
impl SiftService {
	/// Builds a service over the built-in strategies.
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		let escaper: Arc<dyn SqlEscaper> = Arc::new(PgEscaper);
		let registry = StrategyRegistry::builtin(escaper.clone());

		Self::with_registry(cfg, db, registry, escaper)
	}

	/// `escaper` quotes the host query and should be the one `registry` hands its strategies.
	pub fn with_registry(
		cfg: Config,
		db: Db,
		registry: StrategyRegistry,
		escaper: Arc<dyn SqlEscaper>,
	) -> Result<Self> {
		let site_offset = cfg.site.utc_offset()?;
		let schema = HostSchema::from_config(&cfg.host);

		Ok(Self { cfg, db, schema, registry, escaper, site_offset })
	}

	pub fn site_offset(&self) -> UtcOffset {
		self.site_offset
	}
}
