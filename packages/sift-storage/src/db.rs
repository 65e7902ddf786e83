use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};
use sift_ranking::HostSchema;

const SCHEMA_LOCK_ID: i64 = 7_431_019;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &sift_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Builds the pool without opening a connection until first use.
	pub fn connect_lazy(cfg: &sift_config::Postgres) -> Result<Self> {
		let pool = PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect_lazy(&cfg.dsn)?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self, host: &HostSchema) -> Result<()> {
		let sql = schema::render_schema(host);
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(SCHEMA_LOCK_ID).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		tracing::info!(
			entity_table = host.entity_table.as_str(),
			meta_table = host.meta_table.as_str(),
			schedule_table = host.schedule_table.as_str(),
			"Host schema ensured."
		);

		Ok(())
	}
}
