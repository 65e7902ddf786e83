//! Write side used by the host's indexing path: entities, meta counters, and weekly schedules.

use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, db::Db};
use sift_ranking::{
	HostSchema, PgEscaper, SqlEscaper, WeeklyInterval,
	context::{
		ENTITY_ID_COLUMN, ENTITY_TIMEZONE_COLUMN, META_KEY_COLUMN, META_VALUE_COLUMN,
		SCHEDULE_END_COLUMN, SCHEDULE_FIELD_COLUMN, SCHEDULE_START_COLUMN,
	},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vote {
	Helpful,
	Unhelpful,
}
impl Vote {
	fn meta_key(self, schema: &HostSchema) -> &str {
		match self {
			Self::Helpful => &schema.helpful_yes_key,
			Self::Unhelpful => &schema.helpful_no_key,
		}
	}
}

/// Per-period view totals stored as `{"views":{"all":..,"30d":..,"7d":..,"1d":..}}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewCounts {
	pub all: i64,
	pub last_30d: i64,
	pub last_7d: i64,
	pub last_24h: i64,
}
impl ViewCounts {
	fn to_meta_value(self) -> String {
		json!({
			"views": {
				"all": self.all,
				"30d": self.last_30d,
				"7d": self.last_7d,
				"1d": self.last_24h,
			}
		})
		.to_string()
	}
}

pub async fn insert_entity(
	db: &Db,
	schema: &HostSchema,
	entity_id: Uuid,
	title: &str,
	created_at: OffsetDateTime,
) -> Result<()> {
	let sql = format!(
		"INSERT INTO {} ({}, title, created_at) VALUES ($1, $2, $3)",
		PgEscaper.ident(&schema.entity_table),
		ENTITY_ID_COLUMN,
	);

	sqlx::query(&sql).bind(entity_id).bind(title).bind(created_at).execute(&db.pool).await?;

	Ok(())
}

/// Stores the entity's IANA timezone. Names Postgres does not recognize are stored as NULL, which
/// ranking treats as UTC. Returns the stored value.
pub async fn set_entity_timezone(
	db: &Db,
	schema: &HostSchema,
	entity_id: Uuid,
	timezone: Option<&str>,
) -> Result<Option<String>> {
	let sql = format!(
		"\
UPDATE {table}
SET {tz} = (SELECT name FROM pg_timezone_names WHERE name = $2 LIMIT 1)
WHERE {id} = $1
RETURNING {tz}",
		table = PgEscaper.ident(&schema.entity_table),
		tz = ENTITY_TIMEZONE_COLUMN,
		id = ENTITY_ID_COLUMN,
	);
	let stored: Option<Option<String>> = sqlx::query_scalar(&sql)
		.bind(entity_id)
		.bind(timezone.map(str::trim))
		.fetch_optional(&db.pool)
		.await?;
	let Some(stored) = stored else {
		return Err(Error::NotFound(format!("Entity {entity_id} does not exist.")));
	};

	if stored.is_none() && timezone.is_some_and(|tz| !tz.trim().is_empty()) {
		tracing::warn!(%entity_id, timezone, "Unknown timezone stored as NULL.");
	}

	Ok(stored)
}

pub async fn set_meta(
	db: &Db,
	schema: &HostSchema,
	entity_id: Uuid,
	key: &str,
	value: &str,
) -> Result<()> {
	if key.trim().is_empty() {
		return Err(Error::InvalidArgument("Meta key must be non-empty.".to_string()));
	}

	let sql = format!(
		"\
INSERT INTO {table} ({id}, {key}, {value})
VALUES ($1, $2, $3)
ON CONFLICT ({id}, {key}) DO UPDATE SET {value} = EXCLUDED.{value}",
		table = PgEscaper.ident(&schema.meta_table),
		id = ENTITY_ID_COLUMN,
		key = META_KEY_COLUMN,
		value = META_VALUE_COLUMN,
	);

	sqlx::query(&sql).bind(entity_id).bind(key).bind(value).execute(&db.pool).await?;

	Ok(())
}

pub async fn set_view_counts(
	db: &Db,
	schema: &HostSchema,
	entity_id: Uuid,
	counts: ViewCounts,
) -> Result<()> {
	set_meta(db, schema, entity_id, &schema.views_key, &counts.to_meta_value()).await
}

/// Adds one to the entity's vote counter and returns the new total. A stored value that is not an
/// integer restarts from zero.
pub async fn increment_vote(
	db: &Db,
	schema: &HostSchema,
	entity_id: Uuid,
	vote: Vote,
) -> Result<i64> {
	let table = PgEscaper.ident(&schema.meta_table);
	let sql = format!(
		"\
INSERT INTO {table} ({id}, {key}, {value})
VALUES ($1, $2, '1')
ON CONFLICT ({id}, {key}) DO UPDATE SET {value} = (
	CASE
		WHEN btrim({table}.{value}) ~ '^-?[0-9]{{1,18}}$' THEN btrim({table}.{value})::bigint
		ELSE 0
	END + 1
)::text
RETURNING {value}::bigint",
		id = ENTITY_ID_COLUMN,
		key = META_KEY_COLUMN,
		value = META_VALUE_COLUMN,
	);
	let total: i64 = sqlx::query_scalar(&sql)
		.bind(entity_id)
		.bind(vote.meta_key(schema))
		.fetch_one(&db.pool)
		.await?;

	Ok(total)
}

/// Replaces every interval stored for `field_key` on the entity.
pub async fn replace_schedule(
	db: &Db,
	schema: &HostSchema,
	entity_id: Uuid,
	field_key: &str,
	intervals: &[WeeklyInterval],
) -> Result<()> {
	let field_key = field_key.trim();

	if field_key.is_empty() {
		return Err(Error::InvalidArgument("Schedule field key must be non-empty.".to_string()));
	}

	let table = PgEscaper.ident(&schema.schedule_table);
	let delete_sql =
		format!("DELETE FROM {table} WHERE {ENTITY_ID_COLUMN} = $1 AND {SCHEDULE_FIELD_COLUMN} = $2");
	let insert_sql = format!(
		"\
INSERT INTO {table} ({ENTITY_ID_COLUMN}, {SCHEDULE_FIELD_COLUMN}, {SCHEDULE_START_COLUMN}, {SCHEDULE_END_COLUMN})
VALUES ($1, $2, $3, $4)"
	);
	let mut tx = db.pool.begin().await?;

	sqlx::query(&delete_sql).bind(entity_id).bind(field_key).execute(&mut *tx).await?;

	for interval in intervals {
		sqlx::query(&insert_sql)
			.bind(entity_id)
			.bind(field_key)
			.bind(i32::from(interval.start()))
			.bind(i32::from(interval.end()))
			.execute(&mut *tx)
			.await?;
	}

	tx.commit().await?;

	tracing::debug!(%entity_id, field_key, intervals = intervals.len(), "Schedule replaced.");

	Ok(())
}

#[cfg(test)]
mod tests {
	use serde_json::Value;

	use super::*;

	#[test]
	fn view_counts_use_period_wire_keys() {
		let counts = ViewCounts { all: 120, last_30d: 40, last_7d: 9, last_24h: 1 };
		let value: Value = serde_json::from_str(&counts.to_meta_value()).expect("valid JSON");

		assert_eq!(value["views"]["all"], 120);
		assert_eq!(value["views"]["30d"], 40);
		assert_eq!(value["views"]["7d"], 9);
		assert_eq!(value["views"]["1d"], 1);
	}

	#[test]
	fn votes_map_to_configured_keys() {
		let schema = HostSchema::default();

		assert_eq!(Vote::Helpful.meta_key(&schema), "_sift_helpful_yes");
		assert_eq!(Vote::Unhelpful.meta_key(&schema), "_sift_helpful_no");
	}
}
