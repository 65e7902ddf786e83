//! Host-side query assembly and execution for ranked entity listings.

use std::collections::BTreeMap;

use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Result, db::Db};
use sift_ranking::{
	HostSchema, QueryBuilder, QueryFragment, SqlEscaper,
	context::{ENTITY_ALIAS, ENTITY_ID_COLUMN},
};

#[derive(Clone, Debug, Default)]
pub struct SearchFilter {
	/// Case-insensitive substring match on the title.
	pub text: Option<String>,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedEntity {
	pub entity_id: Uuid,
	pub title: String,
	/// Computed columns contributed by the active strategy, keyed by alias.
	pub metrics: BTreeMap<String, i64>,
}

/// Append-only SELECT over the host's entity table.
///
/// Strategy order clauses come first; creation time and identity break ties so paging is stable.
pub struct HostQuery {
	from: String,
	columns: Vec<String>,
	joins: Vec<String>,
	orders: Vec<String>,
	created_at: String,
	entity_id: String,
	title: String,
}
impl HostQuery {
	pub fn new(schema: &HostSchema, escaper: &dyn SqlEscaper) -> Self {
		let entity_id = schema.entity_column(escaper, ENTITY_ID_COLUMN);
		let title = schema.entity_column(escaper, "title");

		Self {
			from: format!("{} AS {}", escaper.ident(&schema.entity_table), escaper.ident(ENTITY_ALIAS)),
			columns: vec![entity_id.clone(), title.clone()],
			joins: Vec::new(),
			orders: Vec::new(),
			created_at: schema.entity_column(escaper, "created_at"),
			entity_id,
			title,
		}
	}

	/// Renders the statement. Bind order: title pattern (when filtered), limit, offset.
	pub fn to_sql(&self, filtered: bool) -> String {
		let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.from);

		for join in &self.joins {
			sql.push(' ');
			sql.push_str(join);
		}

		let mut next_param = 1;

		if filtered {
			sql.push_str(&format!(" WHERE {} ILIKE $1", self.title));

			next_param += 1;
		}

		let mut orders = self.orders.clone();

		orders.push(format!("{} DESC", self.created_at));
		orders.push(self.entity_id.clone());

		sql.push_str(&format!(
			" ORDER BY {} LIMIT ${} OFFSET ${}",
			orders.join(", "),
			next_param,
			next_param + 1
		));

		sql
	}
}
impl QueryBuilder for HostQuery {
	fn join(&mut self, clause: &str) {
		self.joins.push(clause.to_string());
	}

	fn select(&mut self, aliased_expression: &str) {
		self.columns.push(aliased_expression.to_string());
	}

	fn order_by(&mut self, expression: &str) {
		self.orders.push(expression.to_string());
	}
}

/// Runs the host query with `fragment` applied.
///
/// `escaper` must be the one the fragment's strategy was built with, so that host and strategy
/// identifiers quote the same way.
pub async fn search_entities(
	db: &Db,
	schema: &HostSchema,
	escaper: &dyn SqlEscaper,
	fragment: &QueryFragment,
	filter: &SearchFilter,
) -> Result<Vec<RankedEntity>> {
	let mut query = HostQuery::new(schema, escaper);

	fragment.apply(&mut query);

	let pattern = filter.text.as_deref().map(|text| format!("%{}%", escape_like(text)));
	let sql = query.to_sql(pattern.is_some());

	tracing::debug!(%sql, "Executing ranked entity search.");

	let mut statement = sqlx::query(&sql);

	if let Some(pattern) = pattern {
		statement = statement.bind(pattern);
	}

	let rows = statement.bind(filter.limit).bind(filter.offset).fetch_all(&db.pool).await?;
	let aliases: Vec<&str> = fragment.selects().iter().map(|column| column.alias.as_str()).collect();

	rows.iter().map(|row| ranked_entity(row, &aliases)).collect()
}

fn ranked_entity(row: &PgRow, aliases: &[&str]) -> Result<RankedEntity> {
	let mut metrics = BTreeMap::new();

	for alias in aliases {
		// Strategies may emit either int4 or int8 expressions.
		let value = row
			.try_get::<i64, _>(*alias)
			.or_else(|_| row.try_get::<i32, _>(*alias).map(i64::from))?;

		metrics.insert((*alias).to_string(), value);
	}

	Ok(RankedEntity {
		entity_id: row.try_get(ENTITY_ID_COLUMN)?,
		title: row.try_get("title")?,
		metrics,
	})
}

fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::json;
	use time::{UtcOffset, macros::datetime};

	use super::*;
	use sift_ranking::{PgEscaper, QueryContext, StrategyRegistry, TimeContext};

	struct Backticks;
	impl SqlEscaper for Backticks {
		fn ident(&self, raw: &str) -> String {
			format!("`{raw}`")
		}

		fn literal(&self, raw: &str) -> String {
			format!("'{raw}'")
		}
	}

	#[test]
	fn plain_query_orders_by_recency_then_identity() {
		let query = HostQuery::new(&HostSchema::default(), &PgEscaper);

		assert_eq!(
			query.to_sql(false),
			"SELECT \"e\".\"entity_id\", \"e\".\"title\" FROM \"entities\" AS \"e\" \
ORDER BY \"e\".\"created_at\" DESC, \"e\".\"entity_id\" LIMIT $1 OFFSET $2"
		);
	}

	#[test]
	fn fragment_clauses_precede_host_defaults() {
		let schema = HostSchema::default();
		let registry = StrategyRegistry::builtin(Arc::new(PgEscaper));
		let params = json!({ "period": "7d", "order": "ASC" });
		let strategy = registry
			.resolve("view-count", params.as_object().expect("object"))
			.expect("builtin");
		let ctx = QueryContext::new(
			&schema,
			TimeContext::new(datetime!(2024-01-01 12:00 UTC), UtcOffset::UTC),
		);
		let mut query = HostQuery::new(&schema, &PgEscaper);

		strategy.build_query_fragment(&ctx).apply(&mut query);

		let sql = query.to_sql(true);

		assert!(sql.contains(" AS view_count FROM \"entities\" AS \"e\" LEFT JOIN \"entity_meta\""));
		assert!(sql.contains(" WHERE \"e\".\"title\" ILIKE $1 ORDER BY view_count ASC, "));
		assert!(sql.ends_with("LIMIT $2 OFFSET $3"));
	}

	#[test]
	fn host_identifiers_use_the_given_escaper() {
		let query = HostQuery::new(&HostSchema::default(), &Backticks);
		let sql = query.to_sql(true);

		assert!(sql.starts_with("SELECT `e`.`entity_id`, `e`.`title` FROM `entities` AS `e` "));
		assert!(sql.contains(" WHERE `e`.`title` ILIKE $1 "));
		assert!(!sql.contains('"'));
	}

	#[test]
	fn like_wildcards_are_escaped() {
		assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
	}
}
