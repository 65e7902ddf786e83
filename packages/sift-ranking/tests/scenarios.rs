use std::sync::Arc;

use serde_json::{Value, json};
use time::{UtcOffset, macros::datetime};

use sift_ranking::{
	Direction, HostSchema, PgEscaper, QueryBuilder, QueryContext, RankingStrategy, SortSelection,
	StrategyRegistry, TimeContext, WeeklyInterval, resolve_selection,
};

#[derive(Default)]
struct RecordingQuery {
	joins: Vec<String>,
	selects: Vec<String>,
	orders: Vec<String>,
}
impl QueryBuilder for RecordingQuery {
	fn join(&mut self, clause: &str) {
		self.joins.push(clause.to_string());
	}

	fn select(&mut self, aliased_expression: &str) {
		self.selects.push(aliased_expression.to_string());
	}

	fn order_by(&mut self, expression: &str) {
		self.orders.push(expression.to_string());
	}
}

fn registry() -> StrategyRegistry {
	StrategyRegistry::builtin(Arc::new(PgEscaper))
}

fn build(config: Value, time: TimeContext) -> RecordingQuery {
	let selection: SortSelection = serde_json::from_value(config).expect("selection deserializes");
	let registry = registry();
	let resolved =
		resolve_selection(&registry, &[], None, &selection).expect("strategy type resolves");
	let schema = HostSchema::default();
	let fragment = resolved.strategy.build_query_fragment(&QueryContext::new(&schema, time));
	let mut query = RecordingQuery::default();

	fragment.apply(&mut query);

	query
}

fn monday_noon_utc() -> TimeContext {
	TimeContext::new(datetime!(2024-01-01 12:00 UTC), UtcOffset::UTC)
}

#[test]
fn view_count_seven_day_ascending() {
	let query = build(
		json!({ "type": "view-count", "params": { "period": "7d", "order": "ASC" } }),
		monday_noon_utc(),
	);

	assert_eq!(query.joins.len(), 1);
	assert!(query.joins[0].starts_with("LEFT JOIN \"entity_meta\" AS sift_views"));
	assert_eq!(query.selects.len(), 1);
	assert!(query.selects[0].contains("#>> '{views,7d}'"));
	assert!(query.selects[0].ends_with("ELSE 0 END ELSE 0 END AS view_count"));
	assert_eq!(query.orders, ["view_count ASC"]);
}

#[test]
fn view_count_invalid_period_behaves_like_all() {
	let invalid = build(
		json!({ "type": "view-count", "params": { "period": "90d" } }),
		monday_noon_utc(),
	);
	let all =
		build(json!({ "type": "view-count", "params": { "period": "all" } }), monday_noon_utc());

	assert_eq!(invalid.joins, all.joins);
	assert_eq!(invalid.selects, all.selects);
	assert_eq!(invalid.orders, all.orders);
}

#[test]
fn helpful_votes_disputed_ascending() {
	let query = build(
		json!({ "type": "helpful-votes", "params": { "sort_type": "disputed", "order": "ASC" } }),
		monday_noon_utc(),
	);

	assert_eq!(query.joins.len(), 2);
	assert!(query.joins[0].contains("'_sift_helpful_yes'"));
	assert!(query.joins[1].contains("'_sift_helpful_no'"));
	assert!(query.selects.is_empty());
	assert_eq!(
		query.orders,
		[
			"COALESCE(CASE WHEN btrim(sift_votes_no.\"meta_value\") ~ '^-?[0-9]{1,18}$' \
THEN btrim(sift_votes_no.\"meta_value\")::bigint END, 0) ASC"
		]
	);
}

#[test]
fn open_now_site_mode_at_minute_720() {
	// 10:00 UTC on Monday is minute 720 at +02:00.
	let time = TimeContext::new(
		datetime!(2024-01-01 10:00 UTC),
		UtcOffset::from_hms(2, 0, 0).expect("valid offset"),
	);
	let query = build(
		json!({
			"type": "open-now",
			"params": { "field": "hours", "timezone_mode": "site", "order": "DESC" }
		}),
		time,
	);

	assert_eq!(query.joins.len(), 1);
	assert!(query.joins[0].contains("\"start_minute\" <= 720"));
	assert!(query.joins[0].contains("\"end_minute\" >= 720"));
	assert_eq!(query.selects, ["CASE WHEN sift_open.matched IS NULL THEN 0 ELSE 1 END AS open_now"]);
	assert_eq!(query.orders, ["open_now DESC"]);

	// The row [700, 800] matches at 720; an entity without rows gets no lateral match.
	let row = WeeklyInterval::new(700, 800).expect("valid interval");

	assert!(row.contains(time.site_minute_of_week()));
}

#[test]
fn open_now_boundaries_are_inclusive() {
	let row = WeeklyInterval::new(700, 800).expect("valid interval");

	for (minute, expected) in [(699, false), (700, true), (800, true), (801, false)] {
		assert_eq!(row.contains(minute), expected, "minute = {minute}");

		// Mon 00:00 UTC plus `minute` minutes, evaluated in site mode at UTC.
		let time = TimeContext::new(
			datetime!(2024-01-01 0:00 UTC) + time::Duration::minutes(i64::from(minute)),
			UtcOffset::UTC,
		);
		let query = build(
			json!({ "type": "open-now", "params": { "field": "hours" } }),
			time,
		);

		assert!(query.joins[0].contains(&format!("<= {minute} AND ")));
	}
}

#[test]
fn open_now_without_field_leaves_host_order() {
	let query = build(json!({ "type": "open-now", "params": { "field": "" } }), monday_noon_utc());

	assert!(query.joins.is_empty());
	assert!(query.selects.is_empty());
	assert!(query.orders.is_empty());
}

#[test]
fn default_direction_is_descending() {
	let registry = registry();
	let strategy = registry.resolve("helpful-votes", &Default::default()).expect("builtin");

	assert_eq!(strategy.config().order(), Direction::Descending);
}
