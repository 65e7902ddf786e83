//! "Open now" ordering over recurring weekly schedules.
//!
//! Schedule rows store inclusive `[start_minute, end_minute]` ranges in minute-of-week form. In
//! site mode the current minute is computed once in the site's timezone and compared against the
//! stored bounds. In entity mode the current minute is computed in UTC and each row's bounds are
//! shifted by that entity's own UTC offset inside the join, since every entity may carry a
//! different timezone while "now" is a single scalar for the whole query. Entity mode relies on
//! the host materializing each entity's IANA timezone name in `e.timezone` at write time.
//!
//! A shifted interval may land partly or wholly outside `[0, 10079]`, so the UTC minute is also
//! tried one week later and one week earlier. Offsets are always under a week, so one step each
//! way covers every shifted bound.

use std::sync::Arc;

use serde::Serialize;

use crate::{
	Params,
	context::{
		ENTITY_ID_COLUMN, ENTITY_TIMEZONE_COLUMN, QueryContext, SCHEDULE_END_COLUMN,
		SCHEDULE_FIELD_COLUMN, SCHEDULE_START_COLUMN,
	},
	escape::SqlEscaper,
	fragment::QueryFragment,
	strategy::{FieldSchema, RankingStrategy, StrategyConfig, StrategyKind},
	time_window::{self, MINUTES_PER_WEEK},
	validate::{Direction, TimezoneMode, normalize_param},
};

pub const OPEN_NOW_ALIAS: &str = "open_now";

const JOIN_ALIAS: &str = "sift_open";
const SCHEDULE_ALIAS: &str = "sift_schedule";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OpenNowConfig {
	pub order: Direction,
	#[serde(rename = "field")]
	pub schedule_field_key: String,
	pub timezone_mode: TimezoneMode,
}
impl OpenNowConfig {
	pub fn from_params(params: &Params) -> Self {
		let schedule_field_key = params
			.get("field")
			.and_then(|value| value.as_str())
			.map(|value| value.trim().to_string())
			.unwrap_or_default();

		Self {
			order: normalize_param(params, "order", Direction::Descending),
			schedule_field_key,
			timezone_mode: normalize_param(params, "timezone_mode", TimezoneMode::Site),
		}
	}
}

pub struct OpenNowStrategy {
	config: OpenNowConfig,
	escaper: Arc<dyn SqlEscaper>,
}
impl OpenNowStrategy {
	pub fn new(config: OpenNowConfig, escaper: Arc<dyn SqlEscaper>) -> Self {
		Self { config, escaper }
	}

	fn schedule_join(&self, ctx: &QueryContext<'_>) -> String {
		let escaper = self.escaper.as_ref();
		let column = |name: &str| format!("{SCHEDULE_ALIAS}.{}", escaper.ident(name));
		let start = column(SCHEDULE_START_COLUMN);
		let end = column(SCHEDULE_END_COLUMN);
		let window = match self.config.timezone_mode {
			TimezoneMode::Site => within(&start, &end, i32::from(ctx.time.site_minute_of_week())),
			TimezoneMode::Entity => {
				let offset = time_window::per_entity_offset_expression(
					&ctx.schema.entity_column(escaper, ENTITY_TIMEZONE_COLUMN),
					ctx.time.now,
				);
				let lower = format!("({start} - {offset})");
				let upper = format!("({end} - {offset})");
				let minute = i32::from(ctx.time.utc_minute_of_week());
				let week = i32::from(MINUTES_PER_WEEK);
				let candidates = [minute, minute + week, minute - week]
					.map(|candidate| format!("({})", within(&lower, &upper, candidate)));

				format!("({})", candidates.join(" OR "))
			},
		};

		format!(
			"LEFT JOIN LATERAL (\
SELECT 1 AS matched FROM {table} AS {SCHEDULE_ALIAS} \
WHERE {id} = {entity_id} AND {field} = {key} AND {window} \
LIMIT 1) AS {JOIN_ALIAS} ON TRUE",
			table = escaper.ident(&ctx.schema.schedule_table),
			id = column(ENTITY_ID_COLUMN),
			entity_id = ctx.schema.entity_column(escaper, ENTITY_ID_COLUMN),
			field = column(SCHEDULE_FIELD_COLUMN),
			key = escaper.literal(&self.config.schedule_field_key),
		)
	}
}
impl RankingStrategy for OpenNowStrategy {
	fn kind(&self) -> StrategyKind {
		StrategyKind::OpenNow
	}

	fn config(&self) -> StrategyConfig {
		StrategyConfig::OpenNow(self.config.clone())
	}

	fn fields(&self) -> Vec<FieldSchema> {
		vec![
			FieldSchema::text("field", "Business hours field"),
			FieldSchema::choice::<TimezoneMode>("timezone_mode", "Timezone"),
			FieldSchema::choice::<Direction>("order", "Order"),
		]
	}

	fn build_query_fragment(&self, ctx: &QueryContext<'_>) -> QueryFragment {
		let mut fragment = QueryFragment::new(self.config.order);

		if self.config.schedule_field_key.is_empty() {
			tracing::debug!("Open-now sort has no schedule field; keeping host order.");

			return fragment;
		}

		fragment.push_join(self.schedule_join(ctx));
		fragment.push_select(
			OPEN_NOW_ALIAS,
			format!("CASE WHEN {JOIN_ALIAS}.matched IS NULL THEN 0 ELSE 1 END"),
		);
		fragment.set_order(OPEN_NOW_ALIAS.to_string());

		fragment
	}
}

/// Inclusive `lower <= minute <= upper`.
fn within(lower: &str, upper: &str, minute: i32) -> String {
	format!("{lower} <= {minute} AND {upper} >= {minute}")
}
