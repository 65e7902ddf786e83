use std::sync::Arc;

use serde::Serialize;

use crate::{
	Params,
	context::{META_VALUE_COLUMN, QueryContext},
	escape::SqlEscaper,
	fragment::QueryFragment,
	strategy::{FieldSchema, RankingStrategy, StrategyConfig, StrategyKind, meta_join},
	validate::{Choice, Direction, Period, normalize_param},
};

pub const VIEW_COUNT_ALIAS: &str = "view_count";

const JOIN_ALIAS: &str = "sift_views";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ViewCountConfig {
	pub order: Direction,
	pub period: Period,
}
impl ViewCountConfig {
	pub fn from_params(params: &Params) -> Self {
		Self {
			order: normalize_param(params, "order", Direction::Descending),
			period: normalize_param(params, "period", Period::All),
		}
	}
}

/// Orders by a windowed view counter kept as `{"views": {"all": N, "30d": N, "7d": N, "1d": N}}`.
pub struct ViewCountStrategy {
	config: ViewCountConfig,
	escaper: Arc<dyn SqlEscaper>,
}
impl ViewCountStrategy {
	pub fn new(config: ViewCountConfig, escaper: Arc<dyn SqlEscaper>) -> Self {
		Self { config, escaper }
	}

	/// Non-negative count at `views.<period>`; anything absent, null, or non-numeric reads as 0.
	fn count_expression(&self) -> String {
		let value = format!("{JOIN_ALIAS}.{}", self.escaper.ident(META_VALUE_COLUMN));
		let path = self.escaper.literal(&format!("{{views,{}}}", self.config.period.as_str()));
		let extracted = format!("({value}::jsonb #>> {path})");

		format!(
			"CASE WHEN {value} IS NULL THEN 0 \
WHEN pg_input_is_valid({value}, 'jsonb') THEN \
CASE WHEN {extracted} ~ '^[0-9]{{1,18}}$' THEN {extracted}::bigint ELSE 0 END \
ELSE 0 END"
		)
	}
}
impl RankingStrategy for ViewCountStrategy {
	fn kind(&self) -> StrategyKind {
		StrategyKind::ViewCount
	}

	fn config(&self) -> StrategyConfig {
		StrategyConfig::ViewCount(self.config)
	}

	fn fields(&self) -> Vec<FieldSchema> {
		vec![
			FieldSchema::choice::<Period>("period", "Period"),
			FieldSchema::choice::<Direction>("order", "Order"),
		]
	}

	fn build_query_fragment(&self, ctx: &QueryContext<'_>) -> QueryFragment {
		let mut fragment = QueryFragment::new(self.config.order);

		fragment.push_join(meta_join(
			self.escaper.as_ref(),
			ctx.schema,
			JOIN_ALIAS,
			&ctx.schema.views_key,
		));
		fragment.push_select(VIEW_COUNT_ALIAS, self.count_expression());
		fragment.set_order(VIEW_COUNT_ALIAS.to_string());

		fragment
	}
}
