use std::sync::Arc;

use serde::Serialize;

use crate::{
	Params,
	context::{META_VALUE_COLUMN, QueryContext},
	escape::SqlEscaper,
	fragment::QueryFragment,
	strategy::{FieldSchema, RankingStrategy, StrategyConfig, StrategyKind, meta_join, text_count},
	validate::{Direction, Metric, normalize_param},
};

const YES_ALIAS: &str = "sift_votes_yes";
const NO_ALIAS: &str = "sift_votes_no";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HelpfulVotesConfig {
	pub order: Direction,
	#[serde(rename = "sort_type")]
	pub metric: Metric,
}
impl HelpfulVotesConfig {
	pub fn from_params(params: &Params) -> Self {
		Self {
			order: normalize_param(params, "order", Direction::Descending),
			metric: normalize_param(params, "sort_type", Metric::Helpful),
		}
	}
}

/// Orders by helpful/unhelpful vote counters.
///
/// The "no" counter is joined only when the metric reads it.
pub struct HelpfulVotesStrategy {
	config: HelpfulVotesConfig,
	escaper: Arc<dyn SqlEscaper>,
}
impl HelpfulVotesStrategy {
	pub fn new(config: HelpfulVotesConfig, escaper: Arc<dyn SqlEscaper>) -> Self {
		Self { config, escaper }
	}

	fn count(&self, alias: &str) -> String {
		text_count(&format!("{alias}.{}", self.escaper.ident(META_VALUE_COLUMN)))
	}
}
impl RankingStrategy for HelpfulVotesStrategy {
	fn kind(&self) -> StrategyKind {
		StrategyKind::HelpfulVotes
	}

	fn config(&self) -> StrategyConfig {
		StrategyConfig::HelpfulVotes(self.config)
	}

	fn fields(&self) -> Vec<FieldSchema> {
		vec![
			FieldSchema::choice::<Metric>("sort_type", "Sort by"),
			FieldSchema::choice::<Direction>("order", "Order"),
		]
	}

	fn build_query_fragment(&self, ctx: &QueryContext<'_>) -> QueryFragment {
		let escaper = self.escaper.as_ref();
		let mut fragment = QueryFragment::new(self.config.order);

		fragment.push_join(meta_join(escaper, ctx.schema, YES_ALIAS, &ctx.schema.helpful_yes_key));

		if matches!(self.config.metric, Metric::Disputed | Metric::Total) {
			fragment.push_join(meta_join(escaper, ctx.schema, NO_ALIAS, &ctx.schema.helpful_no_key));
		}

		let order = match self.config.metric {
			Metric::Helpful => self.count(YES_ALIAS),
			Metric::Disputed => self.count(NO_ALIAS),
			Metric::Total => format!("({} + {})", self.count(YES_ALIAS), self.count(NO_ALIAS)),
		};

		fragment.set_order(order);

		fragment
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use time::{UtcOffset, macros::datetime};

	use super::*;
	use crate::{context::HostSchema, escape::PgEscaper, time_window::TimeContext};

	fn build(params: serde_json::Value) -> QueryFragment {
		let params = params.as_object().cloned().unwrap_or_default();
		let strategy = HelpfulVotesStrategy::new(
			HelpfulVotesConfig::from_params(&params),
			Arc::new(PgEscaper),
		);
		let schema = HostSchema::default();
		let ctx = QueryContext::new(
			&schema,
			TimeContext::new(datetime!(2024-01-01 12:00 UTC), UtcOffset::UTC),
		);

		strategy.build_query_fragment(&ctx)
	}

	fn mentions_no_counter(fragment: &QueryFragment) -> bool {
		fragment.joins().iter().any(|join| join.contains(NO_ALIAS) || join.contains("_sift_helpful_no"))
	}

	#[test]
	fn helpful_never_joins_the_no_counter() {
		for params in [json!({}), json!({ "sort_type": "helpful" }), json!({ "sort_type": "bogus" })]
		{
			let fragment = build(params);

			assert_eq!(fragment.joins().len(), 1);
			assert!(!mentions_no_counter(&fragment));
			assert!(!fragment.order_expression().unwrap_or_default().contains(NO_ALIAS));
		}
	}

	#[test]
	fn disputed_and_total_join_both_counters() {
		for metric in ["disputed", "total"] {
			let fragment = build(json!({ "sort_type": metric }));

			assert_eq!(fragment.joins().len(), 2);
			assert!(fragment.joins()[0].contains("'_sift_helpful_yes'"));
			assert!(mentions_no_counter(&fragment));
		}
	}

	#[test]
	fn total_sums_independently_defaulted_counts() {
		let fragment = build(json!({ "sort_type": "total" }));
		let yes = text_count("sift_votes_yes.\"meta_value\"");
		let no = text_count("sift_votes_no.\"meta_value\"");

		assert_eq!(fragment.order_expression(), Some(format!("({yes} + {no})").as_str()));
		assert!(yes.starts_with("COALESCE("));
		assert!(yes.ends_with(", 0)"));
	}

	#[test]
	fn no_computed_columns_are_selected() {
		assert!(build(json!({ "sort_type": "total" })).selects().is_empty());
	}
}
