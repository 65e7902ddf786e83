use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, SiftService};
use sift_config::Ranking;
use sift_ranking::{
	Direction, QueryContext, QueryFragment, SortExport, SortSelection, TimeContext,
	resolve_selection,
};
use sift_storage::search::{self, RankedEntity, SearchFilter};

const MAX_QUERY_CHARS: usize = 256;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchRequest {
	#[serde(default)]
	pub q: Option<String>,
	#[serde(default)]
	pub sort: SortSelection,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub offset: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchItem {
	pub entity_id: Uuid,
	pub title: String,
	pub metrics: BTreeMap<String, i64>,
}
impl From<RankedEntity> for SearchItem {
	fn from(entity: RankedEntity) -> Self {
		Self { entity_id: entity.entity_id, title: entity.title, metrics: entity.metrics }
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub items: Vec<SearchItem>,
	/// The sort that was applied, or `None` when the host default order was used.
	pub sort: Option<SortExport>,
}

impl SiftService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let text = normalize_query(req.q.as_deref())?;
		let filter = SearchFilter {
			text,
			limit: i64::from(effective_limit(&self.cfg.ranking, req.limit)),
			offset: i64::from(req.offset.unwrap_or(0)),
		};
		let resolved = resolve_selection(
			&self.registry,
			&self.cfg.ranking.presets,
			self.cfg.ranking.default_preset.as_deref(),
			&req.sort,
		);
		let time = TimeContext::new(OffsetDateTime::now_utc(), self.site_offset());
		let fragment = match &resolved {
			Some(sort) => sort.strategy.build_query_fragment(&QueryContext::new(&self.schema, time)),
			None => QueryFragment::new(Direction::default()),
		};
		let order = fragment.order_clause();

		tracing::debug!(
			sort_type = resolved.as_ref().map(|sort| sort.key.as_str()),
			joins = fragment.joins().len(),
			selects = fragment.selects().len(),
			order = order.as_deref(),
			"Ranking fragment composed."
		);

		let items = search::search_entities(
			&self.db,
			&self.schema,
			self.escaper.as_ref(),
			&fragment,
			&filter,
		)
		.await?;

		Ok(SearchResponse {
			items: items.into_iter().map(SearchItem::from).collect(),
			sort: resolved.map(|sort| sort.export()),
		})
	}
}

/// Requested page size, defaulting to `default_limit` and clamped to `[1, max_limit]`.
pub fn effective_limit(ranking: &Ranking, requested: Option<u32>) -> u32 {
	requested.unwrap_or(ranking.default_limit).clamp(1, ranking.max_limit.max(1))
}

fn normalize_query(q: Option<&str>) -> Result<Option<String>> {
	let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) else {
		return Ok(None);
	};

	if q.chars().count() > MAX_QUERY_CHARS {
		return Err(Error::InvalidRequest {
			message: format!("q must be at most {MAX_QUERY_CHARS} characters."),
		});
	}

	Ok(Some(q.to_string()))
}
