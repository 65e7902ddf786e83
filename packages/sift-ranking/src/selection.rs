use serde::Deserialize;

use crate::{
	Params,
	registry::StrategyRegistry,
	strategy::{RankingStrategy, SortExport},
};
use sift_config::RankingPreset;

/// The sort a request asks for: a stored preset, an ad-hoc strategy type, or neither.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SortSelection {
	#[serde(default)]
	pub preset: Option<String>,
	#[serde(default)]
	pub r#type: Option<String>,
	#[serde(default)]
	pub params: Params,
}

pub struct ResolvedSort {
	pub key: String,
	pub label: String,
	pub strategy: Box<dyn RankingStrategy>,
}
impl ResolvedSort {
	pub fn export(&self) -> SortExport {
		SortExport { r#type: self.key.clone(), ..self.strategy.export(&self.label) }
	}
}

/// Resolves a selection to a strategy instance.
///
/// A preset wins over an ad-hoc type, and request params override preset params key by key.
/// Without either, the configured default preset applies. Unknown presets or types are logged
/// and resolve to `None` so the host keeps its own ordering.
pub fn resolve_selection(
	registry: &StrategyRegistry,
	presets: &[RankingPreset],
	default_preset: Option<&str>,
	selection: &SortSelection,
) -> Option<ResolvedSort> {
	let preset_key = selection.preset.as_deref().filter(|key| !key.is_empty());
	let type_key = selection.r#type.as_deref().filter(|key| !key.is_empty());

	if let Some(preset_key) = preset_key {
		return resolve_preset(registry, presets, preset_key, &selection.params);
	}
	if let Some(type_key) = type_key {
		let Some(strategy) = registry.resolve(type_key, &selection.params) else {
			tracing::warn!(sort_type = type_key, "Unknown sort type; keeping host order.");

			return None;
		};

		return Some(ResolvedSort {
			key: type_key.to_string(),
			label: strategy.label().to_string(),
			strategy,
		});
	}

	default_preset.and_then(|key| resolve_preset(registry, presets, key, &selection.params))
}

pub fn resolve_preset(
	registry: &StrategyRegistry,
	presets: &[RankingPreset],
	preset_key: &str,
	overrides: &Params,
) -> Option<ResolvedSort> {
	let Some(preset) = presets.iter().find(|preset| preset.key == preset_key) else {
		tracing::warn!(preset = preset_key, "Unknown sort preset; keeping host order.");

		return None;
	};
	let mut params = preset.params.clone();

	for (name, value) in overrides {
		params.insert(name.clone(), value.clone());
	}

	let Some(strategy) = registry.resolve(&preset.r#type, &params) else {
		tracing::warn!(
			preset = preset_key,
			sort_type = preset.r#type.as_str(),
			"Sort preset names an unknown strategy type; keeping host order."
		);

		return None;
	};

	Some(ResolvedSort { key: preset.r#type.clone(), label: preset.label.clone(), strategy })
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::json;

	use super::*;
	use crate::escape::PgEscaper;

	fn preset(key: &str, label: &str, r#type: &str, params: serde_json::Value) -> RankingPreset {
		RankingPreset {
			key: key.to_string(),
			label: label.to_string(),
			r#type: r#type.to_string(),
			params: params.as_object().cloned().unwrap_or_default(),
		}
	}

	fn presets() -> Vec<RankingPreset> {
		vec![
			preset("popular", "Most viewed", "view-count", json!({ "period": "30d" })),
			preset("broken", "Broken", "does-not-exist", json!({})),
		]
	}

	fn selection(value: serde_json::Value) -> SortSelection {
		serde_json::from_value(value).expect("selection deserializes")
	}

	#[test]
	fn preset_params_are_overridden_by_request_params() {
		let registry = StrategyRegistry::builtin(Arc::new(PgEscaper));
		let resolved = resolve_selection(
			&registry,
			&presets(),
			None,
			&selection(json!({ "preset": "popular", "params": { "order": "ASC" } })),
		)
		.expect("preset resolves");
		let export = serde_json::to_value(resolved.export()).expect("export serializes");

		assert_eq!(
			export,
			json!({ "label": "Most viewed", "type": "view-count", "order": "ASC", "period": "30d" })
		);
	}

	#[test]
	fn preset_wins_over_type() {
		let registry = StrategyRegistry::builtin(Arc::new(PgEscaper));
		let resolved = resolve_selection(
			&registry,
			&presets(),
			None,
			&selection(json!({ "preset": "popular", "type": "open-now" })),
		)
		.expect("preset resolves");

		assert_eq!(resolved.key, "view-count");
	}

	#[test]
	fn ad_hoc_type_uses_strategy_label() {
		let registry = StrategyRegistry::builtin(Arc::new(PgEscaper));
		let resolved = resolve_selection(
			&registry,
			&[],
			None,
			&selection(json!({ "type": "helpful-votes", "params": { "sort_type": "total" } })),
		)
		.expect("type resolves");
		let export = serde_json::to_value(resolved.export()).expect("export serializes");

		assert_eq!(
			export,
			json!({ "label": "Most helpful", "type": "helpful-votes", "order": "DESC", "sort_type": "total" })
		);
	}

	#[test]
	fn unknown_sorts_degrade_to_none() {
		let registry = StrategyRegistry::builtin(Arc::new(PgEscaper));

		for value in [
			json!({ "preset": "missing" }),
			json!({ "preset": "broken" }),
			json!({ "type": "random" }),
			json!({}),
		] {
			assert!(resolve_selection(&registry, &presets(), None, &selection(value)).is_none());
		}
	}

	#[test]
	fn default_preset_applies_when_nothing_is_selected() {
		let registry = StrategyRegistry::builtin(Arc::new(PgEscaper));
		let resolved =
			resolve_selection(&registry, &presets(), Some("popular"), &SortSelection::default())
				.expect("default preset resolves");

		assert_eq!(resolved.label, "Most viewed");
	}

	#[test]
	fn exports_never_contain_sql() {
		let registry = StrategyRegistry::builtin(Arc::new(PgEscaper));
		let resolved = resolve_selection(
			&registry,
			&[],
			None,
			&selection(json!({ "type": "open-now", "params": { "field": "hours" } })),
		)
		.expect("type resolves");
		let export = serde_json::to_value(resolved.export()).expect("export serializes");

		assert_eq!(
			export,
			json!({ "label": "Open now", "type": "open-now", "order": "DESC", "field": "hours", "timezone_mode": "site" })
		);
	}
}
