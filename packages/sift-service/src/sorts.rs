use serde::Serialize;

use crate::SiftService;
use sift_ranking::{Params, SortExport, StrategyDescription, resolve_preset};

/// Everything a front end needs to render sort controls.
#[derive(Clone, Debug, Serialize)]
pub struct SortCatalog {
	pub strategies: Vec<StrategyDescription>,
	pub presets: Vec<PresetDescription>,
	pub default_preset: Option<String>,
}

/// A configured preset and the sort it resolves to.
#[derive(Clone, Debug, Serialize)]
pub struct PresetDescription {
	pub key: String,
	#[serde(flatten)]
	pub sort: SortExport,
}

impl SiftService {
	/// Presets whose type is not registered are left out; resolution logs them.
	pub fn sorts(&self) -> SortCatalog {
		let configured = &self.cfg.ranking.presets;
		let no_overrides = Params::new();
		let presets = configured
			.iter()
			.filter_map(|preset| {
				let sort = resolve_preset(&self.registry, configured, &preset.key, &no_overrides)?;

				Some(PresetDescription { key: preset.key.clone(), sort: sort.export() })
			})
			.collect();

		SortCatalog {
			strategies: self.registry.catalog(),
			presets,
			default_preset: self.cfg.ranking.default_preset.clone(),
		}
	}
}
