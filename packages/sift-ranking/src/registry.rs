//! Key to factory mapping, written once at startup and read-only afterwards.

use std::sync::Arc;

use serde::Serialize;

use crate::{
	Params,
	escape::SqlEscaper,
	strategy::{
		FieldSchema, HelpfulVotesConfig, HelpfulVotesStrategy, OpenNowConfig, OpenNowStrategy,
		RankingStrategy, StrategyKind, ViewCountConfig, ViewCountStrategy,
	},
};

pub type StrategyFactory = Arc<dyn Fn(&Params) -> Box<dyn RankingStrategy> + Send + Sync>;

/// Schema description of one registered strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StrategyDescription {
	pub key: String,
	pub label: String,
	pub fields: Vec<FieldSchema>,
}

#[derive(Default)]
pub struct StrategyRegistryBuilder {
	entries: Vec<(String, StrategyFactory)>,
}
impl StrategyRegistryBuilder {
	/// Re-registering a key replaces its factory in place.
	pub fn register<F>(&mut self, key: &str, factory: F) -> &mut Self
	where
		F: 'static + Fn(&Params) -> Box<dyn RankingStrategy> + Send + Sync,
	{
		let factory: StrategyFactory = Arc::new(factory);

		match self.entries.iter_mut().find(|(existing, _)| existing == key) {
			Some(entry) => entry.1 = factory,
			None => self.entries.push((key.to_string(), factory)),
		}

		self
	}

	pub fn build(self) -> StrategyRegistry {
		StrategyRegistry { entries: self.entries }
	}
}

/// Frozen registry. Shared by reference across requests without locking.
pub struct StrategyRegistry {
	entries: Vec<(String, StrategyFactory)>,
}
impl StrategyRegistry {
	pub fn builder() -> StrategyRegistryBuilder {
		StrategyRegistryBuilder::default()
	}

	/// The three built-in strategies, each handed the same escaper.
	pub fn builtin(escaper: Arc<dyn SqlEscaper>) -> Self {
		let mut builder = Self::builder();

		register_builtin(&mut builder, escaper);

		builder.build()
	}

	pub fn resolve(&self, key: &str, params: &Params) -> Option<Box<dyn RankingStrategy>> {
		self.entries.iter().find(|(existing, _)| existing == key).map(|(_, factory)| factory(params))
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(key, _)| key.as_str())
	}

	pub fn catalog(&self) -> Vec<StrategyDescription> {
		let empty = Params::new();

		self.entries
			.iter()
			.map(|(key, factory)| {
				let strategy = factory(&empty);

				StrategyDescription {
					key: key.clone(),
					label: strategy.label().to_string(),
					fields: strategy.fields(),
				}
			})
			.collect()
	}
}

pub fn register_builtin(builder: &mut StrategyRegistryBuilder, escaper: Arc<dyn SqlEscaper>) {
	for kind in StrategyKind::ALL {
		let escaper = escaper.clone();

		match kind {
			StrategyKind::ViewCount => builder.register(kind.key(), move |params| {
				Box::new(ViewCountStrategy::new(
					ViewCountConfig::from_params(params),
					escaper.clone(),
				))
			}),
			StrategyKind::HelpfulVotes => builder.register(kind.key(), move |params| {
				Box::new(HelpfulVotesStrategy::new(
					HelpfulVotesConfig::from_params(params),
					escaper.clone(),
				))
			}),
			StrategyKind::OpenNow => builder.register(kind.key(), move |params| {
				Box::new(OpenNowStrategy::new(OpenNowConfig::from_params(params), escaper.clone()))
			}),
		};
	}
}
