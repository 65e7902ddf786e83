mod helpful_votes;
mod open_now;
mod view_count;

pub use helpful_votes::{HelpfulVotesConfig, HelpfulVotesStrategy};
pub use open_now::{OPEN_NOW_ALIAS, OpenNowConfig, OpenNowStrategy};
pub use view_count::{VIEW_COUNT_ALIAS, ViewCountConfig, ViewCountStrategy};

use serde::Serialize;

use crate::{
	Params,
	context::{ENTITY_ID_COLUMN, HostSchema, META_KEY_COLUMN, QueryContext},
	escape::SqlEscaper,
	fragment::QueryFragment,
	validate::{Choice, Direction},
};

/// A ranking algorithm that turns validated configuration into a [`QueryFragment`].
///
/// Implementations hold nothing but their configuration and an escaper, so one instance may be
/// shared across threads.
pub trait RankingStrategy
where
	Self: Send + Sync,
{
	fn kind(&self) -> StrategyKind;

	fn config(&self) -> StrategyConfig;

	fn fields(&self) -> Vec<FieldSchema>;

	fn build_query_fragment(&self, ctx: &QueryContext<'_>) -> QueryFragment;

	fn label(&self) -> &'static str {
		self.kind().label()
	}

	fn export(&self, label: &str) -> SortExport {
		SortExport {
			label: label.to_string(),
			r#type: self.kind().key().to_string(),
			config: self.config(),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
	ViewCount,
	HelpfulVotes,
	OpenNow,
}
impl StrategyKind {
	pub const ALL: [Self; 3] = [Self::ViewCount, Self::HelpfulVotes, Self::OpenNow];

	pub fn key(self) -> &'static str {
		match self {
			Self::ViewCount => "view-count",
			Self::HelpfulVotes => "helpful-votes",
			Self::OpenNow => "open-now",
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::ViewCount => "Most viewed",
			Self::HelpfulVotes => "Most helpful",
			Self::OpenNow => "Open now",
		}
	}

	pub fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.key() == key)
	}
}

/// Validated configuration for one strategy, serialized flat for export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StrategyConfig {
	ViewCount(ViewCountConfig),
	HelpfulVotes(HelpfulVotesConfig),
	OpenNow(OpenNowConfig),
}
impl StrategyConfig {
	pub fn from_params(kind: StrategyKind, params: &Params) -> Self {
		match kind {
			StrategyKind::ViewCount => Self::ViewCount(ViewCountConfig::from_params(params)),
			StrategyKind::HelpfulVotes =>
				Self::HelpfulVotes(HelpfulVotesConfig::from_params(params)),
			StrategyKind::OpenNow => Self::OpenNow(OpenNowConfig::from_params(params)),
		}
	}

	pub fn kind(&self) -> StrategyKind {
		match self {
			Self::ViewCount(_) => StrategyKind::ViewCount,
			Self::HelpfulVotes(_) => StrategyKind::HelpfulVotes,
			Self::OpenNow(_) => StrategyKind::OpenNow,
		}
	}

	pub fn order(&self) -> Direction {
		match self {
			Self::ViewCount(config) => config.order,
			Self::HelpfulVotes(config) => config.order,
			Self::OpenNow(config) => config.order,
		}
	}
}

/// Flat description of the active sort for front-end consumers. Never carries SQL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortExport {
	pub label: String,
	pub r#type: String,
	#[serde(flatten)]
	pub config: StrategyConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
	Enum,
	Text,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldChoice {
	pub value: &'static str,
	pub label: &'static str,
}

/// One editable strategy parameter, as shown by an admin configuration surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
	pub field: &'static str,
	pub label: &'static str,
	pub kind: FieldKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub choices: Option<Vec<FieldChoice>>,
}
impl FieldSchema {
	pub fn choice<T>(field: &'static str, label: &'static str) -> Self
	where
		T: Choice,
	{
		let choices = T::ALL
			.iter()
			.map(|choice| FieldChoice { value: choice.as_str(), label: choice.label() })
			.collect();

		Self { field, label, kind: FieldKind::Enum, choices: Some(choices) }
	}

	pub fn text(field: &'static str, label: &'static str) -> Self {
		Self { field, label, kind: FieldKind::Text, choices: None }
	}
}

/// `LEFT JOIN <meta> AS <alias>` on entity identity and one counter key.
fn meta_join(escaper: &dyn SqlEscaper, schema: &HostSchema, alias: &str, key: &str) -> String {
	format!(
		"LEFT JOIN {table} AS {alias} ON {alias}.{id} = {entity_id} AND {alias}.{meta_key} = {key}",
		table = escaper.ident(&schema.meta_table),
		id = escaper.ident(ENTITY_ID_COLUMN),
		entity_id = schema.entity_column(escaper, ENTITY_ID_COLUMN),
		meta_key = escaper.ident(META_KEY_COLUMN),
		key = escaper.literal(key),
	)
}

/// Signed integer stored as text; NULL, blank, and non-numeric read as 0.
fn text_count(column: &str) -> String {
	format!("COALESCE(CASE WHEN btrim({column}) ~ '^-?[0-9]{{1,18}}$' THEN btrim({column})::bigint END, 0)")
}
