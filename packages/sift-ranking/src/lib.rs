//! Ranking strategies that extend a host search query with joins, computed columns, and an order
//! expression.
//!
//! The host resolves a strategy through the [`StrategyRegistry`], builds a [`QueryFragment`] with a
//! per-query [`QueryContext`], and applies it to its own [`QueryBuilder`]. Nothing here performs
//! I/O; enumerated parameters are whitelisted by [`validate`] and free-text values are embedded
//! only through a [`SqlEscaper`].

pub mod context;
pub mod escape;
pub mod fragment;
pub mod registry;
pub mod selection;
pub mod strategy;
pub mod time_window;
pub mod validate;

pub use context::{HostSchema, QueryContext};
pub use escape::{PgEscaper, SqlEscaper};
pub use fragment::{ComputedColumn, QueryBuilder, QueryFragment};
pub use registry::{StrategyDescription, StrategyFactory, StrategyRegistry, StrategyRegistryBuilder};
pub use selection::{ResolvedSort, SortSelection, resolve_preset, resolve_selection};
pub use strategy::{
	FieldChoice, FieldKind, FieldSchema, HelpfulVotesConfig, HelpfulVotesStrategy, OpenNowConfig,
	OpenNowStrategy, RankingStrategy, SortExport, StrategyConfig, StrategyKind, ViewCountConfig,
	ViewCountStrategy,
};
pub use time_window::{TimeContext, WeeklyInterval};
pub use validate::{Choice, Direction, Metric, Period, TimezoneMode};

/// Raw strategy parameters as received from a request or a stored preset.
pub type Params = serde_json::Map<String, serde_json::Value>;
