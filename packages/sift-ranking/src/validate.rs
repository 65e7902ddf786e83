//! Whitelisting of enumerated strategy parameters.
//!
//! Every enumerated value that ends up inside a fragment string passes through [`normalize`]
//! first. Anything that is not an exact, case-sensitive match for a declared variant collapses to
//! the caller's default without reporting an error.

use serde::Serialize;
use serde_json::Value;

use crate::Params;

/// A closed set of wire values.
pub trait Choice
where
	Self: 'static + Copy + Eq,
{
	const ALL: &'static [Self];

	fn as_str(self) -> &'static str;

	fn label(self) -> &'static str;
}

pub fn normalize<T>(raw: Option<&str>, default: T) -> T
where
	T: Choice,
{
	let Some(raw) = raw else {
		return default;
	};

	T::ALL.iter().copied().find(|choice| choice.as_str() == raw).unwrap_or(default)
}

/// Non-string JSON values count as invalid input.
pub fn normalize_value<T>(raw: Option<&Value>, default: T) -> T
where
	T: Choice,
{
	normalize(raw.and_then(Value::as_str), default)
}

pub fn normalize_param<T>(params: &Params, name: &str, default: T) -> T
where
	T: Choice,
{
	normalize_value(params.get(name), default)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Direction {
	#[serde(rename = "ASC")]
	Ascending,
	#[default]
	#[serde(rename = "DESC")]
	Descending,
}
impl Choice for Direction {
	const ALL: &'static [Self] = &[Self::Ascending, Self::Descending];

	fn as_str(self) -> &'static str {
		match self {
			Self::Ascending => "ASC",
			Self::Descending => "DESC",
		}
	}

	fn label(self) -> &'static str {
		match self {
			Self::Ascending => "Ascending",
			Self::Descending => "Descending",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Period {
	#[default]
	#[serde(rename = "all")]
	All,
	#[serde(rename = "30d")]
	Last30d,
	#[serde(rename = "7d")]
	Last7d,
	#[serde(rename = "1d")]
	Last24h,
}
impl Choice for Period {
	const ALL: &'static [Self] = &[Self::All, Self::Last30d, Self::Last7d, Self::Last24h];

	fn as_str(self) -> &'static str {
		match self {
			Self::All => "all",
			Self::Last30d => "30d",
			Self::Last7d => "7d",
			Self::Last24h => "1d",
		}
	}

	fn label(self) -> &'static str {
		match self {
			Self::All => "All time",
			Self::Last30d => "Last 30 days",
			Self::Last7d => "Last 7 days",
			Self::Last24h => "Last 24 hours",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
	#[default]
	Helpful,
	Disputed,
	Total,
}
impl Choice for Metric {
	const ALL: &'static [Self] = &[Self::Helpful, Self::Disputed, Self::Total];

	fn as_str(self) -> &'static str {
		match self {
			Self::Helpful => "helpful",
			Self::Disputed => "disputed",
			Self::Total => "total",
		}
	}

	fn label(self) -> &'static str {
		match self {
			Self::Helpful => "Most helpful",
			Self::Disputed => "Most disputed",
			Self::Total => "Most voted",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezoneMode {
	#[default]
	Site,
	Entity,
}
impl Choice for TimezoneMode {
	const ALL: &'static [Self] = &[Self::Site, Self::Entity];

	fn as_str(self) -> &'static str {
		match self {
			Self::Site => "site",
			Self::Entity => "entity",
		}
	}

	fn label(self) -> &'static str {
		match self {
			Self::Site => "Site timezone",
			Self::Entity => "Per-entity timezone",
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn unknown_periods_fall_back_to_all() {
		for raw in ["90d", "ALL", "7D", " 7d", "", "all; DROP TABLE entities"] {
			assert_eq!(normalize(Some(raw), Period::All), Period::All, "raw = {raw:?}");
		}

		assert_eq!(normalize(None, Period::All), Period::All);
		assert_eq!(normalize(Some("7d"), Period::All), Period::Last7d);
		assert_eq!(normalize(Some("1d"), Period::All), Period::Last24h);
	}

	#[test]
	fn only_exact_asc_yields_ascending() {
		assert_eq!(normalize(Some("ASC"), Direction::Descending), Direction::Ascending);

		for raw in ["asc", "Asc", "ascending", "ASC ", "up", ""] {
			assert_eq!(normalize(Some(raw), Direction::Descending), Direction::Descending);
		}
	}

	#[test]
	fn non_string_values_use_the_default() {
		assert_eq!(normalize_value(Some(&json!(1)), Metric::Helpful), Metric::Helpful);
		assert_eq!(normalize_value(Some(&json!(null)), Metric::Helpful), Metric::Helpful);
		assert_eq!(normalize_value(Some(&json!(["total"])), Metric::Helpful), Metric::Helpful);
		assert_eq!(normalize_value(Some(&json!("total")), Metric::Helpful), Metric::Total);
	}

	#[test]
	fn serialized_values_match_wire_strings() {
		for direction in Direction::ALL {
			assert_eq!(json!(direction), json!(direction.as_str()));
		}
		for period in Period::ALL {
			assert_eq!(json!(period), json!(period.as_str()));
		}
		for metric in Metric::ALL {
			assert_eq!(json!(metric), json!(metric.as_str()));
		}
		for mode in TimezoneMode::ALL {
			assert_eq!(json!(mode), json!(mode.as_str()));
		}
	}
}
