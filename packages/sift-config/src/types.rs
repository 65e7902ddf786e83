use serde::Deserialize;
use serde_json::{Map, Value};
use time::UtcOffset;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub site: Site,
	#[serde(default)]
	pub host: Host,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Site {
	/// "UTC", "Z", or a fixed offset such as "+02:00" or "-05:30".
	#[serde(default = "default_site_timezone")]
	pub timezone: String,
}
impl Site {
	pub fn utc_offset(&self) -> Result<UtcOffset> {
		parse_utc_offset(self.timezone.as_str())
			.ok_or_else(|| Error::InvalidTimezone { value: self.timezone.clone() })
	}
}
impl Default for Site {
	fn default() -> Self {
		Self { timezone: default_site_timezone() }
	}
}

/// Table names and counter keys of the host's content storage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Host {
	pub entity_table: String,
	pub meta_table: String,
	pub schedule_table: String,
	pub views_key: String,
	pub helpful_yes_key: String,
	pub helpful_no_key: String,
}
impl Default for Host {
	fn default() -> Self {
		Self {
			entity_table: "entities".to_string(),
			meta_table: "entity_meta".to_string(),
			schedule_table: "entity_schedules".to_string(),
			views_key: "_sift_views".to_string(),
			helpful_yes_key: "_sift_helpful_yes".to_string(),
			helpful_no_key: "_sift_helpful_no".to_string(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub default_preset: Option<String>,
	pub default_limit: u32,
	pub max_limit: u32,
	pub presets: Vec<RankingPreset>,
}
impl Default for Ranking {
	fn default() -> Self {
		Self { default_preset: None, default_limit: 20, max_limit: 100, presets: Vec::new() }
	}
}

/// A stored sort option. `type` is a registry key; `params` are raw strategy parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingPreset {
	pub key: String,
	pub label: String,
	pub r#type: String,
	#[serde(default)]
	pub params: Map<String, Value>,
}

fn default_site_timezone() -> String {
	"UTC".to_string()
}

fn parse_utc_offset(raw: &str) -> Option<UtcOffset> {
	let raw = raw.trim();

	if raw.eq_ignore_ascii_case("utc") || raw == "Z" {
		return Some(UtcOffset::UTC);
	}

	let (sign, rest) = match raw.as_bytes().first()? {
		b'+' => (1_i8, &raw[1..]),
		b'-' => (-1_i8, &raw[1..]),
		_ => return None,
	};
	let (hours, minutes) = rest.split_once(':')?;

	let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());

	if !two_digits(hours) || !two_digits(minutes) {
		return None;
	}

	let hours: i8 = hours.parse().ok()?;
	let minutes: i8 = minutes.parse().ok()?;

	if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
		return None;
	}

	UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

#[cfg(test)]
mod tests {
	use time::UtcOffset;

	use super::parse_utc_offset;

	#[test]
	fn parses_signed_offsets() {
		assert_eq!(parse_utc_offset("+02:00"), UtcOffset::from_hms(2, 0, 0).ok());
		assert_eq!(parse_utc_offset("-05:30"), UtcOffset::from_hms(-5, -30, 0).ok());
		assert_eq!(parse_utc_offset("UTC"), Some(UtcOffset::UTC));
		assert_eq!(parse_utc_offset(" Z "), Some(UtcOffset::UTC));
	}

	#[test]
	fn rejects_named_zones_and_malformed_offsets() {
		assert_eq!(parse_utc_offset("Europe/Berlin"), None);
		assert_eq!(parse_utc_offset("+2:00"), None);
		assert_eq!(parse_utc_offset("+24:00"), None);
		assert_eq!(parse_utc_offset("+02:60"), None);
		assert_eq!(parse_utc_offset(""), None);
	}

	#[test]
	fn rejects_signs_inside_the_digits() {
		for raw in ["++1:00", "+-1:00", "-+1:00", "+01:+0", "+1+:00", "+ 1:00"] {
			assert_eq!(parse_utc_offset(raw), None, "raw = {raw}");
		}
	}
}
