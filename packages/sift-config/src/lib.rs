mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Host, Postgres, Ranking, RankingPreset, Service, Site, Storage};

use std::{collections::HashSet, fs, path::Path};

use regex::Regex;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]{0,62}$";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.log_level", &cfg.service.log_level),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	cfg.site.utc_offset()?;

	for (label, value) in [
		("host.entity_table", &cfg.host.entity_table),
		("host.meta_table", &cfg.host.meta_table),
		("host.schedule_table", &cfg.host.schedule_table),
	] {
		if !is_identifier(value) {
			return Err(Error::Validation {
				message: format!(
					"{label} must start with a letter or underscore and contain only letters, digits, or underscores (max 63)."
				),
			});
		}
	}

	let tables = [&cfg.host.entity_table, &cfg.host.meta_table, &cfg.host.schedule_table];

	if tables.iter().collect::<HashSet<_>>().len() != tables.len() {
		return Err(Error::Validation {
			message: "host table names must be distinct.".to_string(),
		});
	}

	for (label, value) in [
		("host.views_key", &cfg.host.views_key),
		("host.helpful_yes_key", &cfg.host.helpful_yes_key),
		("host.helpful_no_key", &cfg.host.helpful_no_key),
	] {
		if value.is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.host.helpful_yes_key == cfg.host.helpful_no_key {
		return Err(Error::Validation {
			message: "host.helpful_yes_key and host.helpful_no_key must differ.".to_string(),
		});
	}
	if cfg.ranking.default_limit == 0 {
		return Err(Error::Validation {
			message: "ranking.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.ranking.default_limit > cfg.ranking.max_limit {
		return Err(Error::Validation {
			message: "ranking.default_limit must be less than or equal to ranking.max_limit."
				.to_string(),
		});
	}

	let mut seen = HashSet::new();

	for preset in &cfg.ranking.presets {
		if preset.key.is_empty() {
			return Err(Error::Validation {
				message: "ranking.presets.key must be non-empty.".to_string(),
			});
		}
		if !seen.insert(preset.key.as_str()) {
			return Err(Error::Validation {
				message: format!("ranking.presets.key '{}' is duplicated.", preset.key),
			});
		}
		if preset.label.is_empty() {
			return Err(Error::Validation {
				message: format!("ranking.presets.label for '{}' must be non-empty.", preset.key),
			});
		}
	}

	if let Some(default_preset) = cfg.ranking.default_preset.as_deref()
		&& !seen.contains(default_preset)
	{
		return Err(Error::Validation {
			message: format!(
				"ranking.default_preset '{default_preset}' must name one of ranking.presets."
			),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.site.timezone = cfg.site.timezone.trim().to_string();

	if cfg.ranking.default_preset.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.ranking.default_preset = None;
	}

	for preset in &mut cfg.ranking.presets {
		preset.key = preset.key.trim().to_string();
		preset.label = preset.label.trim().to_string();
		preset.r#type = preset.r#type.trim().to_string();
	}
}

fn is_identifier(value: &str) -> bool {
	Regex::new(IDENTIFIER_PATTERN).map(|re| re.is_match(value)).unwrap_or(false)
}
