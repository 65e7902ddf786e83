use sift_config::Host;

use crate::{escape::SqlEscaper, time_window::TimeContext};

pub const ENTITY_ALIAS: &str = "e";
pub const ENTITY_ID_COLUMN: &str = "entity_id";
pub const ENTITY_TIMEZONE_COLUMN: &str = "timezone";
pub const META_KEY_COLUMN: &str = "meta_key";
pub const META_VALUE_COLUMN: &str = "meta_value";
pub const SCHEDULE_FIELD_COLUMN: &str = "field_key";
pub const SCHEDULE_START_COLUMN: &str = "start_minute";
pub const SCHEDULE_END_COLUMN: &str = "end_minute";

/// Where the host keeps entities, per-entity counters, and weekly schedules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostSchema {
	pub entity_table: String,
	pub meta_table: String,
	pub schedule_table: String,
	pub views_key: String,
	pub helpful_yes_key: String,
	pub helpful_no_key: String,
}
impl HostSchema {
	pub fn from_config(host: &Host) -> Self {
		Self {
			entity_table: host.entity_table.clone(),
			meta_table: host.meta_table.clone(),
			schedule_table: host.schedule_table.clone(),
			views_key: host.views_key.clone(),
			helpful_yes_key: host.helpful_yes_key.clone(),
			helpful_no_key: host.helpful_no_key.clone(),
		}
	}

	/// Quoted `e.<column>` reference into the host's entity row.
	pub fn entity_column(&self, escaper: &dyn SqlEscaper, column: &str) -> String {
		format!("{}.{}", escaper.ident(ENTITY_ALIAS), escaper.ident(column))
	}
}
impl Default for HostSchema {
	fn default() -> Self {
		Self::from_config(&Host::default())
	}
}

#[derive(Clone, Copy, Debug)]
pub struct QueryContext<'a> {
	pub schema: &'a HostSchema,
	pub time: TimeContext,
}
impl<'a> QueryContext<'a> {
	pub fn new(schema: &'a HostSchema, time: TimeContext) -> Self {
		Self { schema, time }
	}
}
