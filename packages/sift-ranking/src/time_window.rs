//! Minute-of-week arithmetic for recurring weekly schedules.
//!
//! Minute 0 is Monday 00:00 in whichever timezone the minute is evaluated in; minute 10079 is
//! Sunday 23:59 and is immediately followed by minute 0 of the next week. Stored intervals never
//! wrap: a schedule that crosses the Sunday/Monday boundary must be stored as two rows. Bounds
//! shifted by a timezone offset may leave `[0, 10079]` and are compared modulo the week.

use time::{OffsetDateTime, UtcOffset};

pub const MINUTES_PER_DAY: u16 = 1_440;
pub const MINUTES_PER_WEEK: u16 = 7 * MINUTES_PER_DAY;
pub const LAST_MINUTE_OF_WEEK: u16 = MINUTES_PER_WEEK - 1;

/// Per-query time inputs supplied by the host.
#[derive(Clone, Copy, Debug)]
pub struct TimeContext {
	pub now: OffsetDateTime,
	pub site_offset: UtcOffset,
}
impl TimeContext {
	pub fn new(now: OffsetDateTime, site_offset: UtcOffset) -> Self {
		Self { now, site_offset }
	}

	pub fn site_minute_of_week(&self) -> u16 {
		current_minute_of_week(self.now, self.site_offset)
	}

	pub fn utc_minute_of_week(&self) -> u16 {
		current_minute_of_week(self.now, UtcOffset::UTC)
	}
}

/// An inclusive `[start, end]` range of minutes within one week.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeeklyInterval {
	start: u16,
	end: u16,
}
impl WeeklyInterval {
	pub fn new(start: u16, end: u16) -> Option<Self> {
		(start <= end && end <= LAST_MINUTE_OF_WEEK).then_some(Self { start, end })
	}

	pub fn start(&self) -> u16 {
		self.start
	}

	pub fn end(&self) -> u16 {
		self.end
	}

	pub fn contains(&self, minute: u16) -> bool {
		self.start <= minute && minute <= self.end
	}
}

pub fn current_minute_of_week(instant: OffsetDateTime, timezone: UtcOffset) -> u16 {
	let local = instant.to_offset(timezone);
	let day = u16::from(local.weekday().number_days_from_monday());

	day * MINUTES_PER_DAY + u16::from(local.hour()) * 60 + u16::from(local.minute())
}

/// SQL yielding the entity's local time minus UTC in whole minutes at `instant`.
///
/// `timezone_column` must already be a quoted column reference. A NULL timezone is read as UTC.
/// The instant is embedded rather than read from the database clock, so the offset and the
/// compared minute always describe the same moment.
pub fn per_entity_offset_expression(timezone_column: &str, instant: OffsetDateTime) -> String {
	let at = format!("to_timestamp({})", instant.unix_timestamp());

	format!(
		"(EXTRACT(EPOCH FROM ({at} AT TIME ZONE COALESCE({timezone_column}, 'UTC')) - ({at} AT TIME ZONE 'UTC')) / 60)::integer"
	)
}
