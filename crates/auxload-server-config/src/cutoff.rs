// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cutoff time-of-day handling.
//!
//! The configuration document carries the cutoff as an `HHMM` integer
//! (`630` is 06:30, `1845` is 18:45). A run computes its deadline once, at
//! coordinator start, as the next wall-clock occurrence of that time.

use std::fmt;

use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffTime {
	time: NaiveTime,
}

impl CutoffTime {
	/// Parse an `HHMM` integer such as `0630` or `2359`.
	pub fn from_hhmm(value: u32) -> Result<Self, ConfigError> {
		let hour = value / 100;
		let minute = value % 100;
		if hour > 23 || minute > 59 {
			return Err(ConfigError::InvalidValue {
				key: "cutOffTime".to_string(),
				message: format!("'{value}' is not a valid HHMM time of day"),
			});
		}

		NaiveTime::from_hms_opt(hour, minute, 0)
			.map(|time| Self { time })
			.ok_or_else(|| ConfigError::InvalidValue {
				key: "cutOffTime".to_string(),
				message: format!("'{value}' is not a valid HHMM time of day"),
			})
	}

	pub fn hour(&self) -> u32 {
		self.time.hour()
	}

	pub fn minute(&self) -> u32 {
		self.time.minute()
	}

	/// The first instant at or after `start` whose wall-clock time equals the
	/// cutoff. A cutoff already passed today rolls over to tomorrow.
	pub fn deadline_after<Tz: TimeZone>(&self, start: &DateTime<Tz>) -> DateTime<Tz> {
		let tz = start.timezone();
		let today = start.date_naive().and_time(self.time);
		let candidate = resolve_local(&tz, today);
		if candidate >= *start {
			candidate
		} else {
			resolve_local(&tz, today + TimeDelta::days(1))
		}
	}
}

impl fmt::Display for CutoffTime {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:02}:{:02}", self.hour(), self.minute())
	}
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
	match tz.from_local_datetime(&naive) {
		LocalResult::Single(dt) => dt,
		LocalResult::Ambiguous(earliest, _) => earliest,
		// DST gap: the wall-clock time does not exist, take the instant an hour later.
		LocalResult::None => tz
			.from_local_datetime(&(naive + TimeDelta::hours(1)))
			.earliest()
			.unwrap_or_else(|| tz.from_utc_datetime(&naive)),
	}
}
