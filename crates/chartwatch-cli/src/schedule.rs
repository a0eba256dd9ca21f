//! Market-hours scheduling
//!
//! The run loop only captures inside the configured market hours. Time
//! parsing is lenient on purpose: a bad timezone or time string logs a
//! warning and lets the run proceed rather than silently stopping the
//! automation.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::time::Duration;
use tracing::warn;

/// Scheduling configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Whether scheduled mode is on at all (`SCHEDULE_ENABLED`)
    pub enabled: bool,
    /// Interval between runs inside market hours
    pub interval: Duration,
    /// IANA timezone name for the market (`CAPTURE_TIMEZONE`)
    pub timezone: String,
    /// Market open, `HH:MM` (`CAPTURE_START_TIME`)
    pub start_time: String,
    /// Market close, `HH:MM` (`CAPTURE_STOP_TIME`)
    pub stop_time: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(3600),
            timezone: "US/Eastern".to_string(),
            start_time: "09:30".to_string(),
            stop_time: "16:00".to_string(),
        }
    }
}

impl ScheduleConfig {
    /// Load the schedule from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("SCHEDULE_ENABLED")
                .is_ok_and(|v| v.eq_ignore_ascii_case("true")),
            interval: Duration::from_secs(
                std::env::var("CAPTURE_INTERVAL_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            ),
            timezone: std::env::var("CAPTURE_TIMEZONE").unwrap_or(defaults.timezone),
            start_time: std::env::var("CAPTURE_START_TIME").unwrap_or(defaults.start_time),
            stop_time: std::env::var("CAPTURE_STOP_TIME").unwrap_or(defaults.stop_time),
        }
    }

    /// Whether the current time is inside market hours
    pub fn within_market_hours(&self) -> bool {
        self.within_at(Utc::now())
    }

    /// Market-hours check for a given instant
    pub fn within_at(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }

        let Ok(tz) = self.timezone.parse::<Tz>() else {
            warn!("unknown timezone '{}', running anyway", self.timezone);
            return true;
        };
        let (Some(start), Some(stop)) = (parse_hm(&self.start_time), parse_hm(&self.stop_time))
        else {
            warn!(
                "could not parse market hours '{}'-'{}', running anyway",
                self.start_time, self.stop_time
            );
            return true;
        };

        let local = now.with_timezone(&tz).time();
        start <= local && local <= stop
    }
}

fn parse_hm(s: &str) -> Option<NaiveTime> {
    let (hours, minutes) = s.split_once(':')?;
    NaiveTime::from_hms_opt(hours.trim().parse().ok()?, minutes.trim().parse().ok()?, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule() -> ScheduleConfig {
        ScheduleConfig {
            enabled: true,
            ..ScheduleConfig::default()
        }
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        // Mid-January: US/Eastern is UTC-5
        Utc.with_ymd_and_hms(2026, 1, 15, h, m, 0).unwrap()
    }

    #[test]
    fn test_disabled_always_runs() {
        let config = ScheduleConfig::default();
        assert!(config.within_at(utc(3, 0)));
    }

    #[test]
    fn test_inside_market_hours() {
        // 16:00 UTC = 11:00 EST
        assert!(schedule().within_at(utc(16, 0)));
    }

    #[test]
    fn test_boundaries_inclusive() {
        // 14:30 UTC = 09:30 EST, 21:00 UTC = 16:00 EST
        assert!(schedule().within_at(utc(14, 30)));
        assert!(schedule().within_at(utc(21, 0)));
    }

    #[test]
    fn test_outside_market_hours() {
        // 23:00 UTC = 18:00 EST
        assert!(!schedule().within_at(utc(23, 0)));
        // 13:00 UTC = 08:00 EST
        assert!(!schedule().within_at(utc(13, 0)));
    }

    #[test]
    fn test_bad_timezone_is_lenient() {
        let config = ScheduleConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..schedule()
        };
        assert!(config.within_at(utc(3, 0)));
    }

    #[test]
    fn test_bad_time_string_is_lenient() {
        let config = ScheduleConfig {
            start_time: "nine thirty".to_string(),
            ..schedule()
        };
        assert!(config.within_at(utc(3, 0)));
    }

    #[test]
    fn test_parse_hm() {
        assert_eq!(parse_hm("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_hm("16:00"), NaiveTime::from_hms_opt(16, 0, 0));
        assert!(parse_hm("24:99").is_none());
        assert!(parse_hm("0930").is_none());
    }
}
