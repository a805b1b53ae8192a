//! Hourly slots of the voting window and the refresh schedule.
//!
//! The feed publishes the snapshot for hour `H` a little after `H:00`, so
//! refreshes run at a fixed minute/second past every hour.

use crate::config::Config;
use chrono::{Duration, NaiveDateTime, Timelike};

/// Slots from the start of voting up to `now`, excluding the end of voting.
pub fn vote_slots(config: &Config, now: NaiveDateTime) -> Vec<NaiveDateTime> {
    let mut slots = Vec::new();
    let mut slot = config.vote_start;

    while slot < config.vote_end && slot <= now {
        // the current hour is not published before minute 1
        let unpublished = now.minute() == 0 && now.date() == slot.date() && now.hour() == slot.hour();
        if !unpublished {
            slots.push(slot);
        }
        slot += Duration::hours(1);
    }

    slots
}

/// First refresh instant strictly after `now`.
pub fn next_update(config: &Config, now: NaiveDateTime) -> NaiveDateTime {
    let this_hour = now
        .date()
        .and_hms_opt(now.hour(), config.update_minute, config.update_second)
        .unwrap_or(now);
    if this_hour > now {
        this_hour
    } else {
        this_hour + Duration::hours(1)
    }
}

/// Time left until `next_update`.
pub fn until_next_update(config: &Config, now: NaiveDateTime) -> std::time::Duration {
    (next_update(config, now) - now)
        .to_std()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_no_slots_before_voting() {
        let config = Config::default();
        assert!(vote_slots(&config, at(15, 21, 30, 0)).is_empty());
    }

    #[test]
    fn test_slots_cross_midnight() {
        let config = Config::default();
        let slots = vote_slots(&config, at(16, 1, 30, 0));
        assert_eq!(slots, vec![at(15, 22, 0, 0), at(15, 23, 0, 0), at(16, 0, 0, 0), at(16, 1, 0, 0)]);
    }

    #[test]
    fn test_current_hour_skipped_on_the_hour() {
        let config = Config::default();
        let slots = vote_slots(&config, at(16, 1, 0, 30));
        assert_eq!(slots.last(), Some(&at(16, 0, 0, 0)));
    }

    #[test]
    fn test_slots_stop_before_end() {
        let config = Config::default();
        let slots = vote_slots(&config, at(19, 12, 0, 0));
        assert_eq!(slots.first(), Some(&at(15, 22, 0, 0)));
        assert_eq!(slots.last(), Some(&at(18, 20, 0, 0)));
        // 15th 22:00 through 18th 20:00
        assert_eq!(slots.len(), 71);
    }

    #[test]
    fn test_next_update() {
        let config = Config::default();
        assert_eq!(next_update(&config, at(18, 10, 0, 30)), at(18, 10, 1, 1));
        assert_eq!(next_update(&config, at(18, 10, 1, 1)), at(18, 11, 1, 1));
        assert_eq!(next_update(&config, at(18, 23, 45, 0)), at(19, 0, 1, 1));
        assert_eq!(
            until_next_update(&config, at(18, 10, 0, 30)),
            std::time::Duration::from_secs(31)
        );
    }
}
