//! Simulation clock: owns tick state and the agricultural calendar.

use crate::types::{RunId, Tick};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// What every subsystem needs to know about the day being simulated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayInfo {
    pub tick: Tick,
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub is_first_day_of_year: bool,
    pub is_last_day_of_year: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub run_id:       RunId,
    pub current_tick: Tick,
    start_date:       NaiveDate,
    /// Day of year on which the agricultural year begins (non-leap numbering).
    agricultural_year_start: u32,
}

impl SimClock {
    pub fn new(run_id: RunId, start_date: NaiveDate, agricultural_year_start: u32) -> Self {
        Self {
            run_id,
            current_tick: 0,
            start_date,
            agricultural_year_start,
        }
    }

    /// Advance one tick. Tick 1 simulates the start date.
    pub fn advance(&mut self) -> DayInfo {
        self.current_tick += 1;
        self.today()
    }

    /// Calendar date of the current tick (the start date before tick 1).
    pub fn current_date(&self) -> NaiveDate {
        let offset = self.current_tick.saturating_sub(1);
        self.start_date
            .checked_add_days(chrono::Days::new(offset))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn today(&self) -> DayInfo {
        let date = self.current_date();
        let tomorrow = date.succ_opt().unwrap_or(date);
        DayInfo {
            tick: self.current_tick,
            date,
            day_of_year: date.ordinal(),
            is_first_day_of_year: is_agricultural_new_year(date, self.agricultural_year_start),
            is_last_day_of_year: date != tomorrow
                && is_agricultural_new_year(tomorrow, self.agricultural_year_start),
        }
    }
}

/// True when `date` opens the agricultural year.
///
/// A start day on or after day 60 moves one day later in leap years so
/// it keeps falling on the same calendar date.
pub fn is_agricultural_new_year(date: NaiveDate, start_day_of_year: u32) -> bool {
    let leap = NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some();
    let start = if leap && start_day_of_year >= 60 {
        start_day_of_year + 1
    } else {
        start_day_of_year
    };
    date.ordinal() == start
}
