//! Stamp map and month-grid computation, kept free of terminal concerns so
//! the grid logic is testable on its own.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage key for one calendar day: `"Y-M-D"`, month 1-based, month and
/// day without zero-padding.
pub fn date_key(year: i32, month: u32, day: u32) -> String {
    format!("{}-{}-{}", year, month, day)
}

/// Sparse date-to-bool record. A missing key is unstamped. Toggling off writes
/// an explicit `false` rather than removing the key; only the yearly sweep
/// deletes entries. The ordered map keeps the serialized record stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stamps {
    entries: BTreeMap<String, bool>,
}

impl Stamps {
    pub fn is_stamped(&self, key: &str) -> bool {
        self.entries.get(key).copied().unwrap_or(false)
    }

    /// Flips the key and returns the new state.
    pub fn toggle(&mut self, key: &str) -> bool {
        let next = !self.is_stamped(key);
        self.entries.insert(key.to_string(), next);
        next
    }

    /// Drops every entry whose year component is older than `min_year`.
    /// Entries with an unparsable year component are dropped too. Returns
    /// whether anything was removed.
    pub fn retain_from_year(&mut self, min_year: i32) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| key_year(key).is_some_and(|year| year >= min_year));
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key_year(key: &str) -> Option<i32> {
    key.split('-').next()?.parse().ok()
}

/// Cutoff year for the January cleanup sweep: entries from before the
/// returned year are discarded, keeping the current and previous year.
/// `None` outside January, when the sweep must not touch storage.
pub fn cleanup_cutoff(today: NaiveDate) -> Option<i32> {
    (today.month() == 1).then(|| today.year() - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub weekend: bool,
    pub today: bool,
    pub stamped: bool,
}

/// One month laid out for a 7-column, Sunday-first week. `leading` empty
/// placeholder cells push day 1 under its weekday column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub leading: usize,
    pub days: Vec<DayCell>,
}

/// Builds the grid for a (year, 1-based month) pair. `None` only for an
/// unrepresentable year/month combination.
pub fn month_grid(year: i32, month: u32, today: NaiveDate, stamps: &Stamps) -> Option<MonthGrid> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let leading = first.weekday().num_days_from_sunday() as usize;

    let days = (1..=days_in_month(year, month))
        .filter_map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let weekday = date.weekday();
            Some(DayCell {
                day,
                weekend: weekday == Weekday::Sat || weekday == Weekday::Sun,
                today: date == today,
                stamped: stamps.is_stamped(&date_key(year, month, day)),
            })
        })
        .collect();

    Some(MonthGrid {
        year,
        month,
        leading,
        days,
    })
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // --- date_key ---

    #[test]
    fn date_key_is_unpadded_and_one_based() {
        assert_eq!(date_key(2025, 4, 7), "2025-4-7");
        assert_eq!(date_key(2025, 12, 31), "2025-12-31");
    }

    // --- Stamps ---

    #[test]
    fn missing_key_reads_unstamped() {
        let stamps = Stamps::default();
        assert!(!stamps.is_stamped("2025-4-7"));
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let mut stamps = Stamps::default();
        assert!(stamps.toggle("2025-4-7"));
        assert!(stamps.is_stamped("2025-4-7"));
        assert!(!stamps.toggle("2025-4-7"));
        assert!(!stamps.is_stamped("2025-4-7"));
    }

    #[test]
    fn double_toggle_restores_serialized_form() {
        let mut stamps = Stamps::default();
        stamps.toggle("2025-4-7");
        let before = serde_json::to_string(&stamps).unwrap();
        stamps.toggle("2025-4-7");
        stamps.toggle("2025-4-7");
        assert_eq!(serde_json::to_string(&stamps).unwrap(), before);
    }

    #[test]
    fn toggled_off_key_stays_in_the_record() {
        let mut stamps = Stamps::default();
        stamps.toggle("2025-4-7");
        stamps.toggle("2025-4-7");
        assert_eq!(stamps.len(), 1);
        assert_eq!(
            serde_json::to_string(&stamps).unwrap(),
            r#"{"2025-4-7":false}"#
        );
    }

    // --- cleanup sweep ---

    #[test]
    fn january_sweep_keeps_current_and_previous_year() {
        let mut stamps = Stamps::default();
        for year in [2023, 2024, 2025] {
            stamps.toggle(&date_key(year, 6, 15));
        }
        let cutoff = cleanup_cutoff(date(2025, 1, 10)).unwrap();
        assert_eq!(cutoff, 2024);
        assert!(stamps.retain_from_year(cutoff));
        assert_eq!(stamps.len(), 2);
        assert!(stamps.is_stamped(&date_key(2024, 6, 15)));
        assert!(stamps.is_stamped(&date_key(2025, 6, 15)));
        assert!(!stamps.is_stamped(&date_key(2023, 6, 15)));
    }

    #[test]
    fn sweep_only_runs_in_january() {
        assert_eq!(cleanup_cutoff(date(2025, 1, 31)), Some(2024));
        assert_eq!(cleanup_cutoff(date(2025, 2, 1)), None);
        assert_eq!(cleanup_cutoff(date(2025, 12, 31)), None);
    }

    #[test]
    fn sweep_drops_unparsable_keys() {
        let mut stamps = Stamps::default();
        stamps.toggle("not-a-date");
        stamps.toggle(&date_key(2025, 1, 1));
        stamps.retain_from_year(2024);
        assert_eq!(stamps.len(), 1);
        assert!(stamps.is_stamped(&date_key(2025, 1, 1)));
    }

    #[test]
    fn sweep_reports_when_nothing_removed() {
        let mut stamps = Stamps::default();
        stamps.toggle(&date_key(2025, 1, 1));
        assert!(!stamps.retain_from_year(2024));
    }

    // --- month grid ---

    #[test]
    fn november_2023_grid_shape() {
        // Nov 1, 2023 was a Wednesday; 30-day month.
        let grid = month_grid(2023, 11, date(2024, 6, 1), &Stamps::default()).unwrap();
        assert_eq!(grid.leading, 3);
        assert_eq!(grid.days.len(), 30);

        let weekends: Vec<u32> = grid
            .days
            .iter()
            .filter(|cell| cell.weekend)
            .map(|cell| cell.day)
            .collect();
        assert_eq!(weekends, [4, 5, 11, 12, 18, 19, 25, 26]);
        assert!(grid.days.iter().all(|cell| !cell.today));
    }

    #[test]
    fn grid_marks_today_and_stamps() {
        let mut stamps = Stamps::default();
        stamps.toggle(&date_key(2025, 4, 7));
        let grid = month_grid(2025, 4, date(2025, 4, 15), &stamps).unwrap();
        assert!(grid.days[6].stamped);
        assert!(!grid.days[7].stamped);
        assert!(grid.days[14].today);
        assert_eq!(grid.days.iter().filter(|c| c.today).count(), 1);
    }

    #[test]
    fn leap_february_has_29_cells() {
        let grid = month_grid(2024, 2, date(2025, 1, 1), &Stamps::default()).unwrap();
        assert_eq!(grid.days.len(), 29);
        assert_eq!(days_in_month(2023, 2), 28);
    }

    #[test]
    fn invalid_month_yields_no_grid() {
        assert!(month_grid(2025, 13, date(2025, 1, 1), &Stamps::default()).is_none());
    }
}
