//! The shared date axis.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

/// Tick label format.
pub const TICK_FORMAT: &str = "%Y-%m-%d";

/// Visible date window of the x-axis, `start` inclusive to `end` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct XRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl XRange {
    /// Derive the window from `today` and the last date any bar reaches.
    ///
    /// The lower bound is one calendar month before today. The upper bound
    /// follows the data (or today, whichever is later) plus a 5% margin, and
    /// always lies at least one day after the lower bound.
    pub fn for_chart(today: NaiveDate, data_end: Option<NaiveDate>) -> Self {
        let start = one_month_before(today);
        let last = data_end.map_or(today, |end| end.max(today));
        let span = (last - start).num_days().max(1);
        let margin = ((span as f64) * 0.05).ceil() as u64;
        let end = last
            .checked_add_days(Days::new(margin.max(1)))
            .unwrap_or(last);
        Self { start, end }
    }
}

/// The same day one calendar month earlier, clamped to the month's last day
/// (March 31 becomes February 28 or 29).
pub fn one_month_before(today: NaiveDate) -> NaiveDate {
    today.checked_sub_months(Months::new(1)).unwrap_or(today)
}

/// First day of the quarter on or after `date`.
pub fn quarter_start_on_or_after(date: NaiveDate) -> Option<NaiveDate> {
    let quarter_month = ((date.month0() / 3) * 3) + 1;
    let current = NaiveDate::from_ymd_opt(date.year(), quarter_month, 1)?;
    if current == date {
        Some(current)
    } else {
        current.checked_add_months(Months::new(3))
    }
}

/// Quarter boundaries (January, April, July, October 1) within `range`.
pub fn quarter_ticks(range: &XRange) -> Vec<NaiveDate> {
    let mut ticks = Vec::new();
    let mut next = quarter_start_on_or_after(range.start);
    while let Some(tick) = next.filter(|t| *t <= range.end) {
        ticks.push(tick);
        next = tick.checked_add_months(Months::new(3));
    }
    ticks
}

pub fn format_tick(date: NaiveDate) -> String {
    date.format(TICK_FORMAT).to_string()
}
