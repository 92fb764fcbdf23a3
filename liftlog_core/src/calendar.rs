//! Month grid projection for calendar snapshots.
//!
//! A month is shown as whole weeks: the grid starts on the week-start day
//! on or before the 1st and ends on the last day of the week holding the
//! month's final day. Days from neighbouring months are included and
//! flagged, never blanked.
//!
//! Weeks start on Sunday.

use crate::aggregate::local_day;
use crate::{Error, Result, Snapshot};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Weekday};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// First day of every displayed week
pub const WEEK_START: Weekday = Weekday::Sun;

fn days_into_week(date: NaiveDate) -> i64 {
    ((7 + date.weekday().num_days_from_monday() - WEEK_START.num_days_from_monday()) % 7) as i64
}

/// The week-start day on or before `date`
///
/// Clamps to `NaiveDate::MIN` in the first days chrono can represent.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(days_into_week(date)))
        .unwrap_or(NaiveDate::MIN)
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    (28..=31)
        .rev()
        .find_map(|day| NaiveDate::from_ymd_opt(first.year(), first.month(), day))
        .unwrap_or(first)
}

/// First and last day of the whole weeks covering the month starting at `first`
fn grid_span(first: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let last = last_of_month(first);
    let start = first.checked_sub_signed(Duration::days(days_into_week(first)))?;
    let end = last.checked_add_signed(Duration::days(6 - days_into_week(last)))?;
    Some((start, end))
}

// ============================================================================
// Month reference
// ============================================================================

/// A calendar month, stored as its first day
///
/// Only months whose whole-week grid fits in chrono's date range exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthRef {
    first: NaiveDate,
}

impl MonthRef {
    /// Build from a year and a 1-based month number
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::Validation(format!("Invalid month: {}-{:02}", year, month)))?;
        if grid_span(first).is_none() {
            return Err(Error::Validation(format!(
                "Month out of range: {}-{:02}",
                year, month
            )));
        }
        Ok(Self { first })
    }

    /// The month a date falls in, or the nearest displayable one
    pub fn containing(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        if grid_span(first).is_some() {
            return Self { first };
        }
        Self::edge(date.year() > 0).unwrap_or(Self { first })
    }

    /// The last (`forward`) or first displayable month
    fn edge(forward: bool) -> Option<Self> {
        let far = if forward { NaiveDate::MAX } else { NaiveDate::MIN };
        std::iter::successors(far.with_day(1), |first| {
            if forward {
                first.checked_sub_months(Months::new(1))
            } else {
                first.checked_add_months(Months::new(1))
            }
        })
        .take(2)
        .find(|first| grid_span(*first).is_some())
        .map(|first| Self { first })
    }

    /// The month of `now` in its own time zone
    pub fn current<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::containing(now.date_naive())
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        last_of_month(self.first)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Shift by whole months, rolling over year boundaries
    ///
    /// Clamps to the first or last displayable month.
    pub fn offset(self, months: i32) -> Self {
        let shifted = if months >= 0 {
            self.first.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            self.first.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        match shifted.filter(|first| grid_span(*first).is_some()) {
            Some(first) => Self { first },
            None => Self::edge(months >= 0).unwrap_or(self),
        }
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn prev(self) -> Self {
        self.offset(-1)
    }

    /// Heading text such as "March 2024"
    pub fn title(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthRef {
    type Err = Error;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid month '{}', expected YYYY-MM", s));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

// ============================================================================
// Grid
// ============================================================================

/// One day in the month grid
#[derive(Clone, Debug, PartialEq)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    /// Day belongs to the displayed month
    pub in_month: bool,
    pub is_today: bool,
    /// Snapshots done on this local day, in input order
    pub snapshots: Vec<&'a Snapshot>,
}

/// A month laid out as whole weeks of seven days
#[derive(Clone, Debug, PartialEq)]
pub struct MonthGrid<'a> {
    pub month: MonthRef,
    pub weeks: Vec<[DayCell<'a>; 7]>,
}

impl<'a> MonthGrid<'a> {
    /// Lay out `month` and attach each snapshot to the local day it was done
    ///
    /// `now` supplies both the time zone for day truncation and "today".
    /// Snapshots outside the grid's date span are left out.
    pub fn project<Tz: TimeZone>(
        month: MonthRef,
        snapshots: &'a [Snapshot],
        now: &DateTime<Tz>,
    ) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        let mut by_day: HashMap<NaiveDate, Vec<&'a Snapshot>> = HashMap::new();
        for snapshot in snapshots {
            by_day
                .entry(local_day(&snapshot.done, &tz))
                .or_default()
                .push(snapshot);
        }

        let (start, end) =
            grid_span(month.first).unwrap_or((month.first_day(), month.last_day()));
        let week_count = ((end - start).num_days() + 1) / 7;

        let weeks = (0..week_count)
            .map(|week| {
                std::array::from_fn(|weekday| {
                    let date = start
                        .checked_add_signed(Duration::days(week * 7 + weekday as i64))
                        .unwrap_or(end);
                    DayCell {
                        date,
                        in_month: month.contains(date),
                        is_today: date == today,
                        snapshots: by_day.remove(&date).unwrap_or_default(),
                    }
                })
            })
            .collect();

        Self { month, weeks }
    }

    /// All cells, row by row
    pub fn cells(&self) -> impl Iterator<Item = &DayCell<'a>> {
        self.weeks.iter().flatten()
    }

    pub fn today(&self) -> Option<&DayCell<'a>> {
        self.cells().find(|cell| cell.is_today)
    }

    pub fn snapshot_count(&self) -> usize {
        self.cells().map(|cell| cell.snapshots.len()).sum()
    }
}

// ============================================================================
// Navigation
// ============================================================================

/// Which month the calendar view is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarCursor {
    month: MonthRef,
}

impl CalendarCursor {
    pub fn new(month: MonthRef) -> Self {
        Self { month }
    }

    pub fn at_today<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::new(MonthRef::current(now))
    }

    pub fn month(&self) -> MonthRef {
        self.month
    }

    pub fn next(&mut self) -> MonthRef {
        self.month = self.month.next();
        self.month
    }

    pub fn prev(&mut self) -> MonthRef {
        self.month = self.month.prev();
        self.month
    }

    pub fn shift(&mut self, months: i32) -> MonthRef {
        self.month = self.month.offset(months);
        self.month
    }

    /// Reset to the month containing `now`, whatever was shown before
    pub fn jump_to_today<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> MonthRef {
        self.month = MonthRef::current(now);
        self.month
    }
}
