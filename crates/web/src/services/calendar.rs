//! Calendar views: month grid, week and upcoming events.
//!
//! Weeks start on Monday. The month grid pads the first and last week with
//! empty cells so every row has seven entries.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};

use family_planner_core::{UserId, YearMonth};

use crate::db::{EventRepository, Pool, RepositoryError};
use crate::models::event::Event;

/// How far ahead the upcoming view and the dashboard look.
pub const UPCOMING_DAYS: u64 = 7;

/// One cell of the month grid.
#[derive(Debug, Clone)]
pub struct DayCell {
    /// `None` for padding cells outside the month.
    pub date: Option<NaiveDate>,
    pub is_today: bool,
    pub events: Vec<Event>,
}

impl DayCell {
    const fn padding() -> Self {
        Self {
            date: None,
            is_today: false,
            events: Vec::new(),
        }
    }

    /// Day of the month, or 0 for padding.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.date.map_or(0, |d| d.day())
    }
}

/// A month laid out as Monday-first weeks.
#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub period: YearMonth,
    pub weeks: Vec<Vec<DayCell>>,
}

/// One day of the week view.
#[derive(Debug, Clone)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<Event>,
}

/// The Monday-Sunday week containing a day.
#[derive(Debug, Clone)]
pub struct Week {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<WeekDay>,
}

impl Week {
    /// Monday of the previous week.
    #[must_use]
    pub fn previous_start(&self) -> NaiveDate {
        self.start.checked_sub_days(Days::new(7)).unwrap_or(self.start)
    }

    /// Monday of the next week.
    #[must_use]
    pub fn next_start(&self) -> NaiveDate {
        self.start.checked_add_days(Days::new(7)).unwrap_or(self.start)
    }
}

/// Monday and Sunday of the week containing `date`.
#[must_use]
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = u64::from(date.weekday().num_days_from_monday());
    let monday = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
    let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(monday);
    (monday, sunday)
}

/// Lay out a month's events in a Monday-first grid.
///
/// Events outside the month are ignored.
#[must_use]
pub fn build_month_grid(period: YearMonth, events: &[Event], today: NaiveDate) -> MonthGrid {
    let first = period.first_day();
    let lead = first.weekday().num_days_from_monday() as usize;

    let mut cells: Vec<DayCell> = (0..lead).map(|_| DayCell::padding()).collect();
    for date in first.iter_days().take_while(|d| period.contains(*d)) {
        cells.push(DayCell {
            date: Some(date),
            is_today: date == today,
            events: events_on(events, date),
        });
    }
    while cells.len() % 7 != 0 {
        cells.push(DayCell::padding());
    }

    let mut weeks = Vec::with_capacity(cells.len() / 7);
    let mut cells = cells.into_iter().peekable();
    while cells.peek().is_some() {
        weeks.push(cells.by_ref().take(7).collect());
    }

    MonthGrid { period, weeks }
}

/// Lay out the week containing `date`.
#[must_use]
pub fn build_week(date: NaiveDate, events: &[Event], today: NaiveDate) -> Week {
    let (start, end) = week_bounds(date);
    let days = start
        .iter_days()
        .take(7)
        .map(|day| WeekDay {
            date: day,
            is_today: day == today,
            events: events_on(events, day),
        })
        .collect();
    Week { start, end, days }
}

fn events_on(events: &[Event], date: NaiveDate) -> Vec<Event> {
    events
        .iter()
        .filter(|e| e.start_at.date() == date)
        .cloned()
        .collect()
}

/// Load and lay out a month.
///
/// # Errors
///
/// Returns `RepositoryError` if the events cannot be loaded.
pub async fn month_view(
    pool: &Pool,
    user_id: UserId,
    period: YearMonth,
    today: NaiveDate,
) -> Result<MonthGrid, RepositoryError> {
    let events = EventRepository::new(pool)
        .between_days(user_id, period.first_day(), period.last_day())
        .await?;
    Ok(build_month_grid(period, &events, today))
}

/// Load and lay out the week containing `date`.
///
/// # Errors
///
/// Returns `RepositoryError` if the events cannot be loaded.
pub async fn week_view(
    pool: &Pool,
    user_id: UserId,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Week, RepositoryError> {
    let (start, end) = week_bounds(date);
    let events = EventRepository::new(pool)
        .between_days(user_id, start, end)
        .await?;
    Ok(build_week(date, &events, today))
}

/// Events starting between `now` and [`UPCOMING_DAYS`] days later.
///
/// # Errors
///
/// Returns `RepositoryError` if the events cannot be loaded.
pub async fn upcoming(
    pool: &Pool,
    user_id: UserId,
    now: NaiveDateTime,
) -> Result<Vec<Event>, RepositoryError> {
    let from = now.with_nanosecond(0).unwrap_or(now);
    let until = from
        .checked_add_days(Days::new(UPCOMING_DAYS))
        .unwrap_or(from);
    EventRepository::new(pool)
        .starting_in(user_id, from, until)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use family_planner_core::EventId;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(id: i64, day: NaiveDate) -> Event {
        Event {
            id: EventId::new(id),
            title: format!("Event {id}"),
            category: "Other".to_owned(),
            description: None,
            start_at: day.and_hms_opt(18, 0, 0).unwrap(),
            end_at: None,
            reminder: false,
            reminder_at: None,
        }
    }

    #[test]
    fn test_month_grid_is_monday_first() {
        // 1 March 2026 is a Sunday, so six padding cells lead.
        let grid = build_month_grid(YearMonth::new(2026, 3).unwrap(), &[], date(2026, 3, 10));
        let first_week = &grid.weeks[0];
        assert_eq!(first_week.len(), 7);
        assert!(first_week[..6].iter().all(|c| c.date.is_none()));
        assert_eq!(first_week[6].date, Some(date(2026, 3, 1)));
        assert!(grid.weeks.iter().all(|w| w.len() == 7));

        let days: Vec<u32> = grid
            .weeks
            .iter()
            .flatten()
            .filter(|c| c.date.is_some())
            .map(DayCell::day)
            .collect();
        assert_eq!(days, (1..=31).collect::<Vec<_>>());
    }

    #[test]
    fn test_month_grid_without_padding() {
        // February 2027 starts on a Monday and has exactly four weeks.
        let grid = build_month_grid(YearMonth::new(2027, 2).unwrap(), &[], date(2026, 1, 1));
        assert_eq!(grid.weeks.len(), 4);
        assert!(grid.weeks.iter().flatten().all(|c| c.date.is_some()));
    }

    #[test]
    fn test_month_grid_places_events_and_today() {
        let events = vec![event(1, date(2026, 3, 14)), event(2, date(2026, 3, 14))];
        let grid = build_month_grid(YearMonth::new(2026, 3).unwrap(), &events, date(2026, 3, 14));
        let cell = grid
            .weeks
            .iter()
            .flatten()
            .find(|c| c.date == Some(date(2026, 3, 14)))
            .unwrap();
        assert!(cell.is_today);
        assert_eq!(cell.events.len(), 2);
    }

    #[test]
    fn test_week_bounds() {
        // Wednesday 11 March 2026.
        assert_eq!(
            week_bounds(date(2026, 3, 11)),
            (date(2026, 3, 9), date(2026, 3, 15))
        );
        // A Monday is its own week start; a Sunday ends the week.
        assert_eq!(week_bounds(date(2026, 3, 9)).0, date(2026, 3, 9));
        assert_eq!(week_bounds(date(2026, 3, 15)).0, date(2026, 3, 9));
    }

    #[test]
    fn test_build_week_navigation() {
        let week = build_week(date(2026, 3, 11), &[event(1, date(2026, 3, 15))], date(2026, 3, 11));
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[6].events.len(), 1);
        assert!(week.days[2].is_today);
        assert_eq!(week.previous_start(), date(2026, 3, 2));
        assert_eq!(week.next_start(), date(2026, 3, 16));
    }
}
