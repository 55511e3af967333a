//! Family calendar: month, week and upcoming views plus event editing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::instrument;

use family_planner_core::{EVENT_CATEGORIES, EventId, YearMonth};

use crate::db::{EventRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::ValidationError;
use crate::models::event::{Event, EventInput};
use crate::models::validation;
use crate::routes::{Layout, SelectOption};
use crate::routes::messages::{Flash, MessageQuery, redirect_error, redirect_success};
use crate::services::calendar::{self, MonthGrid, UPCOMING_DAYS, Week};
use crate::state::AppState;

const CALENDAR_PATH: &str = "/calendar";

/// `datetime-local` input format.
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// View selection, navigation and banner query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub view: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub date: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl CalendarQuery {
    fn period(&self, today: NaiveDate) -> YearMonth {
        let year = self.year.as_deref().and_then(|y| y.trim().parse::<i32>().ok());
        let month = self.month.as_deref().and_then(|m| m.trim().parse::<u32>().ok());
        match (year, month) {
            (Some(year), Some(month)) => YearMonth::new(year, month),
            _ => Ok(YearMonth::containing(today)),
        }
        .unwrap_or_else(|_| YearMonth::containing(today))
    }

    fn date(&self, today: NaiveDate) -> NaiveDate {
        validation::parse_optional_date("date", self.date.as_deref())
            .ok()
            .flatten()
            .unwrap_or(today)
    }
}

/// Add/edit event form data.
#[derive(Debug, Deserialize)]
pub struct EventForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub description: Option<String>,
    #[serde(default)]
    pub start_at: String,
    pub end_at: Option<String>,
    pub reminder: Option<String>,
    pub reminder_at: Option<String>,
}

impl EventForm {
    fn parse(&self) -> Result<EventInput, ValidationError> {
        EventInput {
            title: self.title.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            start_at: validation::parse_datetime("start time", &self.start_at)?,
            end_at: validation::parse_optional_datetime("end time", self.end_at.as_deref())?,
            reminder: validation::checkbox(self.reminder.as_deref()),
            reminder_at: validation::parse_optional_datetime(
                "reminder time",
                self.reminder_at.as_deref(),
            )?,
        }
        .validated()
    }
}

/// Values pre-filled into the event form.
#[derive(Debug, Clone)]
pub struct EventFormValues {
    pub action: String,
    pub submit_label: &'static str,
    pub title: String,
    pub categories: Vec<SelectOption>,
    pub description: String,
    pub start_at: String,
    pub end_at: String,
    pub reminder: bool,
    pub reminder_at: String,
}

fn input_value(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format(INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

impl EventFormValues {
    /// An empty form starting at 09:00 on `date`.
    fn blank(date: NaiveDate) -> Self {
        Self {
            action: "/calendar/events".to_owned(),
            submit_label: "Add event",
            title: String::new(),
            categories: SelectOption::from_entries(EVENT_CATEGORIES.entries(), "Other"),
            description: String::new(),
            start_at: input_value(date.and_hms_opt(9, 0, 0)),
            end_at: String::new(),
            reminder: false,
            reminder_at: String::new(),
        }
    }

    fn for_event(event: &Event) -> Self {
        Self {
            action: format!("/calendar/events/{}", event.id),
            submit_label: "Save changes",
            title: event.title.clone(),
            categories: SelectOption::from_entries(EVENT_CATEGORIES.entries(), &event.category),
            description: event.description.clone().unwrap_or_default(),
            start_at: input_value(Some(event.start_at)),
            end_at: input_value(event.end_at),
            reminder: event.reminder,
            reminder_at: input_value(event.reminder_at),
        }
    }
}

/// Month view template.
#[derive(Template, WebTemplate)]
#[template(path = "calendar/month.html")]
pub struct MonthTemplate {
    pub layout: Layout,
    pub grid: MonthGrid,
    pub previous: YearMonth,
    pub next: YearMonth,
    pub form: EventFormValues,
    pub today: NaiveDate,
}

/// Week view template.
#[derive(Template, WebTemplate)]
#[template(path = "calendar/week.html")]
pub struct WeekTemplate {
    pub layout: Layout,
    pub week: Week,
    pub form: EventFormValues,
    pub today: NaiveDate,
}

/// Upcoming view template.
#[derive(Template, WebTemplate)]
#[template(path = "calendar/upcoming.html")]
pub struct UpcomingTemplate {
    pub layout: Layout,
    pub events: Vec<Event>,
    pub days: u64,
    pub form: EventFormValues,
    pub today: NaiveDate,
}

/// Edit event template.
#[derive(Template, WebTemplate)]
#[template(path = "calendar/edit.html")]
pub struct EditEventTemplate {
    pub layout: Layout,
    pub event: Event,
    pub form: EventFormValues,
}

/// Display the month, week or upcoming view.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, AppError> {
    let now = chrono::Local::now().naive_local();
    let today = now.date();
    let layout = Layout::new(
        &user,
        "calendar",
        Flash::new(query.success.as_deref(), query.error.as_deref()),
    );
    let page = match query.view.as_deref() {
        Some("week") => {
            let date = query.date(today);
            WeekTemplate {
                layout,
                week: calendar::week_view(state.pool(), user.id, date, today).await?,
                form: EventFormValues::blank(date),
                today,
            }
            .into_response()
        }
        Some("upcoming") => UpcomingTemplate {
            layout,
            events: calendar::upcoming(state.pool(), user.id, now).await?,
            days: UPCOMING_DAYS,
            form: EventFormValues::blank(today),
            today,
        }
        .into_response(),
        _ => {
            let period = query.period(today);
            let default_day = if period.contains(today) {
                today
            } else {
                period.first_day()
            };
            MonthTemplate {
                layout,
                grid: calendar::month_view(state.pool(), user.id, period, today).await?,
                previous: period.previous(),
                next: period.next(),
                form: EventFormValues::blank(default_day),
                today,
            }
            .into_response()
        }
    };
    Ok(page)
}

/// Month view path for the month of `event`.
fn month_path(start_at: NaiveDateTime) -> String {
    let period = YearMonth::containing(start_at.date());
    format!(
        "/calendar?view=month&year={}&month={}",
        period.year(),
        period.month()
    )
}

/// Add an event.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<EventForm>,
) -> Result<Redirect, AppError> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => return Ok(redirect_error(CALENDAR_PATH, err.code())),
    };
    let event = EventRepository::new(state.pool())
        .create(user.id, &input)
        .await?;
    Ok(redirect_success(&month_path(event.start_at), "event_added"))
}

/// Display the edit form for an event.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<EventId>,
    Query(query): Query<MessageQuery>,
) -> Result<EditEventTemplate, AppError> {
    let event = EventRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {id}")))?;

    Ok(EditEventTemplate {
        layout: Layout::new(&user, "calendar", Flash::from_query(&query)),
        form: EventFormValues::for_event(&event),
        event,
    })
}

/// Save changes to an event.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<EventId>,
    Form(form): Form<EventForm>,
) -> Result<Redirect, AppError> {
    let input = match form.parse() {
        Ok(input) => input,
        Err(err) => {
            return Ok(redirect_error(
                &format!("/calendar/events/{id}/edit"),
                err.code(),
            ));
        }
    };
    match EventRepository::new(state.pool())
        .update(user.id, id, &input)
        .await
    {
        Ok(event) => Ok(redirect_success(&month_path(event.start_at), "event_updated")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(CALENDAR_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

/// Delete an event.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<EventId>,
) -> Result<Redirect, AppError> {
    match EventRepository::new(state.pool())
        .delete(user.id, id)
        .await
    {
        Ok(()) => Ok(redirect_success(CALENDAR_PATH, "event_deleted")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(CALENDAR_PATH, "not_found")),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(reminder: Option<&str>, reminder_at: Option<&str>) -> EventForm {
        EventForm {
            title: "Dentist".to_owned(),
            category: "doctor's appointment".to_owned(),
            description: None,
            start_at: "2026-05-10T14:30".to_owned(),
            end_at: Some(String::new()),
            reminder: reminder.map(str::to_owned),
            reminder_at: reminder_at.map(str::to_owned),
        }
    }

    #[test]
    fn test_event_form_parses_datetime_local() {
        let input = form(None, Some("2026-05-10T09:00")).parse().unwrap();
        assert_eq!(input.category, "Doctor's Appointment");
        assert_eq!(input.start_at.format(INPUT_FORMAT).to_string(), "2026-05-10T14:30");
        assert_eq!(input.end_at, None);
        assert!(!input.reminder);
        assert_eq!(input.reminder_at, None);
    }

    #[test]
    fn test_event_form_requires_reminder_time() {
        let err = form(Some("on"), None).parse().unwrap_err();
        assert_eq!(err.code(), "reminder_required");
    }

    #[test]
    fn test_query_falls_back_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let query = CalendarQuery {
            year: Some("2026".to_owned()),
            month: Some("13".to_owned()),
            date: Some("not-a-date".to_owned()),
            ..CalendarQuery::default()
        };
        assert_eq!(query.period(today), YearMonth::containing(today));
        assert_eq!(query.date(today), today);
    }

    #[test]
    fn test_month_path() {
        let start = NaiveDate::from_ymd_opt(2026, 12, 24)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(month_path(start), "/calendar?view=month&year=2026&month=12");
    }
}
