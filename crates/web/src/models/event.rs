//! Calendar events.

use chrono::NaiveDateTime;

use family_planner_core::{EVENT_CATEGORIES, EventId};

use super::validation::{self, ValidationError};

/// A calendar entry.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: Option<NaiveDateTime>,
    pub reminder: bool,
    /// Set exactly when `reminder` is.
    pub reminder_at: Option<NaiveDateTime>,
}

impl Event {
    /// `HH:MM` start time for compact views.
    #[must_use]
    pub fn start_time(&self) -> String {
        self.start_at.format("%H:%M").to_string()
    }
}

/// Fields for adding or editing an event.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: Option<NaiveDateTime>,
    pub reminder: bool,
    pub reminder_at: Option<NaiveDateTime>,
}

impl EventInput {
    /// Check the fields and clear `reminder_at` when no reminder is wanted.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank title, unknown category, an end
    /// before the start, or a reminder without a time.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.title = validation::required_text("title", &self.title)?;
        self.category = validation::choice(&EVENT_CATEGORIES, &self.category)?.to_owned();
        self.description = validation::optional_text("description", self.description.as_deref())?;
        if self.end_at.is_some_and(|end| end < self.start_at) {
            return Err(ValidationError::EndBeforeStart);
        }
        if !self.reminder {
            self.reminder_at = None;
        } else if self.reminder_at.is_none() {
            return Err(ValidationError::ReminderTimeRequired);
        }
        Ok(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 10)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn input() -> EventInput {
        EventInput {
            title: "Dentist".to_owned(),
            category: "doctor's appointment".to_owned(),
            description: None,
            start_at: at(9),
            end_at: Some(at(10)),
            reminder: false,
            reminder_at: Some(at(8)),
        }
    }

    #[test]
    fn test_reminder_time_cleared_without_reminder() {
        let event = input().validated().unwrap();
        assert_eq!(event.category, "Doctor's Appointment");
        assert_eq!(event.reminder_at, None);
    }

    #[test]
    fn test_reminder_requires_time() {
        let err = EventInput {
            reminder: true,
            reminder_at: None,
            ..input()
        }
        .validated()
        .unwrap_err();
        assert_eq!(err, ValidationError::ReminderTimeRequired);
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = EventInput {
            end_at: Some(at(7)),
            ..input()
        }
        .validated()
        .unwrap_err();
        assert_eq!(err, ValidationError::EndBeforeStart);
    }
}
