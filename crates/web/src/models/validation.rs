//! Form input validation.
//!
//! Handlers turn raw form strings into typed inputs with the `parse_*`
//! helpers, then call `validated()` on the input. A failure is never shown
//! as an error page: the handler redirects back with [`ValidationError::code`]
//! so the page can render a banner.

use chrono::{NaiveDate, NaiveDateTime};
use family_planner_core::{Catalog, Money};
use thiserror::Error;

/// Longest free-text value accepted from a form.
pub const MAX_TEXT_LENGTH: usize = 500;

/// A rejected form value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("'{value}' is not a valid {field}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("{0} must be at least $0.01")]
    InvalidAmount(&'static str),

    #[error("{field} is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("end time cannot be before start time")]
    EndBeforeStart,

    #[error("a reminder needs a reminder time")]
    ReminderTimeRequired,
}

impl ValidationError {
    /// Short code carried in `?error=` after a failed form post.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Required(_) => "required",
            Self::TooLong { .. } => "too_long",
            Self::InvalidChoice { .. } => "invalid_choice",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidDate { .. } => "invalid_date",
            Self::OutOfRange { .. } => "out_of_range",
            Self::EndBeforeStart => "end_before_start",
            Self::ReminderTimeRequired => "reminder_required",
        }
    }
}

/// Trimmed, non-empty text.
///
/// # Errors
///
/// Returns `Required` for blank input and `TooLong` past [`MAX_TEXT_LENGTH`].
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    optional_text(field, Some(value))?.ok_or(ValidationError::Required(field))
}

/// Trimmed text, `None` when blank.
///
/// # Errors
///
/// Returns `TooLong` past [`MAX_TEXT_LENGTH`].
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LENGTH,
        });
    }
    Ok(Some(value.to_owned()))
}

/// The canonical catalog entry for `value`.
///
/// # Errors
///
/// Returns `InvalidChoice` if the value is not in the catalog.
pub fn choice(catalog: &Catalog, value: &str) -> Result<&'static str, ValidationError> {
    catalog
        .find(value)
        .ok_or_else(|| ValidationError::InvalidChoice {
            field: catalog.name(),
            value: value.trim().to_owned(),
        })
}

/// A strictly positive amount typed into a form.
///
/// # Errors
///
/// Returns `InvalidAmount` unless the input is a number of at least 0.01
/// with at most two decimals.
pub fn positive_money(field: &'static str, value: &str) -> Result<Money, ValidationError> {
    let money = Money::parse(value).map_err(|_| ValidationError::InvalidAmount(field))?;
    ensure_positive(field, money)
}

/// A zero-or-more amount typed into a form.
///
/// # Errors
///
/// Returns `InvalidAmount` if the input is not a valid, non-negative amount.
pub fn non_negative_money(field: &'static str, value: &str) -> Result<Money, ValidationError> {
    match Money::parse(value) {
        Ok(money) if !money.is_negative() && money.cents().is_ok() => Ok(money),
        _ => Err(ValidationError::InvalidAmount(field)),
    }
}

pub(crate) fn ensure_positive(field: &'static str, money: Money) -> Result<Money, ValidationError> {
    if money.is_negative() || money.is_zero() || money.cents().is_err() {
        return Err(ValidationError::InvalidAmount(field));
    }
    Ok(money)
}

/// A `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `Required` for blank input or `InvalidDate`.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    parse_optional_date(field, Some(value))?.ok_or(ValidationError::Required(field))
}

/// A `YYYY-MM-DD` date, `None` when blank.
///
/// # Errors
///
/// Returns `InvalidDate` if the value does not parse.
pub fn parse_optional_date(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidDate {
            field,
            value: value.to_owned(),
        })
}

/// A date-time from a `datetime-local` input (`YYYY-MM-DDTHH:MM`, seconds optional).
///
/// # Errors
///
/// Returns `Required` for blank input or `InvalidDate`.
pub fn parse_datetime(field: &'static str, value: &str) -> Result<NaiveDateTime, ValidationError> {
    parse_optional_datetime(field, Some(value))?.ok_or(ValidationError::Required(field))
}

/// A `datetime-local` value, `None` when blank.
///
/// # Errors
///
/// Returns `InvalidDate` if the value does not parse.
pub fn parse_optional_datetime(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveDateTime>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidDate {
            field,
            value: value.to_owned(),
        })
}

/// An integer within an inclusive range.
///
/// # Errors
///
/// Returns `OutOfRange` if the value is not a number inside `min..=max`.
pub fn int_in_range(
    field: &'static str,
    value: &str,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or(ValidationError::OutOfRange { field, min, max })
}

/// Checkbox inputs submit `on` when ticked and nothing otherwise.
#[must_use]
pub fn checkbox(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("on" | "true" | "1" | "yes"))
}
