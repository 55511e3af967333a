//! Banner messages carried across Post/Redirect/Get.
//!
//! Handlers redirect with `?success=<code>` or `?error=<code>`; pages turn
//! the code back into fixed text. Unknown codes fall back to a generic
//! message, so nothing from the query string is rendered verbatim.

use axum::response::Redirect;
use serde::Deserialize;

/// Query parameters for error/success display.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Resolved banners for a page.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flash {
    pub success: Option<&'static str>,
    pub error: Option<&'static str>,
}

impl Flash {
    #[must_use]
    pub fn new(success: Option<&str>, error: Option<&str>) -> Self {
        Self {
            success: success.map(success_message),
            error: error.map(error_message),
        }
    }

    #[must_use]
    pub fn from_query(query: &MessageQuery) -> Self {
        Self::new(query.success.as_deref(), query.error.as_deref())
    }
}

/// Text for a success code.
#[must_use]
pub fn success_message(code: &str) -> &'static str {
    match code {
        "registered" => "Registration successful. Please log in.",
        "logged_out" => "You have been logged out.",
        "transaction_added" => "Transaction added.",
        "transaction_deleted" => "Transaction deleted.",
        "budget_saved" => "Budget saved.",
        "budget_deleted" => "Budget deleted.",
        "list_created" => "Shopping list created.",
        "list_deleted" => "Shopping list deleted.",
        "item_added" => "Item added.",
        "item_updated" => "Item updated.",
        "item_deleted" => "Item removed.",
        "member_added" => "Family member added.",
        "member_updated" => "Family member updated.",
        "member_deleted" => "Family member removed.",
        "event_added" => "Event added.",
        "event_updated" => "Event updated.",
        "event_deleted" => "Event deleted.",
        "goal_added" => "Goal added.",
        "goal_updated" => "Goal updated.",
        "goal_deleted" => "Goal deleted.",
        "milestone_added" => "Milestone added.",
        "milestone_updated" => "Milestone updated.",
        "milestone_deleted" => "Milestone deleted.",
        "profile_updated" => "Profile updated.",
        "profile_unchanged" => "Nothing to update.",
        "imported" => "Data imported successfully.",
        "data_deleted" => "All your data has been deleted.",
        _ => "Done.",
    }
}

/// Text for an error code.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "required" => "Please fill in all required fields.",
        "too_long" => "One of the fields is too long.",
        "invalid_choice" => "Please pick a value from the list.",
        "invalid_amount" => "Please enter a valid amount (at most two decimals).",
        "invalid_date" => "Please enter a valid date.",
        "out_of_range" => "A value is out of range.",
        "end_before_start" => "The end time cannot be before the start time.",
        "reminder_required" => "Please choose a reminder time.",
        "invalid_email" => "Please enter a valid email address.",
        "invalid_username" => "Please enter a valid username (at most 64 characters).",
        "credentials" => "Invalid username or password.",
        "exists" => "Username or email already exists.",
        "mismatch" => "Passwords do not match.",
        "weak_password" => "Password must be at least 8 characters.",
        "invalid_file" => "Invalid file format.",
        "invalid_record" => "The backup contains an invalid record. Nothing was imported.",
        "missing_file" => "Please choose a backup file to import.",
        "confirm_delete" => "Type DELETE to confirm.",
        "not_found" => "That item no longer exists.",
        "rate_limited" => "Too many attempts. Please wait a minute and try again.",
        _ => "Something went wrong. Please try again.",
    }
}

/// `path` with `key=code` appended to its query string.
#[must_use]
pub fn with_message(path: &str, key: &str, code: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={code}")
}

/// Redirect to `path` showing a success banner.
#[must_use]
pub fn redirect_success(path: &str, code: &str) -> Redirect {
    Redirect::to(&with_message(path, "success", code))
}

/// Redirect to `path` showing an error banner.
#[must_use]
pub fn redirect_error(path: &str, code: &str) -> Redirect {
    Redirect::to(&with_message(path, "error", code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_message_appends_to_existing_query() {
        assert_eq!(
            with_message("/finance", "success", "transaction_added"),
            "/finance?success=transaction_added"
        );
        assert_eq!(
            with_message("/budget?month=3&year=2026", "error", "invalid_amount"),
            "/budget?month=3&year=2026&error=invalid_amount"
        );
    }

    #[test]
    fn test_unknown_codes_use_generic_text() {
        let flash = Flash::new(Some("<script>"), Some("<script>"));
        assert_eq!(flash.success, Some("Done."));
        assert_eq!(flash.error, Some("Something went wrong. Please try again."));
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(error_message("credentials"), "Invalid username or password.");
        assert_eq!(error_message("exists"), "Username or email already exists.");
        assert_eq!(error_message("invalid_file"), "Invalid file format.");
    }
}
