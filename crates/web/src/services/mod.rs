//! Business logic sitting between the routes and the repositories.
//!
//! - `auth` - registration, login and profile changes
//! - `backup` - JSON export/import and deleting all data
//! - `budget` - monthly budget vs. spending summaries
//! - `calendar` - month, week and upcoming event views
//! - `dashboard` - the home page overview
//! - `family` - family statistics
//! - `goals` - the goal board

pub mod auth;
pub mod backup;
pub mod budget;
pub mod calendar;
pub mod dashboard;
pub mod family;
pub mod goals;
