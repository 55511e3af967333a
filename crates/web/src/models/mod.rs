//! Domain models for the planner.
//!
//! These are validated domain objects, separate from the row types the
//! repositories decode. Inputs (`New*`, `*Input`, `*Update`) are what
//! handlers and the backup importer hand to repositories.

pub mod event;
pub mod family;
pub mod finance;
pub mod goal;
pub mod session;
pub mod shopping;
pub mod user;
pub mod validation;

pub use validation::ValidationError;
