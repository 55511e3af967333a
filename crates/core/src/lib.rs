//! Family Planner Core - Shared domain types.
//!
//! This crate provides the types used by every Family Planner component:
//! - `web` - The server-rendered family management application
//! - `cli` - Command-line tools for migrations, users and backups
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Database encoding for IDs is available behind the
//! `sqlite` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, validated strings, money, statuses and catalogs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
