//! Family Planner web application library.
//!
//! This crate provides the web application as a library, allowing it to be
//! tested in-process and driven by the operator CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
