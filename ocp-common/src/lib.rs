//! # OCP Common Library
//!
//! Shared code for the content planner crates:
//! - Error type used across crates
//! - TOML bootstrap configuration loading
//! - SQLite pool initialization and schema
//! - Week and day-of-week date helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
