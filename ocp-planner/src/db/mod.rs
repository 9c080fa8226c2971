//! Database operations for ocp-planner
//!
//! Schema lives in `ocp_common::db`. Enum columns hold the lowercase
//! labels from [`crate::models`]; list columns hold JSON arrays.

pub mod calendars;
pub mod channels;
pub mod companies;
pub mod history;
pub mod identities;

use crate::models::UnknownLabel;
use ocp_common::{Error, Result};
use std::str::FromStr;

/// Parse a stored enum label
pub(crate) fn parse_label<T>(column: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = UnknownLabel>,
{
    value
        .parse()
        .map_err(|e: UnknownLabel| Error::InvalidInput(format!("{}: {}", column, e)))
}

/// Decode a JSON string-array column
pub(crate) fn parse_list(value: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(value)?)
}

/// Encode a string list as a JSON array
pub(crate) fn encode_list(values: &[String]) -> Result<String> {
    Ok(serde_json::to_string(values)?)
}
