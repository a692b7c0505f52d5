//! Command implementations for the Babel CLI.

pub mod admin;
pub mod models;
pub mod translate;

use anyhow::Result;
use serde::Serialize;

/// Print `value` as pretty JSON.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
