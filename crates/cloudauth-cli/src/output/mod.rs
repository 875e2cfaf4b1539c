//! Output formatting utilities
//!
//! Status messages go to stderr so that stdout only carries the requested
//! value (a token, a header, JSON).

use crate::error::Result;
use console::style;
use serde::Serialize;

/// Output data as JSON
pub fn json_output<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{json}");
    Ok(())
}

/// Print a success message with green checkmark
pub fn print_success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

/// Print an informational message with blue info icon
pub fn print_info(message: &str) {
    eprintln!("{} {}", style("ℹ").blue(), message);
}

/// Print a labelled value
pub fn print_field(label: &str, value: &str) {
    println!("  {}: {}", style(label).bold(), value);
}
