pub mod formatter;
pub mod report;

pub use formatter::{
    caliber_label, format_match_detail, format_match_table, format_points, format_score_detail,
    format_score_table, format_shooter_detail, format_shooter_table, format_totals,
    should_use_colors,
};
pub use report::{format_caliber_stats, format_match_report, format_shooter_report, format_unresolved};

use anyhow::{Context, Result};
use serde::Serialize;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")?;
    println!("{}", json);
    Ok(())
}
