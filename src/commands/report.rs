use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use super::CommandContext;
use crate::config::ReportSettings;
use crate::fetch::{fetch_match_report_data, fetch_shooter_history, ShooterHistory};
use crate::output::{format_match_report, format_shooter_report};
use crate::scoring::{build_match_report, compute_caliber_averages, CaliberStats, YearFilter};

/// `--year` if given, else `report.default_year` from the config.
pub fn resolve_year(flag: Option<YearFilter>, settings: &ReportSettings) -> Result<YearFilter> {
    match flag {
        Some(year) => Ok(year),
        None => settings
            .default_year
            .parse()
            .with_context(|| format!("report.default_year '{}' is invalid", settings.default_year)),
    }
}

pub async fn match_report(ctx: &CommandContext, match_id: u64) -> Result<()> {
    let (m, scores, shooters) = fetch_match_report_data(&ctx.client, match_id).await?;
    let report = build_match_report(&m, &scores, &shooters);
    ctx.emit(&report, || format_match_report(&report, ctx.use_colors))
}

#[derive(Debug, Serialize)]
struct ShooterReport<'a> {
    year: String,
    calibers: &'a BTreeMap<String, CaliberStats>,
    #[serde(flatten)]
    history: &'a ShooterHistory,
}

pub async fn shooter_report(ctx: &CommandContext, shooter_id: u64, year: YearFilter) -> Result<()> {
    let history = fetch_shooter_history(&ctx.client, shooter_id).await?;
    let stats = compute_caliber_averages(&history.matches, year);
    let report = ShooterReport {
        year: year.to_string(),
        calibers: &stats,
        history: &history,
    };
    ctx.emit(&report, || format_shooter_report(&history, &stats, year, ctx.use_colors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(default_year: &str) -> ReportSettings {
        ReportSettings {
            default_year: default_year.to_string(),
        }
    }

    #[test]
    fn test_flag_wins_over_config() {
        let year = resolve_year(Some(YearFilter::Year(2022)), &settings("2024")).unwrap();
        assert_eq!(year, YearFilter::Year(2022));
    }

    #[test]
    fn test_config_default_applies() {
        assert_eq!(resolve_year(None, &settings("2024")).unwrap(), YearFilter::Year(2024));
        assert_eq!(resolve_year(None, &settings("all")).unwrap(), YearFilter::All);
    }

    #[test]
    fn test_bad_config_default_is_an_error() {
        let err = resolve_year(None, &settings("last year")).unwrap_err();
        assert!(err.to_string().contains("report.default_year 'last year' is invalid"));
    }
}
