use owo_colors::OwoColorize;
use std::collections::HashMap;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::api::types::{Match, MatchTypeConfig, Score, Shooter, Stage};
use crate::config::ColorMode;
use crate::scoring::{compute_subtotals, compute_totals, Totals};

/// Decide whether to color stdout for the configured mode
pub fn should_use_colors(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
pub(crate) fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Width left for a free-text column once `fixed` columns are laid out.
/// None on pipes, where nothing is truncated.
pub(crate) fn name_width(fixed: usize) -> Option<usize> {
    get_terminal_width().map(|width| {
        if width > fixed + 10 {
            width - fixed
        } else {
            20
        }
    })
}

fn fit(name: &str, width: Option<usize>) -> String {
    match width {
        Some(w) => truncate_name(name, w),
        None => name.to_string(),
    }
}

/// Score with X count in bullseye notation: "290-3X". Unfired is "-".
pub fn format_points(score: Option<u32>, x_count: Option<u32>) -> String {
    match score {
        Some(s) => format!("{}-{}X", s, x_count.unwrap_or(0)),
        None => "-".to_string(),
    }
}

/// Totals of an entry; "DNF" when nothing was fired.
pub fn format_totals(totals: &Totals) -> String {
    if totals.all_null {
        "DNF".to_string()
    } else {
        format_points(totals.total_score, totals.total_x_count)
    }
}

/// Short label for a caliber code ("TWENTYTWO" -> ".22").
pub fn caliber_label(caliber: &str) -> String {
    match caliber {
        "TWENTYTWO" => ".22".to_string(),
        "CENTERFIRE" => "CF".to_string(),
        "FORTYFIVE" => ".45".to_string(),
        "SERVICE_PISTOL" => "Service".to_string(),
        other => other.to_string(),
    }
}

pub fn format_shooter_table(shooters: &[Shooter], use_colors: bool) -> String {
    if shooters.is_empty() {
        return "No shooters found.".to_string();
    }

    let width = name_width(6 + 2 + 10 + 2 + 20);
    shooters
        .iter()
        .map(|s| {
            let id = format!("{:>6}", s.id);
            let name = fit(&s.name, width);
            let nra = format!("{:<10}", s.nra_number.as_deref().unwrap_or(""));
            let club = s.club.as_deref().unwrap_or("");
            if use_colors {
                format!("{}  {}  {}  {}", id.dimmed(), nra.cyan(), name.bold(), club)
            } else {
                format!("{}  {}  {}  {}", id, nra, name, club)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

pub fn format_shooter_detail(shooter: &Shooter, use_colors: bool) -> String {
    let name = if use_colors {
        shooter.name.bold().to_string()
    } else {
        shooter.name.clone()
    };
    let mut lines = vec![format!("{} (#{})", name, shooter.id)];
    if let Some(club) = &shooter.club {
        lines.push(format!("  Club: {}", club));
    }
    if let Some(nra) = &shooter.nra_number {
        lines.push(format!("  NRA number: {}", nra));
    }
    lines.join("\n")
}

pub fn format_match_table(matches: &[Match], use_colors: bool) -> String {
    if matches.is_empty() {
        return "No matches found.".to_string();
    }

    let width = name_width(6 + 2 + 10 + 2 + 3);
    matches
        .iter()
        .map(|m| {
            let id = format!("{:>6}", m.id);
            let name = fit(&m.name, width);
            let date = m.date.to_string();
            let types = m.match_types.len();
            if use_colors {
                format!("{}  {}  {}  ({} types)", id.dimmed(), date.cyan(), name.bold(), types)
            } else {
                format!("{}  {}  {}  ({} types)", id, date, name, types)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_match_type(config: &MatchTypeConfig) -> String {
    let mut lines = vec![format!(
        "  {} [{}], max {}",
        config.instance_name, config.kind, config.max_score
    )];
    lines.push(format!("    Stages: {}", config.entry_stages.join(", ")));
    for (name, sources) in config.subtotal_mappings.iter() {
        lines.push(format!("    {}: {}", name, sources.join(" + ")));
    }
    if !config.calibers.is_empty() {
        let calibers: Vec<String> = config.calibers.iter().map(|c| caliber_label(c)).collect();
        lines.push(format!("    Calibers: {}", calibers.join(", ")));
    }
    lines.join("\n")
}

pub fn format_match_detail(m: &Match, use_colors: bool) -> String {
    let title = if use_colors {
        m.name.bold().to_string()
    } else {
        m.name.clone()
    };
    let mut lines = vec![format!("{} (#{})", title, m.id), format!("  Date: {}", m.date)];
    if !m.location.is_empty() {
        lines.push(format!("  Location: {}", m.location));
    }
    if let Some(aggregate) = m.aggregate_type {
        lines.push(format!("  Aggregate: {}", aggregate));
    }
    if m.match_types.is_empty() {
        lines.push("  No match types configured.".to_string());
    } else {
        lines.push("Match types:".to_string());
        lines.extend(m.match_types.iter().map(format_match_type));
    }
    lines.join("\n")
}

fn format_stage(stage: &Stage) -> String {
    format!("{:<6} {:>8}", stage.name, format_points(stage.score, stage.x_count))
}

/// A score with its stages, totals and, when its configuration is known,
/// subtotals.
pub fn format_score_detail(
    score: &Score,
    config: Option<&MatchTypeConfig>,
    shooter: Option<&Shooter>,
    use_colors: bool,
) -> String {
    let who = shooter
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("Shooter #{}", score.shooter_id));
    let header = format!(
        "{} - {} ({}), match #{}",
        who,
        score.match_type_instance,
        caliber_label(&score.caliber),
        score.match_id
    );
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for stage in &score.stages {
        lines.push(format!("  {}", format_stage(stage)));
    }

    if let Some(config) = config {
        for subtotal in compute_subtotals(&score.stages, &config.subtotal_mappings) {
            lines.push(format!(
                "  {:<6} {:>8}",
                subtotal.name,
                format_points(Some(subtotal.score), Some(subtotal.x_count))
            ));
        }
    }

    let total = format_totals(&compute_totals(&score.stages));
    let total_line = match config {
        Some(c) => format!("  {:<6} {:>8} / {}", "Total", total, c.max_score),
        None => format!("  {:<6} {:>8}", "Total", total),
    };
    lines.push(if use_colors {
        total_line.bold().to_string()
    } else {
        total_line
    });
    lines.join("\n")
}

/// One line per score of a match, in the order given.
pub fn format_score_table(
    scores: &[Score],
    shooters: &HashMap<u64, Shooter>,
    use_colors: bool,
) -> String {
    if scores.is_empty() {
        return "No scores recorded.".to_string();
    }

    let width = name_width(6 + 2 + 8 + 2 + 20 + 2 + 8);
    scores
        .iter()
        .map(|score| {
            let id = format!("{:>6}", score.id.map(|i| i.to_string()).unwrap_or_default());
            let total = format!("{:>8}", format_totals(&compute_totals(&score.stages)));
            let name = shooters
                .get(&score.shooter_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| format!("Shooter #{}", score.shooter_id));
            let name = fit(&name, width);
            let instance = format!("{:<20}", truncate_name(&score.match_type_instance, 20));
            let caliber = caliber_label(&score.caliber);
            if use_colors {
                format!(
                    "{}  {}  {}  {:<8}{}",
                    id.dimmed(),
                    total.bold(),
                    instance.cyan(),
                    caliber,
                    name
                )
            } else {
                format!("{}  {}  {}  {:<8}{}", id, total, instance, caliber, name)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::subtotals;
    use chrono::NaiveDate;

    fn sample_match() -> Match {
        Match {
            id: 4,
            name: "Spring Regional".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 13).unwrap(),
            location: "Range 3".to_string(),
            match_types: vec![MatchTypeConfig {
                kind: "NMC".to_string(),
                instance_name: "NMC .22".to_string(),
                entry_stages: vec!["SF".to_string(), "TF".to_string(), "RF".to_string()],
                subtotal_mappings: subtotals(&[("Sustained", &["TF", "RF"])]),
                max_score: 300,
                calibers: ["TWENTYTWO".to_string()].into_iter().collect(),
            }],
            aggregate_type: None,
        }
    }

    fn sample_score() -> Score {
        Score {
            id: Some(31),
            shooter_id: 2,
            match_id: 4,
            match_type_instance: "NMC .22".to_string(),
            caliber: "TWENTYTWO".to_string(),
            stages: vec![
                Stage::fired("SF", 95, 1),
                Stage::fired("TF", 98, 2),
                Stage::not_fired("RF"),
            ],
        }
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(Some(290), Some(3)), "290-3X");
        assert_eq!(format_points(Some(88), None), "88-0X");
        assert_eq!(format_points(None, Some(2)), "-");
    }

    #[test]
    fn test_format_totals_dnf() {
        let totals = compute_totals(&[Stage::not_fired("SF")]);
        assert_eq!(format_totals(&totals), "DNF");
        let totals = compute_totals(&[Stage::fired("SF", 0, 0)]);
        assert_eq!(format_totals(&totals), "0-0X");
    }

    #[test]
    fn test_caliber_label() {
        assert_eq!(caliber_label("TWENTYTWO"), ".22");
        assert_eq!(caliber_label("CENTERFIRE"), "CF");
        assert_eq!(caliber_label("FORTYFIVE"), ".45");
        assert_eq!(caliber_label("AIR"), "AIR");
    }

    #[test]
    fn test_should_use_colors_forced() {
        assert!(should_use_colors(ColorMode::Always));
        assert!(!should_use_colors(ColorMode::Never));
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Short", 20), "Short");
        assert_eq!(truncate_name("This is a very long name", 15), "This is a ve...");
        assert_eq!(truncate_name("Hello world", 3), "Hel");
    }

    #[test]
    fn test_format_shooter_table() {
        assert_eq!(format_shooter_table(&[], false), "No shooters found.");
        let shooters = vec![Shooter {
            id: 2,
            name: "Bo Reyes".to_string(),
            club: Some("Rio Grande PC".to_string()),
            nra_number: Some("A123".to_string()),
        }];
        let table = format_shooter_table(&shooters, false);
        assert!(table.starts_with("     2  A123"));
        assert!(table.contains("Bo Reyes"));
        assert!(table.contains("Rio Grande PC"));
    }

    #[test]
    fn test_format_match_detail() {
        let detail = format_match_detail(&sample_match(), false);
        assert!(detail.starts_with("Spring Regional (#4)"));
        assert!(detail.contains("Date: 2024-04-13"));
        assert!(detail.contains("NMC .22 [NMC], max 300"));
        assert!(detail.contains("Sustained: TF + RF"));
        assert!(detail.contains("Calibers: .22"));
    }

    #[test]
    fn test_format_score_detail_with_config() {
        let m = sample_match();
        let detail = format_score_detail(&sample_score(), m.match_types.first(), None, false);
        assert!(detail.starts_with("Shooter #2 - NMC .22 (.22), match #4"));
        assert!(detail.contains(&format!("{:<6} {:>8}", "SF", "95-1X")));
        assert!(detail.contains(&format!("{:<6} {:>8}", "RF", "-")));
        assert!(detail.contains("Sustained"));
        assert!(detail.contains("193-3X / 300"));
    }

    #[test]
    fn test_format_score_table() {
        let table = format_score_table(&[sample_score()], &HashMap::new(), false);
        assert!(table.contains("193-3X"));
        assert!(table.contains("NMC .22"));
        assert!(table.contains("Shooter #2"));
    }
}
