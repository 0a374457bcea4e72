use owo_colors::OwoColorize;
use std::collections::BTreeMap;

use super::formatter::{caliber_label, format_points, format_totals, name_width, truncate_name};
use crate::fetch::ShooterHistory;
use crate::scoring::report::{AggregateTable, Leaderboard};
use crate::scoring::{
    compute_totals, CaliberStats, CategoryAverage, MatchKind, MatchReport, MatchTypeNotFound,
    YearFilter,
};

fn heading(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.bold().underline().to_string()
    } else {
        text.to_string()
    }
}

fn place_label(place: Option<usize>) -> String {
    match place {
        Some(p) => format!("{:>3}.", p),
        None => "   -".to_string(),
    }
}

fn format_leaderboard(board: &Leaderboard, use_colors: bool) -> String {
    let title = format!("{} [{}], max {}", board.instance_name, board.kind, board.max_score);
    let mut lines = vec![heading(&title, use_colors)];
    if board.rows.is_empty() {
        lines.push("  No scores.".to_string());
        return lines.join("\n");
    }

    let width = name_width(4 + 2 + 8 + 2 + 8 + 2 + 30);
    for row in &board.rows {
        let total = format!("{:>8}", format_totals(&row.totals));
        let name = truncate_name(&row.shooter_name, width.unwrap_or(usize::MAX).min(30));
        let subtotals: Vec<String> = row
            .subtotals
            .iter()
            .map(|s| format!("{} {}", s.name, format_points(Some(s.score), Some(s.x_count))))
            .collect();
        let mut extra = subtotals.join(", ");
        if row.matched_by == MatchKind::Fallback {
            if !extra.is_empty() {
                extra.push_str(", ");
            }
            extra.push_str("matched by stages");
        }
        let caliber = format!("{:<8}", caliber_label(&row.caliber));
        let name = format!("{:<30}", name);
        let line = if use_colors {
            format!(
                "{}  {}  {}  {}  {}",
                place_label(row.place).dimmed(),
                total.bold(),
                caliber.cyan(),
                name,
                extra.dimmed()
            )
        } else {
            format!(
                "{}  {}  {}  {}  {}",
                place_label(row.place),
                total,
                caliber,
                name,
                extra
            )
        };
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}

fn format_aggregate(table: &AggregateTable, use_colors: bool) -> String {
    let title = format!("Aggregate {}, max {}", table.aggregate_type, table.max_score);
    let mut lines = vec![heading(&title, use_colors)];
    if table.rows.is_empty() {
        lines.push("  No scores.".to_string());
        return lines.join("\n");
    }
    for row in &table.rows {
        let total = format!("{:>8}", format_totals(&row.totals));
        let entries = format!("({} entries)", row.entries);
        if use_colors {
            lines.push(format!(
                "{}  {}  {}  {}",
                place_label(row.place).dimmed(),
                total.bold(),
                row.shooter_name,
                entries.dimmed()
            ));
        } else {
            lines.push(format!(
                "{}  {}  {}  {}",
                place_label(row.place),
                total,
                row.shooter_name,
                entries
            ));
        }
    }
    lines.join("\n")
}

/// Scores that could not be tied to a match type, one per line.
pub fn format_unresolved(unresolved: &[MatchTypeNotFound], use_colors: bool) -> String {
    if unresolved.is_empty() {
        return String::new();
    }
    let title = format!("{} unresolved score(s):", unresolved.len());
    let mut lines = vec![if use_colors {
        title.yellow().bold().to_string()
    } else {
        title
    }];
    lines.extend(unresolved.iter().map(|u| format!("  {}", u)));
    lines.join("\n")
}

pub fn format_match_report(report: &MatchReport, use_colors: bool) -> String {
    let mut header = format!("{} (#{}), {}", report.name, report.match_id, report.date);
    if !report.location.is_empty() {
        header.push_str(&format!(", {}", report.location));
    }
    let mut sections = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    if report.leaderboards.is_empty() {
        sections.push("No match types configured.".to_string());
    }
    sections.extend(
        report
            .leaderboards
            .iter()
            .map(|board| format_leaderboard(board, use_colors)),
    );
    if let Some(aggregate) = &report.aggregate {
        sections.push(format_aggregate(aggregate, use_colors));
    }
    if !report.unresolved.is_empty() {
        sections.push(format_unresolved(&report.unresolved, use_colors));
    }
    sections.join("\n\n")
}

fn format_average(label: &str, average: &CategoryAverage) -> String {
    if average.count == 0 {
        format!("  {:<12} {:>8}", label, "-")
    } else {
        format!(
            "  {:<12} {:>8.2} {:>6.2}X  (n={})",
            label, average.score_avg, average.x_count_avg, average.count
        )
    }
}

pub fn format_caliber_stats(
    stats: &BTreeMap<String, CaliberStats>,
    year: YearFilter,
    use_colors: bool,
) -> String {
    if stats.is_empty() {
        return match year {
            YearFilter::All => "No scores recorded.".to_string(),
            YearFilter::Year(y) => format!("No scores recorded in {}.", y),
        };
    }

    stats
        .iter()
        .map(|(caliber, s)| {
            let title = format!("{} ({} matches)", caliber_label(caliber), s.matches_count);
            [
                heading(&title, use_colors),
                format_average("Total", &s.total),
                format_average("Slow fire", &s.slow_fire),
                format_average("Timed fire", &s.timed_fire),
                format_average("Rapid fire", &s.rapid_fire),
                format_average("NMC", &s.nmc),
            ]
            .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Shooter report: caliber averages, then the matches they went into.
pub fn format_shooter_report(
    history: &ShooterHistory,
    stats: &BTreeMap<String, CaliberStats>,
    year: YearFilter,
    use_colors: bool,
) -> String {
    let scope = match year {
        YearFilter::All => "all years".to_string(),
        YearFilter::Year(y) => y.to_string(),
    };
    let header = format!("{} (#{}), {}", history.shooter.name, history.shooter.id, scope);
    let mut sections = vec![
        if use_colors {
            header.bold().to_string()
        } else {
            header
        },
        format_caliber_stats(stats, year, use_colors),
    ];

    let mut lines = Vec::new();
    for entry in history
        .matches
        .iter()
        .filter(|m| year.includes(m.match_info.year()))
    {
        lines.push(format!("{}  {}", entry.match_info.date, entry.match_info.name));
        for scored in &entry.scores {
            let total = format_totals(&compute_totals(&scored.score.stages));
            let of = scored
                .match_type
                .as_ref()
                .map(|mt| format!(" / {}", mt.max_score))
                .unwrap_or_default();
            lines.push(format!(
                "  {:<20} {:<8} {:>8}{}",
                truncate_name(&scored.score.match_type_instance, 20),
                caliber_label(&scored.score.caliber),
                total,
                of
            ));
        }
    }
    if !lines.is_empty() {
        sections.push(heading("Matches", use_colors) + "\n" + &lines.join("\n"));
    }

    if !history.failed_matches.is_empty() {
        let ids: Vec<String> = history.failed_matches.iter().map(u64::to_string).collect();
        sections.push(format!("Matches that could not be loaded: {}", ids.join(", ")));
    }
    if !history.unresolved.is_empty() {
        sections.push(format_unresolved(&history.unresolved, use_colors));
    }
    sections.join("\n\n")
}
