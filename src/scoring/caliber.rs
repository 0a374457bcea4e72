use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::totals::compute_totals;
use crate::api::types::{Match, MatchTypeConfig, Score};

/// Which matches of a shooter's history to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    pub fn includes(&self, year: i32) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Year(y) => *y == year,
        }
    }
}

impl FromStr for YearFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(YearFilter::All);
        }
        match s.parse::<i32>() {
            Ok(year) if (1900..=9999).contains(&year) => Ok(YearFilter::Year(year)),
            _ => bail!("expected 'all' or a four-digit year, got '{}'", s),
        }
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearFilter::All => write!(f, "all"),
            YearFilter::Year(y) => write!(f, "{}", y),
        }
    }
}

/// A score from a shooter's history with the configuration it resolved to.
/// `match_type` is `None` when the configuration could not be found.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryScore {
    pub score: Score,
    pub match_type: Option<MatchTypeConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryMatch {
    #[serde(rename = "match")]
    pub match_info: Match,
    pub scores: Vec<HistoryScore>,
}

/// Stage class used for caliber statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageClass {
    SlowFire,
    TimedFire,
    RapidFire,
}

/// Classify a stage by substring, checking SF, then TF, then RF.
pub fn classify_stage(name: &str) -> Option<StageClass> {
    if name.contains("SF") {
        Some(StageClass::SlowFire)
    } else if name.contains("TF") {
        Some(StageClass::TimedFire)
    } else if name.contains("RF") {
        Some(StageClass::RapidFire)
    } else {
        None
    }
}

fn is_nmc(entry: &HistoryScore) -> bool {
    entry
        .match_type
        .as_ref()
        .is_some_and(|mt| mt.kind == "NMC")
        || entry.score.match_type_instance.contains("NMC")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average of one category. `count` is the number of entries that went
/// into it, so a zero average with a zero count means "no data".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryAverage {
    pub count: u32,
    pub score_avg: f64,
    pub x_count_avg: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: u32,
    score_sum: u64,
    x_count_sum: u64,
}

impl Accumulator {
    fn add(&mut self, score: u32, x_count: u32) {
        self.count += 1;
        self.score_sum += u64::from(score);
        self.x_count_sum += u64::from(x_count);
    }

    fn average(&self) -> CategoryAverage {
        if self.count == 0 {
            return CategoryAverage {
                count: 0,
                score_avg: 0.0,
                x_count_avg: 0.0,
            };
        }
        let n = f64::from(self.count);
        CategoryAverage {
            count: self.count,
            score_avg: round2(self.score_sum as f64 / n),
            x_count_avg: round2(self.x_count_sum as f64 / n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaliberStats {
    /// Scores in this caliber with at least one fired stage. Counts
    /// entries, not distinct matches: two match types fired with the same
    /// caliber at one match count twice.
    pub matches_count: u32,
    pub total: CategoryAverage,
    pub slow_fire: CategoryAverage,
    pub timed_fire: CategoryAverage,
    pub rapid_fire: CategoryAverage,
    pub nmc: CategoryAverage,
}

#[derive(Default)]
struct CaliberAccumulator {
    total: Accumulator,
    slow_fire: Accumulator,
    timed_fire: Accumulator,
    rapid_fire: Accumulator,
    nmc: Accumulator,
}

impl CaliberAccumulator {
    fn add(&mut self, entry: &HistoryScore) {
        let totals = compute_totals(&entry.score.stages);
        if let Some(total) = totals.total_score {
            let x_count = totals.total_x_count.unwrap_or(0);
            self.total.add(total, x_count);
            if is_nmc(entry) {
                self.nmc.add(total, x_count);
            }
        }

        for stage in &entry.score.stages {
            let Some(score) = stage.score else {
                continue;
            };
            let x_count = stage.x_count.unwrap_or(0);
            match classify_stage(&stage.name) {
                Some(StageClass::SlowFire) => self.slow_fire.add(score, x_count),
                Some(StageClass::TimedFire) => self.timed_fire.add(score, x_count),
                Some(StageClass::RapidFire) => self.rapid_fire.add(score, x_count),
                None => {}
            }
        }
    }

    fn finish(&self) -> CaliberStats {
        CaliberStats {
            matches_count: self.total.count,
            total: self.total.average(),
            slow_fire: self.slow_fire.average(),
            timed_fire: self.timed_fire.average(),
            rapid_fire: self.rapid_fire.average(),
            nmc: self.nmc.average(),
        }
    }
}

/// Per-caliber averages over a shooter's match history.
///
/// Every category divides by its own count: the slow fire average is per
/// slow fire stage fired, the NMC average per NMC entry with a score.
pub fn compute_caliber_averages(
    history: &[HistoryMatch],
    year_filter: YearFilter,
) -> BTreeMap<String, CaliberStats> {
    let mut by_caliber: BTreeMap<String, CaliberAccumulator> = BTreeMap::new();

    for entry in history
        .iter()
        .filter(|m| year_filter.includes(m.match_info.year()))
    {
        for scored in &entry.scores {
            by_caliber
                .entry(scored.score.caliber.clone())
                .or_default()
                .add(scored);
        }
    }

    by_caliber
        .into_iter()
        .map(|(caliber, acc)| (caliber, acc.finish()))
        .collect()
}
