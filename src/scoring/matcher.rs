use serde::Serialize;
use std::fmt;

use crate::api::types::{Match, MatchTypeConfig, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// `match_type_instance` named the configuration directly.
    Exact,
    /// Resolved by comparing stage names against entry stages.
    Fallback,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchTypeMatch<'a> {
    pub config: &'a MatchTypeConfig,
    pub kind: MatchKind,
}

/// A configured match type as listed in a not-found diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfiguredStages {
    pub instance_name: String,
    pub entry_stages: Vec<String>,
}

/// No match type of the match could be tied to a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchTypeNotFound {
    pub match_id: u64,
    pub score_id: Option<u64>,
    pub instance_name: String,
    pub score_stages: Vec<String>,
    pub available: Vec<ConfiguredStages>,
}

impl fmt::Display for MatchTypeNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.score_id {
            Some(id) => write!(f, "score {}", id)?,
            None => write!(f, "score")?,
        }
        write!(
            f,
            " in match {}: no match type '{}' and no configuration fits stages [{}]",
            self.match_id,
            self.instance_name,
            self.score_stages.join(", ")
        )?;
        if self.available.is_empty() {
            write!(f, "; the match has no match types configured")
        } else {
            let configured: Vec<String> = self
                .available
                .iter()
                .map(|c| format!("{} [{}]", c.instance_name, c.entry_stages.join(", ")))
                .collect();
            write!(f, "; configured: {}", configured.join("; "))
        }
    }
}

impl std::error::Error for MatchTypeNotFound {}

/// Strip trailing ASCII digits: `"SF1"` -> `"SF"`, `"RF12"` -> `"RF"`.
fn stage_base(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Whether a stage name recorded on a score corresponds to a configured
/// entry stage: equal, or one is a prefix of the other once trailing digits
/// are stripped from the entry stage.
pub fn stage_corresponds(score_stage: &str, entry_stage: &str) -> bool {
    if score_stage == entry_stage {
        return true;
    }
    let base = stage_base(entry_stage);
    if base.is_empty() || score_stage.is_empty() {
        return false;
    }
    score_stage.starts_with(base) || base.starts_with(score_stage)
}

fn covers_stages(config: &MatchTypeConfig, score: &Score) -> bool {
    !score.stages.is_empty()
        && score.stages.iter().all(|stage| {
            config
                .entry_stages
                .iter()
                .any(|entry| stage_corresponds(&stage.name, entry))
        })
}

/// Find the match type configuration a score was recorded against.
///
/// An exact `instance_name` hit always wins. Otherwise the first
/// configuration (in match order) whose entry stages cover every stage of
/// the score is used.
pub fn find_matching_type<'a>(
    score: &Score,
    match_config: &'a Match,
) -> Result<MatchTypeMatch<'a>, MatchTypeNotFound> {
    if let Some(config) = match_config.match_type(&score.match_type_instance) {
        return Ok(MatchTypeMatch {
            config,
            kind: MatchKind::Exact,
        });
    }

    if let Some(config) = match_config
        .match_types
        .iter()
        .find(|config| covers_stages(config, score))
    {
        tracing::warn!(
            "Score {} names match type '{}' which is not configured; using '{}' by stage names",
            score.id.map(|id| id.to_string()).unwrap_or_else(|| "(new)".to_string()),
            score.match_type_instance,
            config.instance_name
        );
        return Ok(MatchTypeMatch {
            config,
            kind: MatchKind::Fallback,
        });
    }

    Err(MatchTypeNotFound {
        match_id: match_config.id,
        score_id: score.id,
        instance_name: score.match_type_instance.clone(),
        score_stages: score.stage_names(),
        available: match_config
            .match_types
            .iter()
            .map(|c| ConfiguredStages {
                instance_name: c.instance_name.clone(),
                entry_stages: c.entry_stages.clone(),
            })
            .collect(),
    })
}
