use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::api::types::{MatchTypeConfig, Stage};

/// One `--stage` flag: `SF=96:3` (score 96, 3 Xs), `SF=96` (no Xs) or
/// `SF=-` (not fired).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArg {
    pub name: String,
    pub value: Option<(u32, u32)>,
}

impl FromStr for StageArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected STAGE=SCORE[:X] or STAGE=-, got '{}'", s))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing stage name in '{}'", s));
        }

        let value = value.trim();
        if value == "-" {
            return Ok(StageArg {
                name: name.to_string(),
                value: None,
            });
        }

        let (score, x_count) = match value.split_once(':') {
            Some((score, x)) => (score, x),
            None => (value, "0"),
        };
        let score: u32 = score
            .trim()
            .parse()
            .map_err(|_| format!("invalid score '{}' for stage {}", score, name))?;
        let x_count: u32 = x_count
            .trim()
            .trim_end_matches(['X', 'x'])
            .parse()
            .map_err(|_| format!("invalid X count '{}' for stage {}", x_count, name))?;

        Ok(StageArg {
            name: name.to_string(),
            value: Some((score, x_count)),
        })
    }
}

impl fmt::Display for StageArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some((score, x)) => write!(f, "{}={}:{}", self.name, score, x),
            None => write!(f, "{}=-", self.name),
        }
    }
}

fn to_stage(name: &str, value: Option<(u32, u32)>) -> Stage {
    match value {
        Some((score, x)) => Stage::fired(name, score, x),
        None => Stage::not_fired(name),
    }
}

fn find_name<'a>(names: impl Iterator<Item = &'a str>, wanted: &str) -> Option<&'a str> {
    let names: Vec<&str> = names.collect();
    names
        .iter()
        .find(|n| **n == wanted)
        .or_else(|| names.iter().find(|n| n.eq_ignore_ascii_case(wanted)))
        .copied()
}

/// Build the stages of a new score. Stages come out in entry-stage order;
/// entry stages without a flag are recorded as not fired.
pub fn build_stages(config: &MatchTypeConfig, args: &[StageArg]) -> Result<Vec<Stage>, Vec<String>> {
    let mut errors = Vec::new();
    let mut given: HashMap<&str, Option<(u32, u32)>> = HashMap::new();

    for arg in args {
        match find_name(config.entry_stages.iter().map(String::as_str), &arg.name) {
            Some(entry) => {
                if given.insert(entry, arg.value).is_some() {
                    errors.push(format!("stage {} given more than once", entry));
                }
            }
            None => errors.push(format!(
                "'{}' is not a stage of '{}' ({})",
                arg.name,
                config.instance_name,
                config.entry_stages.join(", ")
            )),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(config
        .entry_stages
        .iter()
        .map(|entry| to_stage(entry, given.get(entry.as_str()).copied().flatten()))
        .collect())
}

/// Overwrite stages of an existing score. Only stages the score already
/// has can be changed.
pub fn apply_stage_args(stages: &[Stage], args: &[StageArg]) -> Result<Vec<Stage>, Vec<String>> {
    let mut updated = stages.to_vec();
    let mut errors = Vec::new();

    for arg in args {
        let found = find_name(stages.iter().map(|s| s.name.as_str()), &arg.name)
            .and_then(|name| updated.iter_mut().find(|s| s.name == name));
        match found {
            Some(stage) => *stage = to_stage(&stage.name.clone(), arg.value),
            None => {
                let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
                errors.push(format!(
                    "score has no stage '{}' ({})",
                    arg.name,
                    names.join(", ")
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(updated)
    } else {
        Err(errors)
    }
}
