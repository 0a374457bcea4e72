use std::collections::HashSet;

use super::matcher::stage_corresponds;
use super::totals::compute_totals;
use crate::api::types::{MatchInput, MatchTypeConfig, Score};

/// Validate the match type configurations of a match before it is saved.
/// Returns all validation errors at once (not just the first).
pub fn validate_match_types(match_types: &[MatchTypeConfig]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut instance_names = HashSet::new();

    for (i, mt) in match_types.iter().enumerate() {
        let path = format!("match_types[{}]", i);

        if mt.kind.trim().is_empty() {
            errors.push(format!("{}.type: must not be empty", path));
        }

        if mt.instance_name.trim().is_empty() {
            errors.push(format!("{}.instance_name: must not be empty", path));
        } else if !instance_names.insert(mt.instance_name.as_str()) {
            errors.push(format!(
                "{}.instance_name: '{}' is used more than once in this match",
                path, mt.instance_name
            ));
        }

        if mt.max_score == 0 {
            errors.push(format!("{}.max_score: must be positive", path));
        }

        if mt.entry_stages.is_empty() {
            errors.push(format!("{}.entry_stages: at least one stage is required", path));
        }
        let mut seen_stages = HashSet::new();
        for stage in &mt.entry_stages {
            if stage.trim().is_empty() {
                errors.push(format!("{}.entry_stages: stage names must not be empty", path));
            } else if !seen_stages.insert(stage.as_str()) {
                errors.push(format!("{}.entry_stages: '{}' is listed twice", path, stage));
            }
        }

        for (name, sources) in mt.subtotal_mappings.iter() {
            for source in sources {
                if !mt.entry_stages.contains(source) {
                    errors.push(format!(
                        "{}.subtotal_mappings.{}: '{}' is not one of the entry stages",
                        path, name, source
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_match_input(input: &MatchInput) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if input.name.trim().is_empty() {
        errors.push("name: must not be empty".to_string());
    }
    if input.match_types.is_empty() {
        errors.push("match_types: at least one match type is required".to_string());
    }
    if let Err(mut type_errors) = validate_match_types(&input.match_types) {
        errors.append(&mut type_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a score against the match type it is recorded for.
pub fn validate_score(score: &Score, config: &MatchTypeConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if score.caliber.trim().is_empty() {
        errors.push("caliber: must not be empty".to_string());
    } else if !config.calibers.is_empty() && !config.calibers.contains(&score.caliber) {
        let allowed: Vec<&str> = config.calibers.iter().map(String::as_str).collect();
        errors.push(format!(
            "caliber: '{}' is not allowed in '{}' (allowed: {})",
            score.caliber,
            config.instance_name,
            allowed.join(", ")
        ));
    }

    for (i, stage) in score.stages.iter().enumerate() {
        if !config
            .entry_stages
            .iter()
            .any(|entry| stage_corresponds(&stage.name, entry))
        {
            errors.push(format!(
                "stages[{}]: '{}' is not a stage of '{}' ({})",
                i,
                stage.name,
                config.instance_name,
                config.entry_stages.join(", ")
            ));
        }
        if let Some(points) = stage.score.filter(|p| *p > config.max_score) {
            errors.push(format!(
                "stages[{}]: '{}' score {} exceeds the maximum of {} for '{}'",
                i, stage.name, points, config.max_score, config.instance_name
            ));
        }
        if stage.score.is_none() && stage.x_count.is_some_and(|x| x > 0) {
            errors.push(format!(
                "stages[{}]: '{}' has an X count but was not fired",
                i, stage.name
            ));
        }
    }

    if let Some(total) = compute_totals(&score.stages).total_score {
        if total > config.max_score {
            errors.push(format!(
                "total: {} exceeds the maximum of {} for '{}'",
                total, config.max_score, config.instance_name
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
