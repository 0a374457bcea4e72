use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

use super::stages::{apply_stage_args, build_stages, StageArg};
use super::{confirm, CommandContext, InvalidInput};
use crate::access::Permit;
use crate::api::types::{Match, MatchTypeConfig, Score};
use crate::output::{format_score_detail, format_score_table};
use crate::scoring::{
    compute_subtotals, compute_totals, find_matching_type, validate_score, MatchKind, Subtotal,
    Totals,
};

/// A score with everything derived from it, as printed by `--json`.
#[derive(Debug, Serialize)]
struct ScoreView<'a> {
    score: &'a Score,
    totals: Totals,
    subtotals: Vec<Subtotal>,
    match_type: Option<&'a str>,
    matched_by: Option<MatchKind>,
}

fn score_view<'a>(score: &'a Score, m: &'a Match) -> (ScoreView<'a>, Option<&'a MatchTypeConfig>) {
    let found = match find_matching_type(score, m) {
        Ok(found) => Some(found),
        Err(not_found) => {
            tracing::warn!("{}", not_found);
            None
        }
    };
    let config = found.map(|f| f.config);
    let view = ScoreView {
        score,
        totals: compute_totals(&score.stages),
        subtotals: config
            .map(|c| compute_subtotals(&score.stages, &c.subtotal_mappings))
            .unwrap_or_default(),
        match_type: config.map(|c| c.instance_name.as_str()),
        matched_by: found.map(|f| f.kind),
    };
    (view, config)
}

pub async fn list(ctx: &CommandContext, match_id: u64) -> Result<()> {
    let (scores, shooters) = tokio::try_join!(
        ctx.client.list_match_scores(match_id),
        ctx.client.list_shooters()
    )?;
    let shooters: HashMap<u64, _> = shooters.into_iter().map(|s| (s.id, s)).collect();
    ctx.emit(&scores, || format_score_table(&scores, &shooters, ctx.use_colors))
}

pub async fn show(ctx: &CommandContext, id: u64) -> Result<()> {
    let score = ctx.client.get_score(id).await?;
    let (m, shooter) = tokio::try_join!(
        ctx.client.get_match(score.match_id),
        ctx.client.get_shooter(score.shooter_id)
    )?;
    let (view, config) = score_view(&score, &m);
    ctx.emit(&view, || {
        format_score_detail(&score, config, Some(&shooter), ctx.use_colors)
    })
}

/// Flags of `scores add`.
#[derive(Debug, Clone)]
pub struct NewScore {
    pub match_id: u64,
    pub shooter_id: u64,
    pub instance: String,
    pub caliber: String,
    pub stages: Vec<StageArg>,
}

/// Resolve the match type and build a validated score from flags.
fn prepare_score(m: &Match, new: NewScore) -> Result<Score, InvalidInput> {
    let Some(config) = m.match_type(&new.instance) else {
        let available: Vec<&str> = m.match_types.iter().map(|c| c.instance_name.as_str()).collect();
        return Err(InvalidInput(vec![format!(
            "match {} has no match type '{}' (available: {})",
            m.id,
            new.instance,
            available.join(", ")
        )]));
    };
    let stages = build_stages(config, &new.stages).map_err(InvalidInput)?;
    let score = Score {
        id: None,
        shooter_id: new.shooter_id,
        match_id: m.id,
        match_type_instance: config.instance_name.clone(),
        caliber: new.caliber.trim().to_string(),
        stages,
    };
    validate_score(&score, config).map_err(InvalidInput)?;
    Ok(score)
}

pub async fn add(ctx: &CommandContext, permit: &Permit, new: NewScore) -> Result<()> {
    let (m, shooter) = tokio::try_join!(
        ctx.client.get_match(new.match_id),
        ctx.client.get_shooter(new.shooter_id)
    )?;
    let score = prepare_score(&m, new)?;
    let created = ctx.client.create_score(permit, &score).await?;
    tracing::debug!(
        "{} recorded score {:?} for shooter {}",
        permit.username(),
        created.id,
        shooter.id
    );
    let (view, config) = score_view(&created, &m);
    ctx.emit(&view, || {
        format!(
            "Recorded {}",
            format_score_detail(&created, config, Some(&shooter), ctx.use_colors)
        )
    })
}

/// Changes requested by `scores edit`.
#[derive(Debug, Clone, Default)]
pub struct ScoreChanges {
    pub caliber: Option<String>,
    pub stages: Vec<StageArg>,
}

fn apply_score_changes(m: &Match, mut score: Score, changes: ScoreChanges) -> Result<Score, InvalidInput> {
    if let Some(caliber) = changes.caliber {
        score.caliber = caliber.trim().to_string();
    }
    score.stages = apply_stage_args(&score.stages, &changes.stages).map_err(InvalidInput)?;
    let found = find_matching_type(&score, m).map_err(|not_found| InvalidInput(vec![not_found.to_string()]))?;
    validate_score(&score, found.config).map_err(InvalidInput)?;
    Ok(score)
}

pub async fn edit(ctx: &CommandContext, permit: &Permit, id: u64, changes: ScoreChanges) -> Result<()> {
    let current = ctx.client.get_score(id).await?;
    let m = ctx.client.get_match(current.match_id).await?;
    let score = apply_score_changes(&m, current, changes)?;
    let updated = ctx.client.update_score(permit, id, &score).await?;
    let (view, config) = score_view(&updated, &m);
    ctx.emit(&view, || {
        format!(
            "Updated {}",
            format_score_detail(&updated, config, None, ctx.use_colors)
        )
    })
}

pub async fn delete(ctx: &CommandContext, permit: &Permit, id: u64, yes: bool) -> Result<()> {
    let score = ctx.client.get_score(id).await?;
    let what = format!(
        "score #{} ({} in match #{})",
        id, score.match_type_instance, score.match_id
    );
    if !confirm(&what, yes)? {
        println!("Aborted.");
        return Ok(());
    }
    ctx.client.delete_score(permit, id).await?;
    println!("Deleted score #{}", id);
    Ok(())
}
