use anyhow::{Context, Result};
use std::path::Path;

use super::{confirm, CommandContext, InvalidInput};
use crate::access::Permit;
use crate::api::types::MatchInput;
use crate::output::{format_match_detail, format_match_table};
use crate::scoring::validate_match_input;

/// Read and validate a match definition from a YAML file.
pub fn load_match_file(path: &Path) -> Result<MatchInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read match file {}", path.display()))?;
    let input: MatchInput = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse match file: invalid YAML in {}", path.display()))?;
    validate_match_input(&input).map_err(InvalidInput)?;
    Ok(input)
}

pub async fn list(ctx: &CommandContext) -> Result<()> {
    let mut matches = ctx.client.list_matches().await?;
    matches.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    ctx.emit(&matches, || format_match_table(&matches, ctx.use_colors))
}

pub async fn show(ctx: &CommandContext, id: u64) -> Result<()> {
    let m = ctx.client.get_match(id).await?;
    ctx.emit(&m, || format_match_detail(&m, ctx.use_colors))
}

pub async fn add(ctx: &CommandContext, permit: &Permit, file: &Path) -> Result<()> {
    let input = load_match_file(file)?;
    let created = ctx.client.create_match(permit, &input).await?;
    tracing::debug!("{} created match {}", permit.username(), created.id);
    ctx.emit(&created, || format!("Added {}", format_match_detail(&created, ctx.use_colors)))
}

pub async fn edit(ctx: &CommandContext, permit: &Permit, id: u64, file: &Path) -> Result<()> {
    let input = load_match_file(file)?;
    let updated = ctx.client.update_match(permit, id, &input).await?;
    ctx.emit(&updated, || format!("Updated {}", format_match_detail(&updated, ctx.use_colors)))
}

pub async fn delete(ctx: &CommandContext, permit: &Permit, id: u64, yes: bool) -> Result<()> {
    let m = ctx.client.get_match(id).await?;
    if !confirm(&format!("match {} (#{}) and all its scores", m.name, m.id), yes)? {
        println!("Aborted.");
        return Ok(());
    }
    ctx.client.delete_match(permit, id).await?;
    println!("Deleted match #{}", id);
    Ok(())
}
