use anyhow::Result;

use super::{confirm, CommandContext, InvalidInput};
use crate::access::Permit;
use crate::api::types::ShooterInput;
use crate::output::{format_shooter_detail, format_shooter_table};

/// Changes requested by `shooters add` / `shooters edit`.
#[derive(Debug, Clone, Default)]
pub struct ShooterChanges {
    pub name: Option<String>,
    /// `Some("")` clears the field
    pub club: Option<String>,
    pub nra_number: Option<String>,
}

fn clearable(value: Option<String>, current: Option<String>) -> Option<String> {
    match value {
        Some(v) if v.trim().is_empty() => None,
        Some(v) => Some(v.trim().to_string()),
        None => current,
    }
}

fn apply_changes(mut input: ShooterInput, changes: ShooterChanges) -> Result<ShooterInput, InvalidInput> {
    if let Some(name) = changes.name {
        input.name = name.trim().to_string();
    }
    input.club = clearable(changes.club, input.club);
    input.nra_number = clearable(changes.nra_number, input.nra_number);

    if input.name.is_empty() {
        return Err(InvalidInput(vec!["name: must not be empty".to_string()]));
    }
    Ok(input)
}

pub async fn list(ctx: &CommandContext) -> Result<()> {
    let mut shooters = ctx.client.list_shooters().await?;
    shooters.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    ctx.emit(&shooters, || format_shooter_table(&shooters, ctx.use_colors))
}

pub async fn show(ctx: &CommandContext, id: u64) -> Result<()> {
    let shooter = ctx.client.get_shooter(id).await?;
    ctx.emit(&shooter, || format_shooter_detail(&shooter, ctx.use_colors))
}

pub async fn add(ctx: &CommandContext, permit: &Permit, changes: ShooterChanges) -> Result<()> {
    let empty = ShooterInput {
        name: String::new(),
        club: None,
        nra_number: None,
    };
    let input = apply_changes(empty, changes)?;
    let shooter = ctx.client.create_shooter(permit, &input).await?;
    tracing::debug!("{} added shooter {}", permit.username(), shooter.id);
    ctx.emit(&shooter, || format!("Added {}", format_shooter_detail(&shooter, ctx.use_colors)))
}

pub async fn edit(ctx: &CommandContext, permit: &Permit, id: u64, changes: ShooterChanges) -> Result<()> {
    let current = ctx.client.get_shooter(id).await?;
    let input = apply_changes(
        ShooterInput {
            name: current.name,
            club: current.club,
            nra_number: current.nra_number,
        },
        changes,
    )?;
    let shooter = ctx.client.update_shooter(permit, id, &input).await?;
    ctx.emit(&shooter, || format!("Updated {}", format_shooter_detail(&shooter, ctx.use_colors)))
}

pub async fn delete(ctx: &CommandContext, permit: &Permit, id: u64, yes: bool) -> Result<()> {
    let shooter = ctx.client.get_shooter(id).await?;
    if !confirm(&format!("shooter {} (#{})", shooter.name, shooter.id), yes)? {
        println!("Aborted.");
        return Ok(());
    }
    ctx.client.delete_shooter(permit, id).await?;
    println!("Deleted shooter #{}", id);
    Ok(())
}
