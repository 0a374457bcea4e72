use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::api::types::{Match, Score, Shooter};
use crate::api::{ApiClient, ApiError};
use crate::scoring::{find_matching_type, HistoryMatch, HistoryScore, MatchTypeNotFound};

const MAX_CONCURRENT_MATCH_FETCHES: usize = 8;

/// A shooter's scores grouped by match, each resolved to its configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ShooterHistory {
    pub shooter: Shooter,
    pub matches: Vec<HistoryMatch>,
    pub unresolved: Vec<MatchTypeNotFound>,
    /// Matches whose configuration could not be fetched; their scores are left out.
    pub failed_matches: Vec<u64>,
}

/// Group scores by match id.
fn group_by_match(scores: Vec<Score>) -> BTreeMap<u64, Vec<Score>> {
    let mut grouped: BTreeMap<u64, Vec<Score>> = BTreeMap::new();
    for score in scores {
        grouped.entry(score.match_id).or_default().push(score);
    }
    grouped
}

/// Resolve each score of a match to its match type. Scores that cannot be
/// resolved stay in the history without a configuration.
fn resolve_scores(match_info: Match, scores: Vec<Score>) -> (HistoryMatch, Vec<MatchTypeNotFound>) {
    let mut unresolved = Vec::new();
    let resolved = scores
        .into_iter()
        .map(|score| {
            let match_type = match find_matching_type(&score, &match_info) {
                Ok(found) => Some(found.config.clone()),
                Err(not_found) => {
                    tracing::warn!("{}", not_found);
                    unresolved.push(not_found);
                    None
                }
            };
            HistoryScore { score, match_type }
        })
        .collect();
    (
        HistoryMatch {
            match_info,
            scores: resolved,
        },
        unresolved,
    )
}

/// Build the history from fetched matches, oldest match first.
fn assemble_history(
    shooter: Shooter,
    mut scores_by_match: BTreeMap<u64, Vec<Score>>,
    matches: Vec<Match>,
    failed_matches: Vec<u64>,
) -> ShooterHistory {
    let mut history = Vec::new();
    let mut unresolved = Vec::new();

    for match_info in matches {
        let scores = scores_by_match.remove(&match_info.id).unwrap_or_default();
        let (entry, mut missing) = resolve_scores(match_info, scores);
        history.push(entry);
        unresolved.append(&mut missing);
    }

    history.sort_by(|a, b| {
        a.match_info
            .date
            .cmp(&b.match_info.date)
            .then_with(|| a.match_info.id.cmp(&b.match_info.id))
    });

    ShooterHistory {
        shooter,
        matches: history,
        unresolved,
        failed_matches,
    }
}

/// Fetch a shooter's match history.
///
/// Match configurations are fetched with bounded concurrency. A match that
/// fails to load is logged and skipped; if every match fails the whole
/// fetch fails.
pub async fn fetch_shooter_history(client: &ApiClient, shooter_id: u64) -> Result<ShooterHistory> {
    let (shooter, scores) = tokio::try_join!(
        client.get_shooter(shooter_id),
        client.list_shooter_scores(shooter_id)
    )
    .with_context(|| format!("Failed to fetch scores for shooter {}", shooter_id))?;

    let scores_by_match = group_by_match(scores);
    tracing::debug!(
        "Shooter {} has scores in {} matches",
        shooter_id,
        scores_by_match.len()
    );

    let mut futures = FuturesUnordered::new();
    let mut ids = scores_by_match.keys().copied().collect::<Vec<_>>().into_iter();
    let mut matches = Vec::new();
    let mut failed = Vec::new();

    // Fill initial batch
    for _ in 0..MAX_CONCURRENT_MATCH_FETCHES {
        if let Some(id) = ids.next() {
            futures.push(fetch_match(client, id));
        }
    }

    // Process results and feed new tasks
    while let Some((id, result)) = futures.next().await {
        match result {
            Ok(m) => matches.push(m),
            Err(e) => {
                tracing::warn!("Skipping match {}: {}", id, e);
                failed.push(id);
            }
        }
        if let Some(next_id) = ids.next() {
            futures.push(fetch_match(client, next_id));
        }
    }

    if matches.is_empty() && !failed.is_empty() {
        anyhow::bail!(
            "Could not load any of the {} matches shot by shooter {}",
            failed.len(),
            shooter_id
        );
    }
    failed.sort_unstable();

    Ok(assemble_history(shooter, scores_by_match, matches, failed))
}

async fn fetch_match(client: &ApiClient, id: u64) -> (u64, Result<Match, ApiError>) {
    (id, client.get_match(id).await)
}

/// Everything a match report needs, fetched concurrently.
pub async fn fetch_match_report_data(
    client: &ApiClient,
    match_id: u64,
) -> Result<(Match, Vec<Score>, HashMap<u64, Shooter>)> {
    let (match_info, scores, shooters) = tokio::try_join!(
        client.get_match(match_id),
        client.list_match_scores(match_id),
        client.list_shooters()
    )
    .with_context(|| format!("Failed to fetch match {}", match_id))?;

    let shooters = shooters.into_iter().map(|s| (s.id, s)).collect();
    Ok((match_info, scores, shooters))
}
