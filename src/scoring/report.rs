use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use super::matcher::{find_matching_type, MatchKind, MatchTypeNotFound};
use super::totals::{compute_subtotals, compute_totals, saturating_sum, Subtotal, Totals};
use crate::api::types::{AggregateType, Match, Score, Shooter};

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    /// Competition place; `None` for entries where nothing was fired.
    pub place: Option<usize>,
    pub score_id: Option<u64>,
    pub shooter_id: u64,
    pub shooter_name: String,
    pub caliber: String,
    pub totals: Totals,
    pub subtotals: Vec<Subtotal>,
    pub matched_by: MatchKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub instance_name: String,
    pub kind: String,
    pub max_score: u32,
    pub rows: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateRow {
    pub place: Option<usize>,
    pub shooter_id: u64,
    pub shooter_name: String,
    pub entries: usize,
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateTable {
    pub aggregate_type: AggregateType,
    pub max_score: u32,
    pub rows: Vec<AggregateRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub match_id: u64,
    pub name: String,
    pub date: chrono::NaiveDate,
    pub location: String,
    pub leaderboards: Vec<Leaderboard>,
    pub aggregate: Option<AggregateTable>,
    pub unresolved: Vec<MatchTypeNotFound>,
}

/// Descending by total then X count; unfired entries last.
fn compare_ranked(a: &Totals, b: &Totals) -> Ordering {
    match (a.rank_key(), b.rank_key()) {
        (Some(ka), Some(kb)) => kb.cmp(&ka),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Assign competition places ("1224" ranking) to rows already sorted by
/// `compare_ranked`. Rows with no fired stage get no place.
fn assign_places<T>(rows: &mut [T], totals: impl Fn(&T) -> Totals, mut set: impl FnMut(&mut T, Option<usize>)) {
    let mut previous: Option<(u32, u32)> = None;
    let mut place = 0;
    for (idx, row) in rows.iter_mut().enumerate() {
        let key = totals(row).rank_key();
        match key {
            Some(k) => {
                if previous != Some(k) {
                    place = idx + 1;
                    previous = Some(k);
                }
                set(row, Some(place));
            }
            None => set(row, None),
        }
    }
}

fn shooter_name(shooters: &HashMap<u64, Shooter>, id: u64) -> String {
    shooters
        .get(&id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("Shooter #{}", id))
}

/// Sum totals over a shooter's entries. Unfired entries add nothing; the
/// aggregate is all-null only when every entry was.
fn sum_totals(totals: &[Totals]) -> Totals {
    let fired: Vec<&Totals> = totals.iter().filter(|t| !t.all_null).collect();
    if fired.is_empty() {
        return Totals {
            total_score: None,
            total_x_count: None,
            all_null: true,
        };
    }
    Totals {
        total_score: Some(saturating_sum(fired.iter().filter_map(|t| t.total_score))),
        total_x_count: Some(saturating_sum(fired.iter().filter_map(|t| t.total_x_count))),
        all_null: false,
    }
}

/// Build per-match-type leaderboards and, for aggregate matches, the
/// aggregate table.
pub fn build_match_report(
    match_info: &Match,
    scores: &[Score],
    shooters: &HashMap<u64, Shooter>,
) -> MatchReport {
    let mut rows_by_instance: HashMap<&str, Vec<LeaderboardRow>> = HashMap::new();
    let mut unresolved = Vec::new();
    let mut per_shooter: HashMap<u64, Vec<Totals>> = HashMap::new();

    for score in scores.iter().filter(|s| s.match_id == match_info.id) {
        let totals = compute_totals(&score.stages);
        per_shooter.entry(score.shooter_id).or_default().push(totals);

        match find_matching_type(score, match_info) {
            Ok(found) => {
                rows_by_instance
                    .entry(found.config.instance_name.as_str())
                    .or_default()
                    .push(LeaderboardRow {
                        place: None,
                        score_id: score.id,
                        shooter_id: score.shooter_id,
                        shooter_name: shooter_name(shooters, score.shooter_id),
                        caliber: score.caliber.clone(),
                        totals,
                        subtotals: compute_subtotals(&score.stages, &found.config.subtotal_mappings),
                        matched_by: found.kind,
                    });
            }
            Err(not_found) => {
                tracing::warn!("{}", not_found);
                unresolved.push(not_found);
            }
        }
    }

    let leaderboards = match_info
        .match_types
        .iter()
        .map(|config| {
            let mut rows = rows_by_instance
                .remove(config.instance_name.as_str())
                .unwrap_or_default();
            rows.sort_by(|a, b| {
                compare_ranked(&a.totals, &b.totals).then_with(|| a.shooter_name.cmp(&b.shooter_name))
            });
            assign_places(&mut rows, |r| r.totals, |r, p| r.place = p);
            Leaderboard {
                instance_name: config.instance_name.clone(),
                kind: config.kind.clone(),
                max_score: config.max_score,
                rows,
            }
        })
        .collect();

    let aggregate = match_info.aggregate_type.map(|aggregate_type| {
        let mut rows: Vec<AggregateRow> = per_shooter
            .iter()
            .map(|(&shooter_id, totals)| AggregateRow {
                place: None,
                shooter_id,
                shooter_name: shooter_name(shooters, shooter_id),
                entries: totals.iter().filter(|t| !t.all_null).count(),
                totals: sum_totals(totals),
            })
            .collect();
        rows.sort_by(|a, b| {
            compare_ranked(&a.totals, &b.totals).then_with(|| a.shooter_name.cmp(&b.shooter_name))
        });
        assign_places(&mut rows, |r| r.totals, |r, p| r.place = p);
        AggregateTable {
            aggregate_type,
            max_score: aggregate_type.max_score(),
            rows,
        }
    });

    MatchReport {
        match_id: match_info.id,
        name: match_info.name.clone(),
        date: match_info.date,
        location: match_info.location.clone(),
        leaderboards,
        aggregate,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{subtotals, MatchTypeConfig, Stage};
    use chrono::NaiveDate;

    fn nine_hundred(instance: &str) -> MatchTypeConfig {
        MatchTypeConfig {
            kind: "900".to_string(),
            instance_name: instance.to_string(),
            entry_stages: vec!["SF".to_string(), "TF".to_string(), "RF".to_string()],
            subtotal_mappings: subtotals(&[("Sustained", &["TF", "RF"])]),
            max_score: 900,
            calibers: Default::default(),
        }
    }

    fn sample_match(aggregate: Option<AggregateType>) -> Match {
        Match {
            id: 5,
            name: "State Championship".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 7, 20).unwrap(),
            location: "Camp Perry".to_string(),
            match_types: vec![nine_hundred("900 .22"), nine_hundred("900 CF")],
            aggregate_type: aggregate,
        }
    }

    fn shooters() -> HashMap<u64, Shooter> {
        [(1, "Ada"), (2, "Bo"), (3, "Cy")]
            .into_iter()
            .map(|(id, name)| {
                (
                    id,
                    Shooter {
                        id,
                        name: name.to_string(),
                        club: None,
                        nra_number: None,
                    },
                )
            })
            .collect()
    }

    fn score(id: u64, shooter: u64, instance: &str, sf: Option<(u32, u32)>, tf: Option<(u32, u32)>) -> Score {
        let stage = |name: &str, v: Option<(u32, u32)>| match v {
            Some((s, x)) => Stage::fired(name, s, x),
            None => Stage::not_fired(name),
        };
        Score {
            id: Some(id),
            shooter_id: shooter,
            match_id: 5,
            match_type_instance: instance.to_string(),
            caliber: "TWENTYTWO".to_string(),
            stages: vec![stage("SF", sf), stage("TF", tf)],
        }
    }

    #[test]
    fn test_leaderboard_sorted_with_places() {
        let scores = vec![
            score(10, 1, "900 .22", Some((95, 2)), Some((97, 3))),
            score(11, 2, "900 .22", Some((96, 4)), Some((96, 2))),
            score(12, 3, "900 .22", None, None),
        ];
        let report = build_match_report(&sample_match(None), &scores, &shooters());

        let board = &report.leaderboards[0];
        assert_eq!(board.instance_name, "900 .22");
        let names: Vec<&str> = board.rows.iter().map(|r| r.shooter_name.as_str()).collect();
        // Ada and Bo tie on 192; Bo has more Xs.
        assert_eq!(names, vec!["Bo", "Ada", "Cy"]);
        assert_eq!(board.rows[0].place, Some(1));
        assert_eq!(board.rows[1].place, Some(2));
        assert_eq!(board.rows[2].place, None);
        assert!(board.rows[2].totals.all_null);
        assert_eq!(board.rows[0].subtotals[0].name, "Sustained");
        assert_eq!(board.rows[0].subtotals[0].score, 96);
        assert!(report.leaderboards[1].rows.is_empty());
        assert!(report.aggregate.is_none());
    }

    #[test]
    fn test_exact_ties_share_a_place() {
        let scores = vec![
            score(10, 1, "900 .22", Some((95, 2)), None),
            score(11, 2, "900 .22", Some((95, 2)), None),
            score(12, 3, "900 .22", Some((90, 0)), None),
        ];
        let report = build_match_report(&sample_match(None), &scores, &shooters());
        let places: Vec<Option<usize>> = report.leaderboards[0].rows.iter().map(|r| r.place).collect();
        assert_eq!(places, vec![Some(1), Some(1), Some(3)]);
    }

    #[test]
    fn test_aggregate_sums_across_match_types() {
        let scores = vec![
            score(10, 1, "900 .22", Some((95, 2)), Some((97, 3))),
            score(11, 1, "900 CF", Some((90, 1)), None),
            score(12, 2, "900 .22", Some((99, 6)), Some((98, 4))),
            score(13, 3, "900 CF", None, None),
        ];
        let report = build_match_report(
            &sample_match(Some(AggregateType::TwoByNineHundred)),
            &scores,
            &shooters(),
        );
        let aggregate = report.aggregate.unwrap();
        assert_eq!(aggregate.max_score, 1800);
        let rows: Vec<(&str, Option<u32>, usize)> = aggregate
            .rows
            .iter()
            .map(|r| (r.shooter_name.as_str(), r.totals.total_score, r.entries))
            .collect();
        assert_eq!(
            rows,
            vec![("Ada", Some(282), 2), ("Bo", Some(197), 1), ("Cy", None, 0)]
        );
        assert_eq!(aggregate.rows[0].totals.total_x_count, Some(6));
        assert_eq!(aggregate.rows[2].place, None);
    }

    #[test]
    fn test_unresolved_scores_are_reported_not_dropped_silently() {
        let mut orphan = score(20, 2, "Pistol Ladder", Some((90, 0)), None);
        orphan.stages = vec![Stage::fired("LADDER", 90, 0)];
        let report = build_match_report(&sample_match(None), &[orphan], &shooters());
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].score_id, Some(20));
        assert!(report.leaderboards.iter().all(|b| b.rows.is_empty()));
    }

    #[test]
    fn test_unknown_shooter_gets_placeholder_name() {
        let scores = vec![score(10, 42, "900 .22", Some((95, 2)), None)];
        let report = build_match_report(&sample_match(None), &scores, &HashMap::new());
        assert_eq!(report.leaderboards[0].rows[0].shooter_name, "Shooter #42");
    }

    #[test]
    fn test_aggregate_sum_saturates() {
        let huge = Totals {
            total_score: Some(u32::MAX),
            total_x_count: Some(2),
            all_null: false,
        };
        let summed = sum_totals(&[huge, huge]);
        assert_eq!(summed.total_score, Some(u32::MAX));
        assert_eq!(summed.total_x_count, Some(4));
    }
}
