use serde::Serialize;

use crate::api::types::{Stage, SubtotalMappings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_score: Option<u32>,
    pub total_x_count: Option<u32>,
    /// Every stage was left unfired. Distinguishes a skipped entry from a
    /// legitimately low score.
    pub all_null: bool,
}

impl Totals {
    /// Sort key used by leaderboards: higher total first, then more Xs.
    /// Unfired entries sort below everything else.
    pub fn rank_key(&self) -> Option<(u32, u32)> {
        if self.all_null {
            None
        } else {
            Some((
                self.total_score.unwrap_or(0),
                self.total_x_count.unwrap_or(0),
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtotal {
    pub name: String,
    pub score: u32,
    pub x_count: u32,
}

pub fn compute_totals(stages: &[Stage]) -> Totals {
    if stages.iter().all(|s| s.score.is_none()) {
        return Totals {
            total_score: None,
            total_x_count: None,
            all_null: true,
        };
    }

    let total_score = saturating_sum(stages.iter().filter_map(|s| s.score));
    let total_x_count = saturating_sum(stages.iter().filter_map(|s| s.x_count));

    Totals {
        total_score: Some(total_score),
        total_x_count: Some(total_x_count),
        all_null: false,
    }
}

/// Sum that pins at `u32::MAX` instead of overflowing. A pinned total is
/// still above every configured maximum, so validation reports it.
pub(crate) fn saturating_sum(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, u32::saturating_add)
}

/// Sum each named subtotal over the stages listed as its sources.
/// Unfired stages count as zero here; there is no all-null state per
/// subtotal.
pub fn compute_subtotals(stages: &[Stage], mappings: &SubtotalMappings) -> Vec<Subtotal> {
    mappings
        .iter()
        .map(|(name, sources)| {
            let (score, x_count) = stages
                .iter()
                .filter(|s| sources.iter().any(|src| *src == s.name))
                .fold((0u32, 0u32), |(score, x), s| {
                    (
                        u32::saturating_add(score, s.score.unwrap_or(0)),
                        u32::saturating_add(x, s.x_count.unwrap_or(0)),
                    )
                });
            Subtotal {
                name: name.to_string(),
                score,
                x_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::subtotals;

    fn nmc_stages() -> Vec<Stage> {
        vec![
            Stage::fired("SF", 96, 3),
            Stage::fired("TF", 98, 4),
            Stage::fired("RF", 94, 1),
        ]
    }

    #[test]
    fn test_totals_with_unfired_stage() {
        let stages = vec![Stage::fired("SF", 96, 3), Stage::not_fired("TF")];
        let totals = compute_totals(&stages);
        assert_eq!(
            totals,
            Totals {
                total_score: Some(96),
                total_x_count: Some(3),
                all_null: false,
            }
        );
    }

    #[test]
    fn test_totals_all_unfired() {
        let stages = vec![Stage::not_fired("SF"), Stage::not_fired("TF"), Stage::not_fired("RF")];
        let totals = compute_totals(&stages);
        assert_eq!(
            totals,
            Totals {
                total_score: None,
                total_x_count: None,
                all_null: true,
            }
        );
        assert!(totals.rank_key().is_none());
    }

    #[test]
    fn test_totals_empty_entry_is_all_null() {
        assert!(compute_totals(&[]).all_null);
    }

    #[test]
    fn test_zero_score_is_not_all_null() {
        let stages = vec![Stage::fired("SF", 0, 0), Stage::not_fired("TF")];
        let totals = compute_totals(&stages);
        assert!(!totals.all_null);
        assert_eq!(totals.total_score, Some(0));
        assert_eq!(totals.rank_key(), Some((0, 0)));
    }

    #[test]
    fn test_score_with_missing_x_count() {
        let stages = vec![
            Stage {
                name: "SF".to_string(),
                score: Some(90),
                x_count: None,
            },
            Stage::fired("TF", 95, 2),
        ];
        let totals = compute_totals(&stages);
        assert_eq!(totals.total_score, Some(185));
        assert_eq!(totals.total_x_count, Some(2));
    }

    #[test]
    fn test_totals_independent_of_order() {
        let mut stages = nmc_stages();
        stages.push(Stage::not_fired("EXTRA"));
        let forward = compute_totals(&stages);
        stages.reverse();
        let backward = compute_totals(&stages);
        assert_eq!(forward, backward);
        assert_eq!(forward.total_score, Some(288));
        assert_eq!(forward.total_x_count, Some(8));
    }

    #[test]
    fn test_subtotals_follow_mapping_order() {
        let stages = vec![
            Stage::fired("SF1", 95, 2),
            Stage::fired("SF2", 93, 1),
            Stage::fired("TF1", 97, 3),
            Stage::fired("TF2", 99, 5),
        ];
        let mappings = subtotals(&[("Timed Fire", &["TF1", "TF2"]), ("Slow Fire", &["SF1", "SF2"])]);

        let subtotals = compute_subtotals(&stages, &mappings);
        assert_eq!(
            subtotals,
            vec![
                Subtotal {
                    name: "Timed Fire".to_string(),
                    score: 196,
                    x_count: 8,
                },
                Subtotal {
                    name: "Slow Fire".to_string(),
                    score: 188,
                    x_count: 3,
                },
            ]
        );
    }

    #[test]
    fn test_subtotal_of_unfired_stages_is_zero() {
        let stages = vec![Stage::not_fired("RF1"), Stage::not_fired("RF2")];
        let mappings = subtotals(&[("Rapid Fire", &["RF1", "RF2"])]);
        let subtotals = compute_subtotals(&stages, &mappings);
        assert_eq!(subtotals[0].score, 0);
        assert_eq!(subtotals[0].x_count, 0);
    }

    #[test]
    fn test_partitioning_subtotals_add_up_to_total() {
        let stages = vec![
            Stage::fired("SF1", 91, 0),
            Stage::not_fired("SF2"),
            Stage::fired("TF1", 97, 3),
            Stage::fired("RF1", 88, 1),
        ];
        let mappings = subtotals(&[
            ("Slow Fire", &["SF1", "SF2"]),
            ("Timed Fire", &["TF1"]),
            ("Rapid Fire", &["RF1"]),
        ]);

        let subtotal_sum: u32 = compute_subtotals(&stages, &mappings)
            .iter()
            .map(|s| s.score)
            .sum();
        assert_eq!(Some(subtotal_sum), compute_totals(&stages).total_score);
    }

    #[test]
    fn test_subtotal_ignores_unknown_sources() {
        let stages = nmc_stages();
        let mappings = subtotals(&[("Sustained", &["TF", "RF", "MISSING"])]);
        let subtotals = compute_subtotals(&stages, &mappings);
        assert_eq!(subtotals[0].score, 192);
        assert_eq!(subtotals[0].x_count, 5);
    }

    #[test]
    fn test_huge_stage_scores_do_not_overflow() {
        let stages = vec![Stage::fired("SF", u32::MAX, u32::MAX), Stage::fired("TF", 1, 1)];
        let totals = compute_totals(&stages);
        assert_eq!(totals.total_score, Some(u32::MAX));
        assert_eq!(totals.total_x_count, Some(u32::MAX));

        let mappings = subtotals(&[("Both", &["SF", "TF"])]);
        assert_eq!(compute_subtotals(&stages, &mappings)[0].score, u32::MAX);
    }
}
