pub mod caliber;
pub mod matcher;
pub mod report;
pub mod totals;
pub mod validation;

pub use caliber::{
    compute_caliber_averages, CaliberStats, CategoryAverage, HistoryMatch, HistoryScore,
    YearFilter,
};
pub use matcher::{find_matching_type, MatchKind, MatchTypeMatch, MatchTypeNotFound};
pub use report::{build_match_report, MatchReport};
pub use totals::{compute_subtotals, compute_totals, Subtotal, Totals};
pub use validation::{validate_match_input, validate_match_types, validate_score};
