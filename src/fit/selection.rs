//! Best-candidate selection.
//!
//! Among `QUALIFIED` candidates, pick the highest adjusted R². The running
//! best starts at `-inf` and is replaced only on a strictly greater value, so
//! the first of several exactly-tied candidates wins. A NaN adjusted R² never
//! compares greater and is never selected.

use crate::domain::{CandidateModel, CandidateStatus, Warning, count_statuses};

/// Select the best qualified candidate.
///
/// Returns no candidate plus one `no_candidates` warning (carrying a status
/// histogram) when nothing qualifies.
pub fn select_best_candidate(
    candidates: &[CandidateModel],
) -> (Option<&CandidateModel>, Vec<Warning>) {
    let mut best: Option<&CandidateModel> = None;
    let mut best_r_squared_adj = f64::NEG_INFINITY;

    for candidate in candidates {
        if candidate.status() != CandidateStatus::Qualified {
            continue;
        }
        let Some(r2) = candidate.r_squared_adj() else {
            continue;
        };
        if r2 > best_r_squared_adj {
            best = Some(candidate);
            best_r_squared_adj = r2;
        }
    }

    if best.is_none() {
        let warning = Warning::NoQualifiedCandidates {
            status_counts: count_statuses(candidates),
        };
        return (None, vec![warning]);
    }
    (best, Vec::new())
}
