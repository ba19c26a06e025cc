use super::pair_scorer::PairScore;
use crate::models::{
    ConsensusRowId,
    RowId,
};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::warn;

/// A row to add matched to a consensus row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Assignment {
    pub row: RowId,
    pub consensus: ConsensusRowId,
    pub score: PairScore,
}

/// Best first: combined score, then similarity, then row and consensus ids.
/// Total, so equal inputs always resolve the same way.
fn resolution_order(a: &PairScore, b: &PairScore) -> Ordering {
    b.combined
        .total_cmp(&a.combined)
        .then(b.similarity_component.total_cmp(&a.similarity_component))
        .then(a.row.cmp(&b.row))
        .then(a.candidate.cmp(&b.candidate))
}

/// Greedy one-to-one assignment from the pair scores of one list to add.
///
/// Pairs are accepted best first while neither side is taken yet. Every row and
/// every consensus row ends up in at most one assignment. Any subset of a pass's
/// scores (e.g. after a cancellation) is valid input.
///
/// Rows are tracked by [`RowId::index`] in `0..n_rows_to_add` and consensus rows by
/// id in `0..n_consensus`; pairs outside those bounds are dropped.
///
/// ```
/// use rialign::alignment::{resolve, PairScore};
/// use rialign::models::{ConsensusRowId, ListId, RowId};
///
/// let pair = |index, consensus, combined| PairScore {
///     row: RowId { list: ListId(1), index },
///     candidate: ConsensusRowId(consensus),
///     ri_component: 0.0,
///     similarity_component: combined,
///     overlap: 4,
///     combined,
/// };
/// let out = resolve(vec![pair(0, 0, 0.9), pair(1, 0, 0.95), pair(0, 1, 0.5)], 2, 2);
/// assert_eq!(out.len(), 2);
/// assert_eq!((out[0].row.index, out[0].consensus.0), (1, 0));
/// assert_eq!((out[1].row.index, out[1].consensus.0), (0, 1));
/// ```
pub fn resolve(mut scores: Vec<PairScore>, n_rows_to_add: usize, n_consensus: usize) -> Vec<Assignment> {
    scores.sort_by(resolution_order);

    let mut used_rows = vec![false; n_rows_to_add];
    let mut used_consensus = vec![false; n_consensus];
    let mut out = Vec::new();
    for score in scores {
        let (Some(row_used), Some(consensus_used)) = (
            used_rows.get(score.row.index as usize),
            used_consensus.get(score.candidate.0 as usize),
        ) else {
            warn!(
                "Dropping pair {} -> {} outside of the resolved range",
                score.row, score.candidate
            );
            continue;
        };
        if *row_used || *consensus_used {
            continue;
        }
        used_rows[score.row.index as usize] = true;
        used_consensus[score.candidate.0 as usize] = true;
        out.push(Assignment {
            row: score.row,
            consensus: score.candidate,
            score,
        });
    }
    out
}
