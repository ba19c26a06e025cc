use crate::models::{
    ConsensusRow,
    FeatureRow,
    RetentionIndexTolerance,
};
use crate::utils::OptionallyRestricted::{
    Restricted,
    Unrestricted,
};
use crate::utils::partition_range_by_key;

/// Narrows the consensus rows down to the ones a row could match by RI.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSearch {
    tolerance: RetentionIndexTolerance,
}

impl CandidateSearch {
    pub fn new(tolerance: RetentionIndexTolerance) -> Self {
        Self { tolerance }
    }

    /// Consensus rows that `row_to_add` may be matched against.
    ///
    /// `consensus_rows` must be in search order (see [`crate::models::sort_for_search`]):
    /// RI ascending with rows lacking an RI at the end.
    ///
    /// With an RI on `row_to_add`, returns the rows whose RI is inside the admission
    /// range, followed by every row without RI (those can never be excluded on RI).
    /// Without an RI, returns every row. The output keeps the input order, so each
    /// row appears at most once.
    pub fn find_candidates<'a>(
        &self,
        row_to_add: &FeatureRow,
        consensus_rows: &'a [ConsensusRow],
    ) -> Vec<&'a ConsensusRow> {
        debug_assert!(
            consensus_rows
                .windows(2)
                .all(|w| w[0].search_order(&w[1]).is_le()),
            "Consensus rows are not in search order"
        );

        let range = match self.tolerance.admission_range_for(row_to_add.average_ri) {
            Restricted(range) => range,
            Unrestricted => return consensus_rows.iter().collect(),
        };

        let n_with_ri = consensus_rows.partition_point(|x| x.average_ri().is_some());
        let (with_ri, without_ri) = consensus_rows.split_at(n_with_ri);
        // Every row in `with_ri` has a value, NaN is only a placeholder for the closure
        let in_range = partition_range_by_key(with_ri, range, |x| {
            x.average_ri().unwrap_or(f32::NAN)
        });

        with_ri[in_range].iter().chain(without_ri.iter()).collect()
    }
}
