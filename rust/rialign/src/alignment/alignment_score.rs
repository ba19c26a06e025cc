use crate::models::{
    ConsensusRow,
    ConsensusRowId,
};
use serde::Serialize;

/// How well a consensus row is covered by the aligned lists and how tight its
/// members are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentScore {
    pub consensus: ConsensusRowId,
    /// `aligned_lists / total_lists`.
    pub rate: f32,
    pub aligned_lists: usize,
    pub total_lists: usize,
    /// Largest distance of a member RI from the row's average RI.
    /// `None` when no member has an RI.
    pub max_ri_delta: Option<f32>,
    pub max_mz_delta: f64,
}

impl AlignmentScore {
    pub fn for_row(row: &ConsensusRow, total_lists: usize) -> Self {
        let aligned_lists = row.members().len();
        let max_ri_delta = row.average_ri().and_then(|avg| {
            row.members()
                .iter()
                .filter_map(|x| x.average_ri)
                .map(|ri| (ri - avg).abs())
                .reduce(f32::max)
        });
        let max_mz_delta = row
            .members()
            .iter()
            .map(|x| (x.average_mz - row.average_mz()).abs())
            .fold(0.0, f64::max);

        Self {
            consensus: row.id(),
            rate: if total_lists == 0 {
                0.0
            } else {
                aligned_lists as f32 / total_lists as f32
            },
            aligned_lists,
            total_lists,
            max_ri_delta,
            max_mz_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::testing::*;

    #[test]
    fn test_score_of_three_member_row() {
        let a = list(0, "a", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let b = list(1, "b", vec![row(100.2, None, SPECTRUM_A)]);
        let c = list(2, "c", vec![row(100.1, Some(1210.0), SPECTRUM_A)]);
        let mut cr = ConsensusRow::new(ConsensusRowId(7), a.rows()[0].clone());
        cr.add_row(b.rows()[0].clone()).unwrap();
        cr.add_row(c.rows()[0].clone()).unwrap();

        let score = AlignmentScore::for_row(&cr, 4);
        assert_eq!(score.consensus, ConsensusRowId(7));
        assert_eq!(score.aligned_lists, 3);
        assert_eq!(score.rate, 0.75);
        assert_eq!(score.max_ri_delta, Some(5.0));
        assert!((score.max_mz_delta - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_score_without_ri() {
        let a = list(0, "a", vec![row(100.0, None, SPECTRUM_A)]);
        let cr = ConsensusRow::new(ConsensusRowId(0), a.rows()[0].clone());
        let score = AlignmentScore::for_row(&cr, 1);
        assert_eq!(score.rate, 1.0);
        assert_eq!(score.max_ri_delta, None);
        assert_eq!(score.max_mz_delta, 0.0);
    }
}
