use super::SkipReason;
use super::accumulator::{
    PairScoreAccumulator,
    PassMetrics,
    RowScores,
};
use super::candidates::CandidateSearch;
use crate::errors::{
    AlignmentError,
    Result,
};
use crate::models::{
    ConsensusRow,
    ConsensusRowId,
    FeatureRow,
    MzTolerance,
    RetentionIndexTolerance,
    RowId,
    SpectrumAvailability,
};
use crate::similarity::{
    SimilarityFunction,
    SpectralSimilarityScorer,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::time::Instant;
use tracing::{
    debug,
    info,
};

/// Everything that controls how rows are scored against consensus rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlignmentParameters {
    /// Used for peak matching inside the similarity function.
    pub mz_tolerance: MzTolerance,
    pub ri_tolerance: RetentionIndexTolerance,
    /// Weight of the RI term in the combined score, in `[0, 1]`.
    pub ri_weight: f32,
    pub similarity: SimilarityFunction,
}

impl Default for AlignmentParameters {
    fn default() -> Self {
        Self {
            mz_tolerance: MzTolerance::default(),
            ri_tolerance: RetentionIndexTolerance::default(),
            ri_weight: 0.5,
            similarity: SimilarityFunction::default(),
        }
    }
}

impl AlignmentParameters {
    pub fn validate(&self) -> Result<()> {
        self.mz_tolerance.validate()?;
        self.ri_tolerance.validate()?;
        if !(self.ri_weight.is_finite() && (0.0..=1.0).contains(&self.ri_weight)) {
            return Err(AlignmentError::invalid_parameter(
                "ri_weight",
                format!("expected a value in [0, 1], got {}", self.ri_weight),
            ));
        }
        self.similarity.validate()
    }
}

/// Score of one (row to add, consensus row) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    pub row: RowId,
    pub candidate: ConsensusRowId,
    /// RI proximity in `[0, 1]`; 0 when either side has no RI.
    pub ri_component: f32,
    pub similarity_component: f32,
    /// Number of matched signals behind `similarity_component`.
    pub overlap: usize,
    pub combined: f32,
}

/// Result of scoring a single pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    Scored(PairScore),
    Skipped(SkipReason),
}

impl PairOutcome {
    pub fn score(self) -> Option<PairScore> {
        match self {
            PairOutcome::Scored(x) => Some(x),
            PairOutcome::Skipped(_) => None,
        }
    }
}

/// Scores and counters of one pass over a feature list.
#[derive(Debug, Default)]
pub struct ScoringPass {
    /// Unordered; every row appears once per scored candidate.
    pub scores: Vec<PairScore>,
    pub metrics: PassMetrics,
}

impl ScoringPass {
    /// True when at least one row was left out because the pass was cancelled.
    /// The scores that are present are still valid.
    pub fn is_cancelled(&self) -> bool {
        self.metrics.rows_cancelled > 0
    }
}

/// Combines RI proximity and spectral similarity into a pair score.
///
/// `combined = ri_weight * ri_component + similarity` when both rows carry an RI,
/// and `(1 - ri_weight) * similarity` otherwise, so a pair that cannot be checked
/// on RI never outscores an equally similar pair that can.
#[derive(Debug, Clone)]
pub struct RowPairScorer<S: SpectralSimilarityScorer = SimilarityFunction> {
    mz_tolerance: MzTolerance,
    ri_tolerance: RetentionIndexTolerance,
    ri_weight: f32,
    similarity: S,
    search: CandidateSearch,
}

impl RowPairScorer<SimilarityFunction> {
    pub fn new(parameters: &AlignmentParameters) -> Result<Self> {
        Self::with_similarity(parameters, parameters.similarity)
    }
}

impl<S: SpectralSimilarityScorer> RowPairScorer<S> {
    /// Uses `similarity` in place of the configured similarity function.
    pub fn with_similarity(parameters: &AlignmentParameters, similarity: S) -> Result<Self> {
        parameters.validate()?;
        Ok(Self {
            mz_tolerance: parameters.mz_tolerance,
            ri_tolerance: parameters.ri_tolerance,
            ri_weight: parameters.ri_weight,
            similarity,
            search: CandidateSearch::new(parameters.ri_tolerance),
        })
    }

    pub fn ri_tolerance(&self) -> &RetentionIndexTolerance {
        &self.ri_tolerance
    }

    pub fn candidate_search(&self) -> &CandidateSearch {
        &self.search
    }

    /// Scores `row_to_add` against `candidate`, `None` when the pair is not comparable.
    pub fn score(&self, row_to_add: &FeatureRow, candidate: &ConsensusRow) -> Result<Option<PairScore>> {
        Ok(self.score_pair(row_to_add, candidate)?.score())
    }

    /// Like [`Self::score`], but says why a pair was not scored.
    ///
    /// # Errors
    ///
    /// [`AlignmentError::MissingRequiredPeakList`] when the candidate's representative
    /// has an MS1 scan without a mass list.
    pub fn score_pair(&self, row_to_add: &FeatureRow, candidate: &ConsensusRow) -> Result<PairOutcome> {
        let query = match row_to_add.spectrum() {
            SpectrumAvailability::Usable(peaks) => peaks,
            SpectrumAvailability::NoScan => return Ok(PairOutcome::Skipped(SkipReason::NoFragmentScan)),
            SpectrumAvailability::NotMs1 => return Ok(PairOutcome::Skipped(SkipReason::NotMs1Scan)),
            SpectrumAvailability::MissingPeakList => {
                return Ok(PairOutcome::Skipped(SkipReason::MissingQueryPeakList));
            }
        };

        let representative = candidate.representative();
        let library = match representative.spectrum() {
            SpectrumAvailability::Usable(peaks) => peaks,
            SpectrumAvailability::NoScan => return Ok(PairOutcome::Skipped(SkipReason::NoFragmentScan)),
            SpectrumAvailability::NotMs1 => return Ok(PairOutcome::Skipped(SkipReason::NotMs1Scan)),
            SpectrumAvailability::MissingPeakList => {
                return Err(AlignmentError::MissingRequiredPeakList {
                    row: representative.id,
                });
            }
        };

        let Some(similarity) = self
            .similarity
            .similarity(&self.mz_tolerance, query, library)
        else {
            return Ok(PairOutcome::Skipped(SkipReason::NoUsableSimilarity));
        };

        let (ri_component, combined) = match (row_to_add.average_ri, candidate.average_ri()) {
            (Some(a), Some(b)) => {
                let proximity = self.ri_tolerance.proximity(a, b);
                (proximity, self.ri_weight * proximity + similarity.score)
            }
            _ => (0.0, (1.0 - self.ri_weight) * similarity.score),
        };

        Ok(PairOutcome::Scored(PairScore {
            row: row_to_add.id,
            candidate: candidate.id(),
            ri_component,
            similarity_component: similarity.score,
            overlap: similarity.overlap,
            combined,
        }))
    }

    pub(super) fn score_row(
        &self,
        row_to_add: &FeatureRow,
        consensus_rows: &[ConsensusRow],
    ) -> Result<RowScores> {
        let start = Instant::now();
        let mut out = RowScores::default();

        if self.ri_tolerance.should_ignore(row_to_add.ri_record().as_ref()) {
            debug!(row = %row_to_add.id, "Skipping row without retention index");
            out.metrics.skipped.record(SkipReason::IgnoredWithoutRi);
            return Ok(out);
        }

        out.metrics.rows_scored = 1;
        let candidates = self.search.find_candidates(row_to_add, consensus_rows);
        out.metrics.candidates_considered = candidates.len();
        for candidate in candidates {
            match self.score_pair(row_to_add, candidate)? {
                PairOutcome::Scored(score) => out.scores.push(score),
                PairOutcome::Skipped(reason) => out.metrics.skipped.record(reason),
            }
        }
        out.metrics.pairs_scored = out.scores.len();
        out.metrics.scoring_time = start.elapsed();
        Ok(out)
    }

    /// Scores every row of `rows_to_add` against its candidates in parallel.
    ///
    /// `consensus_rows` must be in search order. `cancel` is checked once per row;
    /// once set, the remaining rows are counted as cancelled and the scores gathered
    /// so far are returned.
    ///
    /// # Errors
    ///
    /// Stops at the first [`AlignmentError::MissingRequiredPeakList`].
    #[tracing::instrument(skip_all, fields(rows = rows_to_add.len(), consensus = consensus_rows.len()))]
    pub fn score_rows(
        &self,
        rows_to_add: &[Arc<FeatureRow>],
        consensus_rows: &[ConsensusRow],
        cancel: &AtomicBool,
    ) -> Result<ScoringPass> {
        let acc: PairScoreAccumulator = rows_to_add
            .par_iter()
            .map(|row| {
                if cancel.load(Ordering::Relaxed) {
                    return Ok(RowScores::cancelled());
                }
                self.score_row(row, consensus_rows)
            })
            .collect::<Result<PairScoreAccumulator>>()?;

        info!(
            "Scored {} pairs from {} rows ({} skipped, {} cancelled)",
            acc.metrics.pairs_scored,
            acc.metrics.rows_scored,
            acc.metrics.skipped.total(),
            acc.metrics.rows_cancelled,
        );

        Ok(ScoringPass {
            scores: acc.scores,
            metrics: acc.metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::testing::*;
    use crate::models::{
        FragmentScan,
        ListId,
    };

    fn consensus_of(rows: &[std::sync::Arc<FeatureRow>]) -> Vec<ConsensusRow> {
        let mut out: Vec<ConsensusRow> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| ConsensusRow::new(ConsensusRowId(i as u32), r.clone()))
            .collect();
        crate::models::sort_for_search(&mut out);
        out
    }

    #[test]
    fn test_identical_rows_score_highest() {
        let scorer = RowPairScorer::new(&params(10.0, 0.5, false)).unwrap();
        let base = list(0, "a", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let query = list(1, "b", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let consensus = consensus_of(base.rows());
        let score = scorer.score(&query.rows()[0], &consensus[0]).unwrap().unwrap();
        assert!((score.similarity_component - 1.0).abs() < 1e-6);
        assert_eq!(score.ri_component, 1.0);
        assert!((score.combined - 1.5).abs() < 1e-6);
        assert_eq!(score.overlap, SPECTRUM_A.len());
        assert_eq!(score.candidate, ConsensusRowId(0));
        assert_eq!(score.row.list, ListId(1));
    }

    #[test]
    fn test_closer_ri_scores_higher() {
        let scorer = RowPairScorer::new(&params(10.0, 0.5, false)).unwrap();
        let base = list(
            0,
            "a",
            vec![row(100.0, Some(1201.0), SPECTRUM_A), row(100.0, Some(1205.0), SPECTRUM_A)],
        );
        let query = list(1, "b", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let consensus = consensus_of(base.rows());
        let near = scorer.score(&query.rows()[0], &consensus[0]).unwrap().unwrap();
        let far = scorer.score(&query.rows()[0], &consensus[1]).unwrap().unwrap();
        assert_eq!(near.similarity_component, far.similarity_component);
        assert!(near.ri_component > far.ri_component);
        assert!(near.combined > far.combined);
    }

    #[test]
    fn test_missing_ri_discounts_similarity() {
        let scorer = RowPairScorer::new(&params(10.0, 0.25, false)).unwrap();
        let base = list(0, "a", vec![row(100.0, None, SPECTRUM_A)]);
        let query = list(1, "b", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let consensus = consensus_of(base.rows());
        let score = scorer.score(&query.rows()[0], &consensus[0]).unwrap().unwrap();
        assert_eq!(score.ri_component, 0.0);
        assert!((score.combined - 0.75 * score.similarity_component).abs() < 1e-6);
    }

    #[test]
    fn test_pairs_without_usable_spectra_are_skipped() {
        let scorer = RowPairScorer::new(&params(10.0, 0.5, false)).unwrap();
        let base = list(0, "a", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let consensus = consensus_of(base.rows());

        let mut no_scan = row(100.0, Some(1200.0), SPECTRUM_A);
        no_scan.most_intense_fragment_scan = None;
        let mut ms2 = row(100.0, Some(1200.0), SPECTRUM_A);
        ms2.most_intense_fragment_scan = Some(FragmentScan {
            ms_level: 2,
            mass_list: Some(Vec::new()),
        });
        let mut no_peaks = row(100.0, Some(1200.0), SPECTRUM_A);
        no_peaks.most_intense_fragment_scan = Some(FragmentScan {
            ms_level: 1,
            mass_list: None,
        });
        let query = list(
            1,
            "b",
            vec![no_scan, ms2, no_peaks, row(100.0, Some(1200.0), SPECTRUM_B)],
        );

        let outcomes: Vec<PairOutcome> = query
            .rows()
            .iter()
            .map(|r| scorer.score_pair(r, &consensus[0]).unwrap())
            .collect();
        assert_eq!(
            outcomes,
            vec![
                PairOutcome::Skipped(SkipReason::NoFragmentScan),
                PairOutcome::Skipped(SkipReason::NotMs1Scan),
                PairOutcome::Skipped(SkipReason::MissingQueryPeakList),
                PairOutcome::Skipped(SkipReason::NoUsableSimilarity),
            ]
        );
    }

    #[test]
    fn test_candidate_without_mass_list_is_an_error() {
        let scorer = RowPairScorer::new(&params(10.0, 0.5, false)).unwrap();
        let mut broken = row(100.0, Some(1200.0), SPECTRUM_A);
        broken.most_intense_fragment_scan = Some(FragmentScan {
            ms_level: 1,
            mass_list: None,
        });
        let base = list(0, "a", vec![broken]);
        let query = list(1, "b", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let consensus = consensus_of(base.rows());

        let err = scorer.score(&query.rows()[0], &consensus[0]).unwrap_err();
        assert_eq!(
            err,
            AlignmentError::MissingRequiredPeakList {
                row: base.rows()[0].id
            }
        );
        let cancel = AtomicBool::new(false);
        assert!(scorer.score_rows(query.rows(), &consensus, &cancel).is_err());
    }

    #[test]
    fn test_score_rows_ignores_rows_without_ri() {
        let scorer = RowPairScorer::new(&params(10.0, 0.5, true)).unwrap();
        let base = list(0, "a", vec![row(100.0, Some(1200.0), SPECTRUM_A), row(100.0, None, SPECTRUM_B)]);
        let query = list(
            1,
            "b",
            vec![row(100.0, Some(1202.0), SPECTRUM_A), row(100.0, None, SPECTRUM_A)],
        );
        let consensus = consensus_of(base.rows());
        let cancel = AtomicBool::new(false);
        let pass = scorer.score_rows(query.rows(), &consensus, &cancel).unwrap();

        assert!(!pass.is_cancelled());
        assert_eq!(pass.metrics.rows_scored, 1);
        assert_eq!(pass.metrics.skipped.ignored_without_ri, 1);
        // Matches the RI row, the no-RI consensus row is a candidate with a disjoint spectrum
        assert_eq!(pass.metrics.candidates_considered, 2);
        assert_eq!(pass.scores.len(), 1);
        assert_eq!(pass.scores[0].row, query.rows()[0].id);
    }

    #[test]
    fn test_score_rows_is_deterministic() {
        let scorer = RowPairScorer::new(&params(20.0, 0.5, false)).unwrap();
        let base = list(
            0,
            "a",
            (0..40)
                .map(|i| row(100.0, Some(1000.0 + 5.0 * i as f32), if i % 2 == 0 { SPECTRUM_A } else { SPECTRUM_B }))
                .collect(),
        );
        let query = list(
            1,
            "b",
            (0..40)
                .map(|i| row(100.0, Some(1002.0 + 5.0 * i as f32), if i % 3 == 0 { SPECTRUM_A } else { SPECTRUM_B }))
                .collect(),
        );
        let consensus = consensus_of(base.rows());
        let cancel = AtomicBool::new(false);

        let sorted = |mut scores: Vec<PairScore>| {
            scores.sort_by(|a, b| a.row.cmp(&b.row).then(a.candidate.cmp(&b.candidate)));
            scores
        };
        let first = sorted(scorer.score_rows(query.rows(), &consensus, &cancel).unwrap().scores);
        let second = sorted(scorer.score_rows(query.rows(), &consensus, &cancel).unwrap().scores);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_cancelled_pass_returns_partial_result() {
        let scorer = RowPairScorer::new(&params(10.0, 0.5, false)).unwrap();
        let base = list(0, "a", vec![row(100.0, Some(1200.0), SPECTRUM_A)]);
        let query = list(1, "b", vec![row(100.0, Some(1200.0), SPECTRUM_A); 3]);
        let consensus = consensus_of(base.rows());
        let cancel = AtomicBool::new(true);
        let pass = scorer.score_rows(query.rows(), &consensus, &cancel).unwrap();
        assert!(pass.is_cancelled());
        assert!(pass.scores.is_empty());
        assert_eq!(pass.metrics.rows_cancelled, 3);
    }

    #[test]
    fn test_rejects_invalid_ri_weight() {
        for w in [-0.1, 1.5, f32::NAN] {
            let p = AlignmentParameters {
                ri_weight: w,
                ..AlignmentParameters::default()
            };
            assert!(RowPairScorer::new(&p).is_err());
        }
    }

    #[test]
    fn test_deserialize_partial_parameters() {
        let p: AlignmentParameters = serde_json::from_str(
            r#"{"ri_tolerance": {"window": 5.0}, "ri_weight": 0.8}"#,
        )
        .unwrap();
        assert_eq!(p.ri_tolerance.window(), 5.0);
        assert_eq!(p.ri_weight, 0.8);
        assert_eq!(p.similarity, SimilarityFunction::default());
        assert!(p.validate().is_ok());
    }
}
