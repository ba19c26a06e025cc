//! Retention-index driven alignment of feature lists.
//!
//! A merge is three steps: [`CandidateSearch`] narrows the consensus rows by RI,
//! [`RowPairScorer`] scores every admitted pair, and [`resolve`] turns the scores
//! into a one-to-one assignment. [`ListAligner`] runs this once per list.

mod accumulator;
mod aligner;
mod alignment_score;
mod candidates;
mod pair_scorer;
mod resolver;
#[cfg(test)]
pub(crate) mod testing;

pub use accumulator::{
    PassMetrics,
    SkipCounts,
};
pub use aligner::{
    AlignedFeatureList,
    AlignedRowSummary,
    ListAligner,
    ListSummary,
    MergeReport,
};
pub use alignment_score::AlignmentScore;
pub use candidates::CandidateSearch;
pub use pair_scorer::{
    AlignmentParameters,
    PairOutcome,
    PairScore,
    RowPairScorer,
    ScoringPass,
};
pub use resolver::{
    Assignment,
    resolve,
};

use serde::Serialize;

/// Why a row or a pair produced no score. These are routine in real data and
/// are counted, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// One side of the pair has no fragment scan.
    NoFragmentScan,
    /// The fragment scan is not an MS1 (pseudo) spectrum.
    NotMs1Scan,
    /// The row being added has a scan without centroided peaks.
    MissingQueryPeakList,
    /// The similarity function could not compare the spectra.
    NoUsableSimilarity,
    /// Row dropped before the candidate search, it has no RI and missing RIs are ignored.
    IgnoredWithoutRi,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::NoFragmentScan => "no fragment scan",
            SkipReason::NotMs1Scan => "fragment scan is not MS1",
            SkipReason::MissingQueryPeakList => "fragment scan has no mass list",
            SkipReason::NoUsableSimilarity => "spectra could not be compared",
            SkipReason::IgnoredWithoutRi => "row has no retention index",
        };
        f.write_str(s)
    }
}
