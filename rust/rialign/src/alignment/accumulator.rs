//! Collection of per-row scoring results from parallel iterators.

use super::SkipReason;
use super::pair_scorer::PairScore;
use rayon::iter::{
    FromParallelIterator,
    IntoParallelIterator,
    ParallelIterator,
};
use serde::Serialize;
use std::time::Duration;

/// Count of skips per [`SkipReason`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub no_fragment_scan: usize,
    pub not_ms1_scan: usize,
    pub missing_query_peak_list: usize,
    pub no_usable_similarity: usize,
    pub ignored_without_ri: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::NoFragmentScan => self.no_fragment_scan += 1,
            SkipReason::NotMs1Scan => self.not_ms1_scan += 1,
            SkipReason::MissingQueryPeakList => self.missing_query_peak_list += 1,
            SkipReason::NoUsableSimilarity => self.no_usable_similarity += 1,
            SkipReason::IgnoredWithoutRi => self.ignored_without_ri += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.no_fragment_scan
            + self.not_ms1_scan
            + self.missing_query_peak_list
            + self.no_usable_similarity
            + self.ignored_without_ri
    }
}

impl std::ops::AddAssign for SkipCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.no_fragment_scan += rhs.no_fragment_scan;
        self.not_ms1_scan += rhs.not_ms1_scan;
        self.missing_query_peak_list += rhs.missing_query_peak_list;
        self.no_usable_similarity += rhs.no_usable_similarity;
        self.ignored_without_ri += rhs.ignored_without_ri;
    }
}

/// Counters of one scoring pass, summed over all threads.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PassMetrics {
    /// Rows that went through the candidate search.
    pub rows_scored: usize,
    /// Rows not looked at because the pass was cancelled.
    pub rows_cancelled: usize,
    pub candidates_considered: usize,
    pub pairs_scored: usize,
    pub skipped: SkipCounts,
    /// Summed per-row scoring time (CPU time, not wall time).
    pub scoring_time: Duration,
}

impl Serialize for PassMetrics {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PassMetrics", 6)?;
        state.serialize_field("rows_scored", &self.rows_scored)?;
        state.serialize_field("rows_cancelled", &self.rows_cancelled)?;
        state.serialize_field("candidates_considered", &self.candidates_considered)?;
        state.serialize_field("pairs_scored", &self.pairs_scored)?;
        state.serialize_field("skipped", &self.skipped)?;
        state.serialize_field("scoring_time_ms", &self.scoring_time.as_millis())?;
        state.end()
    }
}

impl std::ops::AddAssign for PassMetrics {
    fn add_assign(&mut self, rhs: Self) {
        self.rows_scored += rhs.rows_scored;
        self.rows_cancelled += rhs.rows_cancelled;
        self.candidates_considered += rhs.candidates_considered;
        self.pairs_scored += rhs.pairs_scored;
        self.skipped += rhs.skipped;
        self.scoring_time += rhs.scoring_time;
    }
}

/// Scores and counters produced for a single row to add.
#[derive(Debug, Default)]
pub(super) struct RowScores {
    pub(super) scores: Vec<PairScore>,
    pub(super) metrics: PassMetrics,
}

impl RowScores {
    pub(super) fn cancelled() -> Self {
        Self {
            scores: Vec::new(),
            metrics: PassMetrics {
                rows_cancelled: 1,
                ..PassMetrics::default()
            },
        }
    }
}

/// Fold/reduce target for [`RowScores`] coming out of a rayon iterator.
#[derive(Debug, Default)]
pub(super) struct PairScoreAccumulator {
    pub(super) scores: Vec<PairScore>,
    pub(super) metrics: PassMetrics,
}

impl PairScoreAccumulator {
    fn reduce(mut self, other: Self) -> Self {
        self.scores.extend(other.scores);
        self.metrics += other.metrics;
        self
    }

    fn fold(mut self, item: RowScores) -> Self {
        self.scores.extend(item.scores);
        self.metrics += item.metrics;
        self
    }
}

impl FromIterator<RowScores> for PairScoreAccumulator {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = RowScores>,
    {
        iter.into_iter()
            .fold(PairScoreAccumulator::default(), PairScoreAccumulator::fold)
    }
}

impl FromParallelIterator<RowScores> for PairScoreAccumulator {
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: IntoParallelIterator<Item = RowScores>,
    {
        par_iter
            .into_par_iter()
            .fold(PairScoreAccumulator::default, PairScoreAccumulator::fold)
            .reduce(PairScoreAccumulator::default, PairScoreAccumulator::reduce)
    }
}
