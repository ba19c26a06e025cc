use super::accumulator::PassMetrics;
use super::alignment_score::AlignmentScore;
use super::pair_scorer::{
    AlignmentParameters,
    RowPairScorer,
};
use super::resolver::resolve;
use crate::errors::{
    AlignmentError,
    Result,
};
use crate::models::{
    ConsensusRow,
    ConsensusRowId,
    FeatureList,
    ListId,
    RowId,
    SpectrumAvailability,
    sort_for_search,
};
use crate::similarity::{
    SimilarityFunction,
    SpectralSimilarityScorer,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use tracing::{
    info,
    warn,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListSummary {
    pub id: ListId,
    pub name: String,
    pub rows: usize,
}

/// What happened when one list was merged.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub list: ListId,
    pub name: String,
    pub rows: usize,
    pub matched: usize,
    pub new_consensus_rows: usize,
    pub metrics: PassMetrics,
    /// The list was not merged because the run was cancelled.
    pub cancelled: bool,
}

impl MergeReport {
    fn new(list: &FeatureList) -> Self {
        Self {
            list: list.id(),
            name: list.name().to_string(),
            rows: list.len(),
            matched: 0,
            new_consensus_rows: 0,
            metrics: PassMetrics::default(),
            cancelled: false,
        }
    }
}

/// Merges feature lists one at a time into a growing consensus table.
///
/// The first merged list seeds the table. Each later row either joins the
/// consensus row it was assigned to or starts a new one, so no input row is lost.
pub struct ListAligner<S: SpectralSimilarityScorer = SimilarityFunction> {
    scorer: RowPairScorer<S>,
    /// Kept in search order between merges.
    consensus: Vec<ConsensusRow>,
    lists: Vec<ListSummary>,
    cancel: Arc<AtomicBool>,
    cancelled: bool,
}

impl ListAligner<SimilarityFunction> {
    pub fn new(parameters: &AlignmentParameters) -> Result<Self> {
        Ok(Self::from_scorer(RowPairScorer::new(parameters)?))
    }

    /// Aligns all `lists`, merging them in name order.
    ///
    /// When `cancel` is set mid-run, the lists merged so far are returned and
    /// the result is marked as cancelled.
    #[tracing::instrument(skip_all, fields(lists = lists.len()))]
    pub fn align(
        mut lists: Vec<FeatureList>,
        parameters: &AlignmentParameters,
        cancel: Arc<AtomicBool>,
    ) -> Result<AlignedFeatureList> {
        lists.sort_by(|a, b| a.name().cmp(b.name()));
        let mut aligner = Self::new(parameters)?.with_cancel_flag(cancel);
        for list in lists.iter() {
            if aligner.merge_list(list)?.cancelled {
                break;
            }
        }
        Ok(aligner.finish())
    }
}

impl<S: SpectralSimilarityScorer> ListAligner<S> {
    pub fn from_scorer(scorer: RowPairScorer<S>) -> Self {
        Self {
            scorer,
            consensus: Vec::new(),
            lists: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            cancelled: false,
        }
    }

    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops the aligner when set from another thread.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Current consensus rows, in search order.
    pub fn consensus_rows(&self) -> &[ConsensusRow] {
        &self.consensus
    }

    pub fn merged_lists(&self) -> &[ListSummary] {
        &self.lists
    }

    /// Scores, resolves and commits one list.
    ///
    /// Nothing is committed if the scoring pass is cancelled, so the table
    /// always reflects a whole number of lists.
    ///
    /// # Errors
    ///
    /// [`AlignmentError::ListAlreadyMerged`] if a list with the same id was merged
    /// before. [`AlignmentError::MissingRequiredPeakList`] if any row of `list` has
    /// an MS1-relative fragment scan without a mass list; the list is rejected as a
    /// whole, whatever its position in the merge order. Otherwise any error of
    /// [`RowPairScorer::score_rows`].
    #[tracing::instrument(skip_all, fields(list = %list.id(), name = list.name()))]
    pub fn merge_list(&mut self, list: &FeatureList) -> Result<MergeReport> {
        if self.lists.iter().any(|x| x.id == list.id()) {
            return Err(AlignmentError::ListAlreadyMerged(list.id()));
        }
        // Consensus members are always scorable as candidates
        if let Some(row) = list
            .rows()
            .iter()
            .find(|x| matches!(x.spectrum(), SpectrumAvailability::MissingPeakList))
        {
            return Err(AlignmentError::MissingRequiredPeakList { row: row.id });
        }
        let mut report = MergeReport::new(list);
        if self.cancel.load(Ordering::Relaxed) {
            self.cancelled = true;
            report.cancelled = true;
            return Ok(report);
        }

        let assignments = if self.consensus.is_empty() {
            Vec::new()
        } else {
            let pass = self
                .scorer
                .score_rows(list.rows(), &self.consensus, &self.cancel)?;
            report.metrics = pass.metrics;
            if pass.is_cancelled() {
                warn!("Cancelled while scoring list {}, it was not merged", list.name());
                self.cancelled = true;
                report.cancelled = true;
                return Ok(report);
            }
            resolve(pass.scores, list.len(), self.consensus.len())
        };

        // Consensus ids are dense creation indices
        let mut position: Vec<Option<usize>> = vec![None; self.consensus.len()];
        for (i, row) in self.consensus.iter().enumerate() {
            if let Some(slot) = position.get_mut(row.id().0 as usize) {
                *slot = Some(i);
            }
        }
        let targets = assignments
            .iter()
            .map(|a| {
                position
                    .get(a.consensus.0 as usize)
                    .copied()
                    .flatten()
                    .map(|pos| (pos, a.row))
                    .ok_or(AlignmentError::UnknownConsensusRow(a.consensus))
            })
            .collect::<Result<Vec<(usize, RowId)>>>()?;

        let mut matched = vec![false; list.len()];
        for (pos, row_id) in targets {
            let idx = row_id.index as usize;
            self.consensus[pos].add_row(list.rows()[idx].clone())?;
            matched[idx] = true;
        }

        let mut next_id = self.consensus.len() as u32;
        for (row, _) in list.rows().iter().zip(matched.iter()).filter(|(_, m)| !**m) {
            self.consensus
                .push(ConsensusRow::new(ConsensusRowId(next_id), row.clone()));
            next_id += 1;
        }
        sort_for_search(&mut self.consensus);

        report.matched = assignments.len();
        report.new_consensus_rows = list.len() - assignments.len();
        self.lists.push(ListSummary {
            id: list.id(),
            name: list.name().to_string(),
            rows: list.len(),
        });

        info!(
            "Merged {}: {} of {} rows matched, {} new consensus rows ({} total)",
            list.name(),
            report.matched,
            report.rows,
            report.new_consensus_rows,
            self.consensus.len(),
        );
        Ok(report)
    }

    /// Consumes the aligner, rows come out in creation order.
    pub fn finish(self) -> AlignedFeatureList {
        let mut rows = self.consensus;
        rows.sort_by_key(|x| x.id());
        AlignedFeatureList {
            lists: self.lists,
            rows,
            cancelled: self.cancelled,
        }
    }
}

/// Flat view of a consensus row for output.
#[derive(Debug, Clone, Serialize)]
pub struct AlignedRowSummary {
    pub id: ConsensusRowId,
    pub average_mz: f64,
    pub average_ri: Option<f32>,
    pub representative: RowId,
    pub members: Vec<RowId>,
    pub score: AlignmentScore,
}

/// Result of an alignment run.
#[derive(Debug, Clone)]
pub struct AlignedFeatureList {
    lists: Vec<ListSummary>,
    rows: Vec<ConsensusRow>,
    cancelled: bool,
}

impl AlignedFeatureList {
    /// Lists in merge order.
    pub fn lists(&self) -> &[ListSummary] {
        &self.lists
    }

    /// Consensus rows, index equals id.
    pub fn rows(&self) -> &[ConsensusRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn row(&self, id: ConsensusRowId) -> Result<&ConsensusRow> {
        self.rows
            .get(id.0 as usize)
            .ok_or(AlignmentError::UnknownConsensusRow(id))
    }

    pub fn alignment_scores(&self) -> Vec<AlignmentScore> {
        self.rows
            .iter()
            .map(|x| AlignmentScore::for_row(x, self.lists.len()))
            .collect()
    }

    pub fn summaries(&self) -> Vec<AlignedRowSummary> {
        self.rows
            .iter()
            .map(|x| AlignedRowSummary {
                id: x.id(),
                average_mz: x.average_mz(),
                average_ri: x.average_ri(),
                representative: x.representative().id,
                members: x.members().iter().map(|m| m.id).collect(),
                score: AlignmentScore::for_row(x, self.lists.len()),
            })
            .collect()
    }
}
