use super::feature_row::{
    FeatureRow,
    ListId,
};
use crate::errors::{
    AlignmentError,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::cmp::Ordering;
use std::fmt::Display;
use std::sync::Arc;

/// Creation-order id of a consensus row. Doubles as its index in the aligned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsensusRowId(pub u32);

impl Display for ConsensusRowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A compound merged across runs.
///
/// References (does not copy) at most one contributing row per source list.
/// Rows are only ever added, never removed.
#[derive(Debug, Clone)]
pub struct ConsensusRow {
    id: ConsensusRowId,
    members: Vec<Arc<FeatureRow>>,
    representative: usize,
    average_ri: Option<f32>,
    average_mz: f64,
}

impl ConsensusRow {
    pub fn new(id: ConsensusRowId, row: Arc<FeatureRow>) -> Self {
        let average_ri = row.average_ri;
        let average_mz = row.average_mz;
        Self {
            id,
            members: vec![row],
            representative: 0,
            average_ri,
            average_mz,
        }
    }

    pub fn id(&self) -> ConsensusRowId {
        self.id
    }

    /// Mean RI of the members that have one.
    pub fn average_ri(&self) -> Option<f32> {
        self.average_ri
    }

    pub fn average_mz(&self) -> f64 {
        self.average_mz
    }

    pub fn members(&self) -> &[Arc<FeatureRow>] {
        &self.members
    }

    /// Most intense member; its fragment scan stands in for the whole row.
    pub fn representative(&self) -> &FeatureRow {
        &self.members[self.representative]
    }

    pub fn contains_list(&self, list: ListId) -> bool {
        self.members.iter().any(|x| x.id.list == list)
    }

    pub fn add_row(&mut self, row: Arc<FeatureRow>) -> Result<()> {
        if self.contains_list(row.id.list) {
            return Err(AlignmentError::DuplicateSourceList {
                consensus: self.id,
                list: row.id.list,
            });
        }
        if row.height > self.representative().height {
            self.representative = self.members.len();
        }
        self.members.push(row);
        self.update_averages();
        Ok(())
    }

    fn update_averages(&mut self) {
        let (ri_sum, ri_count) = self
            .members
            .iter()
            .filter_map(|x| x.average_ri)
            .fold((0.0_f64, 0usize), |(s, n), ri| (s + ri as f64, n + 1));
        self.average_ri = if ri_count == 0 {
            None
        } else {
            Some((ri_sum / ri_count as f64) as f32)
        };
        self.average_mz =
            self.members.iter().map(|x| x.average_mz).sum::<f64>() / self.members.len() as f64;
    }

    /// Order used by the candidate search: RI ascending, rows without RI last,
    /// ties by creation order.
    pub fn search_order(&self, other: &Self) -> Ordering {
        match (self.average_ri, other.average_ri) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then(self.id.cmp(&other.id))
    }
}

/// Sorts consensus rows into the order [`crate::alignment::CandidateSearch`] expects.
pub fn sort_for_search(rows: &mut [ConsensusRow]) {
    rows.sort_by(ConsensusRow::search_order);
}
