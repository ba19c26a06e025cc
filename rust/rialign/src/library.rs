//! Annotation of feature rows against a spectral library with retention indices.

use crate::errors::Result;
use crate::models::{
    DataPoint,
    FeatureRow,
    MzTolerance,
    RetentionIndexRecord,
    RetentionIndexTolerance,
    SpectrumAvailability,
};
use crate::similarity::{
    SimilarityFunction,
    SpectralSimilarity,
    SpectralSimilarityScorer,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::borrow::Borrow;
use tracing::debug;

/// One library compound.
///
/// `ri` uses the record text format, e.g. `"s=1234/5/2.0 n=1100"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub ri: Option<RetentionIndexRecord>,
    pub spectrum: Vec<DataPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibrarySearchParameters {
    pub mz_tolerance: MzTolerance,
    pub ri_tolerance: RetentionIndexTolerance,
    pub similarity: SimilarityFunction,
    /// Matches below this similarity are dropped.
    pub min_score: f32,
    /// Keep at most this many matches per row.
    pub max_hits: usize,
}

impl Default for LibrarySearchParameters {
    fn default() -> Self {
        Self {
            mz_tolerance: MzTolerance::default(),
            ri_tolerance: RetentionIndexTolerance::default(),
            similarity: SimilarityFunction::default(),
            min_score: 0.7,
            max_hits: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LibraryMatch<'a> {
    pub entry: &'a LibraryEntry,
    /// Position of `entry` in the searched library.
    pub entry_index: usize,
    pub similarity: SpectralSimilarity,
}

/// Ranks library entries for a row by spectral similarity, after gating on RI.
pub struct LibrarySearch<'a> {
    entries: &'a [LibraryEntry],
    parameters: LibrarySearchParameters,
}

impl<'a> LibrarySearch<'a> {
    pub fn new(entries: &'a [LibraryEntry], parameters: LibrarySearchParameters) -> Result<Self> {
        parameters.mz_tolerance.validate()?;
        parameters.ri_tolerance.validate()?;
        parameters.similarity.validate()?;
        Ok(Self {
            entries,
            parameters,
        })
    }

    /// Whether `entry` passes the RI gate for a row with `row_ri`.
    ///
    /// Entries without a usable RI are either dropped (when missing values are
    /// ignored) or always pass. A row without RI has nothing to compare and passes.
    fn passes_ri_gate(&self, row_ri: Option<f32>, entry: &LibraryEntry) -> bool {
        let tolerance = &self.parameters.ri_tolerance;
        if tolerance.should_ignore(entry.ri.as_ref()) {
            return false;
        }
        match row_ri {
            Some(ri) => tolerance.within(ri, entry.ri.as_ref()),
            None => true,
        }
    }

    /// Matches of `row`, best first. Ties keep library order.
    pub fn search(&self, row: &FeatureRow) -> Vec<LibraryMatch<'a>> {
        let SpectrumAvailability::Usable(query) = row.spectrum() else {
            debug!(row = %row.id, "No usable spectrum for library search");
            return Vec::new();
        };

        let mut out: Vec<LibraryMatch<'a>> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.passes_ri_gate(row.average_ri, entry))
            .filter_map(|(entry_index, entry)| {
                let similarity = self.parameters.similarity.similarity(
                    &self.parameters.mz_tolerance,
                    query,
                    &entry.spectrum,
                )?;
                (similarity.score >= self.parameters.min_score).then_some(LibraryMatch {
                    entry,
                    entry_index,
                    similarity,
                })
            })
            .collect();

        out.sort_by(|a, b| {
            b.similarity
                .score
                .total_cmp(&a.similarity.score)
                .then(a.entry_index.cmp(&b.entry_index))
        });
        out.truncate(self.parameters.max_hits);
        out
    }

    /// [`Self::search`] over many rows in parallel, output in input order.
    pub fn search_all<R>(&self, rows: &[R]) -> Vec<Vec<LibraryMatch<'a>>>
    where
        R: Borrow<FeatureRow> + Sync,
    {
        rows.par_iter().map(|x| self.search(x.borrow())).collect()
    }
}
