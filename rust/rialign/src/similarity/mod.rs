//! Spectral similarity between two centroided spectra.

mod cosine;

pub use cosine::{
    CosineParameters,
    composite_cosine,
    match_peaks,
    weighted_cosine,
};

use crate::errors::{
    AlignmentError,
    Result,
};
use crate::models::{
    DataPoint,
    MzTolerance,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Similarity of two spectra plus the number of signals that overlapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralSimilarity {
    /// In `[0, 1]`.
    pub score: f32,
    pub overlap: usize,
}

/// Anything that can compare two spectra.
///
/// Returns `None` when the spectra cannot be compared (too few overlapping signals,
/// empty spectra). Implementations must be deterministic and free of side effects:
/// they are called from many threads at once.
pub trait SpectralSimilarityScorer: Send + Sync {
    fn similarity(
        &self,
        mz_tolerance: &MzTolerance,
        query: &[DataPoint],
        library: &[DataPoint],
    ) -> Option<SpectralSimilarity>;
}

/// Configurable similarity function.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimilarityFunction {
    WeightedCosine(CosineParameters),
    /// NIST style composite of weighted cosine and peak-ratio agreement.
    CompositeCosine(CosineParameters),
}

impl Default for SimilarityFunction {
    fn default() -> Self {
        SimilarityFunction::CompositeCosine(CosineParameters::nist_gc())
    }
}

impl SimilarityFunction {
    pub fn validate(&self) -> Result<()> {
        let params = match self {
            SimilarityFunction::WeightedCosine(x) => x,
            SimilarityFunction::CompositeCosine(x) => x,
        };
        if !(params.mz_weight.is_finite() && params.intensity_weight.is_finite()) {
            return Err(AlignmentError::invalid_parameter(
                "similarity",
                "weights must be finite",
            ));
        }
        if params.min_matched_signals == 0 {
            return Err(AlignmentError::invalid_parameter(
                "similarity.min_matched_signals",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl SpectralSimilarityScorer for SimilarityFunction {
    fn similarity(
        &self,
        mz_tolerance: &MzTolerance,
        query: &[DataPoint],
        library: &[DataPoint],
    ) -> Option<SpectralSimilarity> {
        match self {
            SimilarityFunction::WeightedCosine(params) => {
                weighted_cosine(params, mz_tolerance, query, library)
            }
            SimilarityFunction::CompositeCosine(params) => {
                composite_cosine(params, mz_tolerance, query, library)
            }
        }
    }
}
