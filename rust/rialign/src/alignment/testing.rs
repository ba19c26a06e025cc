//! Builders shared by the alignment unit tests.

use super::AlignmentParameters;
use crate::models::{
    DataPoint,
    FeatureList,
    FeatureRowInput,
    FragmentScan,
    ListId,
    RetentionIndexColumn,
    RetentionIndexTolerance,
};
use crate::similarity::{
    CosineParameters,
    SimilarityFunction,
};

pub(crate) const SPECTRUM_A: &[(f64, f32)] = &[(73.0, 100.0), (147.0, 50.0), (207.0, 20.0), (281.0, 8.0)];
pub(crate) const SPECTRUM_B: &[(f64, f32)] = &[(91.0, 100.0), (105.0, 60.0), (119.0, 10.0), (133.0, 4.0)];
/// Shares three of four peaks with [`SPECTRUM_A`].
pub(crate) const SPECTRUM_A_LIKE: &[(f64, f32)] = &[(73.0, 90.0), (147.0, 60.0), (207.0, 20.0), (355.0, 8.0)];

pub(crate) fn row(mz: f64, ri: Option<f32>, peaks: &[(f64, f32)]) -> FeatureRowInput {
    FeatureRowInput {
        average_mz: mz,
        average_ri: ri,
        height: peaks.iter().map(|x| x.1).sum(),
        most_intense_fragment_scan: Some(FragmentScan {
            ms_level: 1,
            mass_list: Some(
                peaks
                    .iter()
                    .map(|&(mz, intensity)| DataPoint { mz, intensity })
                    .collect(),
            ),
        }),
    }
}

pub(crate) fn list(id: u32, name: &str, rows: Vec<FeatureRowInput>) -> FeatureList {
    FeatureList::new(ListId(id), name, rows)
}

/// Plain (unweighted) cosine needing two matched peaks.
pub(crate) fn params(window: f32, ri_weight: f32, ignore_missing: bool) -> AlignmentParameters {
    AlignmentParameters {
        ri_tolerance: RetentionIndexTolerance::try_new(
            window,
            RetentionIndexColumn::Default,
            ignore_missing,
        )
        .unwrap(),
        ri_weight,
        similarity: SimilarityFunction::WeightedCosine(CosineParameters {
            mz_weight: 0.0,
            intensity_weight: 1.0,
            min_matched_signals: 2,
        }),
        ..AlignmentParameters::default()
    }
}
