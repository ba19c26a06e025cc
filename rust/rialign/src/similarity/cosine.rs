use super::SpectralSimilarity;
use crate::models::{
    DataPoint,
    MzTolerance,
};
use crate::utils::partition_range_by_key;
use serde::{
    Deserialize,
    Serialize,
};

/// Peak weighting `mz^mz_weight * intensity^intensity_weight` and the minimum
/// number of matched signals for a similarity to be reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CosineParameters {
    pub mz_weight: f64,
    pub intensity_weight: f64,
    pub min_matched_signals: usize,
}

impl Default for CosineParameters {
    fn default() -> Self {
        // MassBank weighting
        Self {
            mz_weight: 2.0,
            intensity_weight: 0.5,
            min_matched_signals: 4,
        }
    }
}

impl CosineParameters {
    /// Weights used by the NIST search for EI spectra.
    pub fn nist_gc() -> Self {
        Self {
            mz_weight: 1.3,
            intensity_weight: 0.53,
            min_matched_signals: 4,
        }
    }

    fn weight(&self, peak: &DataPoint) -> f64 {
        let intensity = (peak.intensity as f64).max(0.0);
        if intensity == 0.0 {
            return 0.0;
        }
        peak.mz.max(0.0).powf(self.mz_weight) * intensity.powf(self.intensity_weight)
    }
}

/// Pairs up peaks of `query` and `library` that are within `mz_tolerance`.
///
/// Greedy: the most intense query peak picks first, taking the closest unused
/// library peak. Each peak is used at most once. The result is sorted by query m/z.
///
/// ```
/// use rialign::models::{DataPoint, MzTolerance};
/// use rialign::similarity::match_peaks;
///
/// let a = vec![DataPoint { mz: 73.0, intensity: 100.0 }, DataPoint { mz: 147.1, intensity: 50.0 }];
/// let b = vec![DataPoint { mz: 147.0, intensity: 10.0 }, DataPoint { mz: 200.0, intensity: 5.0 }];
/// let pairs = match_peaks(&MzTolerance::Absolute((0.5, 0.5)), &a, &b);
/// assert_eq!(pairs, vec![(1, 0)]);
/// ```
pub fn match_peaks(
    mz_tolerance: &MzTolerance,
    query: &[DataPoint],
    library: &[DataPoint],
) -> Vec<(usize, usize)> {
    let mut library_by_mz: Vec<usize> = (0..library.len()).collect();
    library_by_mz.sort_by(|&i, &j| library[i].mz.total_cmp(&library[j].mz).then(i.cmp(&j)));

    let mut query_by_intensity: Vec<usize> = (0..query.len()).collect();
    query_by_intensity.sort_by(|&i, &j| {
        query[j]
            .intensity
            .total_cmp(&query[i].intensity)
            .then(i.cmp(&j))
    });

    let mut used = vec![false; library.len()];
    let mut pairs = Vec::new();
    for qi in query_by_intensity {
        let Some(range) = mz_tolerance.mz_range(query[qi].mz) else {
            continue;
        };
        let window = partition_range_by_key(&library_by_mz, range, |&j| library[j].mz);
        let best = library_by_mz[window]
            .iter()
            .copied()
            .filter(|&j| !used[j])
            .min_by(|&x, &y| {
                let dx = (library[x].mz - query[qi].mz).abs();
                let dy = (library[y].mz - query[qi].mz).abs();
                dx.total_cmp(&dy).then(x.cmp(&y))
            });
        if let Some(lj) = best {
            used[lj] = true;
            pairs.push((qi, lj));
        }
    }

    pairs.sort_by(|a, b| query[a.0].mz.total_cmp(&query[b.0].mz).then(a.0.cmp(&b.0)));
    pairs
}

struct CosineParts {
    cosine: f64,
    pairs: Vec<(usize, usize)>,
    query_weights: Vec<f64>,
    library_weights: Vec<f64>,
}

fn cosine_parts(
    params: &CosineParameters,
    mz_tolerance: &MzTolerance,
    query: &[DataPoint],
    library: &[DataPoint],
) -> Option<CosineParts> {
    if query.is_empty() || library.is_empty() {
        return None;
    }
    let pairs = match_peaks(mz_tolerance, query, library);
    if pairs.len() < params.min_matched_signals {
        return None;
    }

    let query_weights: Vec<f64> = query.iter().map(|x| params.weight(x)).collect();
    let library_weights: Vec<f64> = library.iter().map(|x| params.weight(x)).collect();
    let norm_q = query_weights.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_l = library_weights.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_q == 0.0 || norm_l == 0.0 {
        return None;
    }

    let dot: f64 = pairs
        .iter()
        .map(|&(q, l)| query_weights[q] * library_weights[l])
        .sum();

    Some(CosineParts {
        cosine: (dot / (norm_q * norm_l)).clamp(0.0, 1.0),
        pairs,
        query_weights,
        library_weights,
    })
}

/// Cosine of the weighted intensity vectors over the union of peaks.
pub fn weighted_cosine(
    params: &CosineParameters,
    mz_tolerance: &MzTolerance,
    query: &[DataPoint],
    library: &[DataPoint],
) -> Option<SpectralSimilarity> {
    let parts = cosine_parts(params, mz_tolerance, query, library)?;
    Some(SpectralSimilarity {
        score: parts.cosine as f32,
        overlap: parts.pairs.len(),
    })
}

/// NIST composite score: `(N_lib * cos + N_match * ratio) / (N_lib + N_match)`.
///
/// `ratio` averages `min(r, 1/r)` over neighbouring matched peaks, with
/// `r = (q_i / q_{i-1}) / (l_i / l_{i-1})` on the weighted intensities.
/// With fewer than two usable neighbours the plain weighted cosine is returned.
pub fn composite_cosine(
    params: &CosineParameters,
    mz_tolerance: &MzTolerance,
    query: &[DataPoint],
    library: &[DataPoint],
) -> Option<SpectralSimilarity> {
    let parts = cosine_parts(params, mz_tolerance, query, library)?;
    let overlap = parts.pairs.len();

    let ratios: Vec<f64> = parts
        .pairs
        .windows(2)
        .filter_map(|w| {
            let (q0, l0) = w[0];
            let (q1, l1) = w[1];
            let num = parts.query_weights[q1] / parts.query_weights[q0];
            let den = parts.library_weights[l1] / parts.library_weights[l0];
            let r = num / den;
            if r.is_finite() && r > 0.0 {
                Some(r.min(1.0 / r))
            } else {
                None
            }
        })
        .collect();

    let score = if ratios.is_empty() {
        parts.cosine
    } else {
        let ratio = ratios.iter().sum::<f64>() / ratios.len() as f64;
        let n_lib = library.len() as f64;
        let n_match = overlap as f64;
        (n_lib * parts.cosine + n_match * ratio) / (n_lib + n_match)
    };

    Some(SpectralSimilarity {
        score: score.clamp(0.0, 1.0) as f32,
        overlap,
    })
}
