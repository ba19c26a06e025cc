use super::ri_record::{
    RetentionIndexColumn,
    RetentionIndexRecord,
};
use crate::errors::{
    AlignmentError,
    Result,
};
use crate::utils::OptionallyRestricted::{
    self,
    Restricted,
    Unrestricted,
};
use crate::utils::TupleRange;
use serde::{
    Deserialize,
    Serialize,
};

/// m/z tolerance used when matching peaks of two spectra.
///
/// Convention: the tuple holds positive half-widths, so `Absolute((0.5, 0.5))`
/// on a value of 100 means the range `[99.5, 100.5]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MzTolerance {
    #[serde(rename = "da")]
    Absolute((f64, f64)),
    #[serde(rename = "ppm")]
    Ppm((f64, f64)),
}

impl Default for MzTolerance {
    fn default() -> Self {
        // Unit resolution GC-EI data
        MzTolerance::Absolute((0.5, 0.5))
    }
}

impl MzTolerance {
    /// Calculate the m/z range around `mz`.
    ///
    /// ```
    /// use rialign::models::MzTolerance;
    ///
    /// let tol = MzTolerance::Ppm((20.0, 20.0));
    /// let range = tol.mz_range(500.0).unwrap();
    /// assert!((range.start() - 499.99).abs() < 0.001);
    /// assert!((range.end() - 500.01).abs() < 0.001);
    /// ```
    ///
    /// Returns `None` for a NaN m/z.
    pub fn mz_range(&self, mz: f64) -> Option<TupleRange<f64>> {
        let (low, high) = match self {
            MzTolerance::Absolute((low, high)) => (*low, *high),
            MzTolerance::Ppm((low, high)) => (mz * low / 1e6, mz * high / 1e6),
        };
        TupleRange::try_new(mz - low, mz + high).ok()
    }

    pub fn validate(&self) -> Result<()> {
        let (low, high) = match self {
            MzTolerance::Absolute(x) => x,
            MzTolerance::Ppm(x) => x,
        };
        if !(low.is_finite() && high.is_finite() && *low >= 0.0 && *high >= 0.0) {
            return Err(AlignmentError::invalid_parameter(
                "mz_tolerance",
                format!("expected finite non-negative half-widths, got ({low}, {high})"),
            ));
        }
        Ok(())
    }
}

/// Admission window over one retention index scale.
///
/// Immutable for the duration of an alignment run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetentionIndexTolerance {
    window: f32,
    #[serde(default)]
    column: RetentionIndexColumn,
    #[serde(default = "default_ignore_missing")]
    ignore_missing: bool,
}

fn default_ignore_missing() -> bool {
    true
}

impl Default for RetentionIndexTolerance {
    fn default() -> Self {
        Self {
            window: 10.0,
            column: RetentionIndexColumn::Default,
            ignore_missing: true,
        }
    }
}

impl RetentionIndexTolerance {
    pub fn try_new(window: f32, column: RetentionIndexColumn, ignore_missing: bool) -> Result<Self> {
        let out = Self {
            window,
            column,
            ignore_missing,
        };
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.window.is_finite() && self.window >= 0.0) {
            return Err(AlignmentError::invalid_parameter(
                "ri_tolerance.window",
                format!("expected a finite value >= 0, got {}", self.window),
            ));
        }
        Ok(())
    }

    pub fn window(&self) -> f32 {
        self.window
    }

    pub fn column(&self) -> RetentionIndexColumn {
        self.column
    }

    pub fn ignore_missing(&self) -> bool {
        self.ignore_missing
    }

    /// `[center - window, center + window]`, inclusive on both ends.
    ///
    /// ```
    /// use rialign::models::{RetentionIndexColumn, RetentionIndexTolerance};
    ///
    /// let tol = RetentionIndexTolerance::try_new(20.0, RetentionIndexColumn::Default, false).unwrap();
    /// let range = tol.admission_range(1200.0).unwrap();
    /// assert_eq!(range.as_tuple(), (1180.0, 1220.0));
    /// ```
    ///
    /// Returns `None` only for a non-finite center.
    pub fn admission_range(&self, center: f32) -> Option<TupleRange<f32>> {
        TupleRange::try_new(center - self.window, center + self.window).ok()
    }

    /// Admission range for a possibly missing RI. Missing values do not restrict anything.
    pub fn admission_range_for(&self, center: Option<f32>) -> OptionallyRestricted<TupleRange<f32>> {
        match center.and_then(|x| self.admission_range(x)) {
            Some(range) => Restricted(range),
            None => Unrestricted,
        }
    }

    /// Whether `query_ri` is inside the admission range of the record value for
    /// the configured column.
    ///
    /// A missing record, or a record without a value for the column (after the
    /// default fallback), always passes. Exclusion of missing data is opt-in
    /// through [`Self::should_ignore`].
    pub fn within(&self, query_ri: f32, record: Option<&RetentionIndexRecord>) -> bool {
        self.admission_range_for(record.and_then(|r| r.get(self.column)))
            .is_unrestricted_or(|range| range.contains(query_ri))
    }

    /// Symmetric check of two plain RI values.
    pub fn within_values(&self, ri_a: f32, ri_b: f32) -> bool {
        self.admission_range(ri_a)
            .is_some_and(|range| range.contains(ri_b))
    }

    /// Gate used to skip an entry before any candidate search: true only when
    /// missing values are configured to be ignored and the record has no value
    /// for the column.
    pub fn should_ignore(&self, record: Option<&RetentionIndexRecord>) -> bool {
        self.ignore_missing && record.and_then(|r| r.get(self.column)).is_none()
    }

    /// Proximity of two RI values scaled to `[0, 1]`: 1 for identical values,
    /// 0 at (or beyond) the window edge.
    pub fn proximity(&self, ri_a: f32, ri_b: f32) -> f32 {
        let delta = (ri_a - ri_b).abs();
        if self.window == 0.0 {
            return if delta == 0.0 { 1.0 } else { 0.0 };
        }
        (1.0 - delta / self.window).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol(window: f32, ignore_missing: bool) -> RetentionIndexTolerance {
        RetentionIndexTolerance::try_new(window, RetentionIndexColumn::Semipolar, ignore_missing)
            .unwrap()
    }

    #[test]
    fn test_admission_range() {
        let t = tol(20.0, false);
        let range = t.admission_range(1200.0).unwrap();
        assert_eq!(range.start(), 1180.0);
        assert_eq!(range.end(), 1220.0);
        assert!(range.contains(1180.0));
        assert!(range.contains(1220.0));
    }

    #[test]
    fn test_within_record() {
        let t = tol(20.0, false);
        let record = RetentionIndexRecord::from_default(1200.0);
        assert!(t.within(1195.0, Some(&record)));
        assert!(t.within(1220.0, Some(&record)));
        assert!(!t.within(1221.0, Some(&record)));
        assert!(!t.within(1179.0, Some(&record)));
    }

    #[test]
    fn test_within_uses_column() {
        let t = tol(5.0, false);
        let record = RetentionIndexRecord::parse("s=1200 n=1100");
        assert!(t.within(1201.0, Some(&record)));
        assert!(!t.within(1101.0, Some(&record)));
    }

    #[test]
    fn test_missing_record_passes() {
        for ignore in [true, false] {
            let t = tol(1.0, ignore);
            assert!(t.within(0.0, None));
            assert!(t.within(1.0e6, None));
            // Only a nonpolar value, no default to fall back to
            let record = RetentionIndexRecord::parse("n=1100");
            assert!(t.within(5.0, Some(&record)));
        }
    }

    #[test]
    fn test_should_ignore() {
        assert!(tol(1.0, true).should_ignore(None));
        assert!(!tol(1.0, false).should_ignore(None));

        let nonpolar_only = RetentionIndexRecord::parse("n=1100");
        assert!(tol(1.0, true).should_ignore(Some(&nonpolar_only)));
        assert!(!tol(1.0, false).should_ignore(Some(&nonpolar_only)));

        let with_default = RetentionIndexRecord::parse("n=1100 1000");
        assert!(!tol(1.0, true).should_ignore(Some(&with_default)));
    }

    #[test]
    fn test_proximity() {
        let t = tol(20.0, false);
        assert_eq!(t.proximity(1200.0, 1200.0), 1.0);
        assert_eq!(t.proximity(1200.0, 1210.0), 0.5);
        assert_eq!(t.proximity(1200.0, 1250.0), 0.0);
        assert!(t.proximity(1200.0, 1201.0) > t.proximity(1200.0, 1202.0));

        let zero = tol(0.0, false);
        assert_eq!(zero.proximity(5.0, 5.0), 1.0);
        assert_eq!(zero.proximity(5.0, 5.1), 0.0);
    }

    #[test]
    fn test_invalid_window() {
        assert!(RetentionIndexTolerance::try_new(-1.0, RetentionIndexColumn::Default, true).is_err());
        assert!(RetentionIndexTolerance::try_new(f32::NAN, RetentionIndexColumn::Default, true).is_err());
    }

    #[test]
    fn test_deserialize() {
        let t: RetentionIndexTolerance =
            serde_json::from_str(r#"{"window": 15.0, "column": "nonpolar"}"#).unwrap();
        assert_eq!(t.window(), 15.0);
        assert_eq!(t.column(), RetentionIndexColumn::Nonpolar);
        assert!(t.ignore_missing());

        let mz: MzTolerance = serde_json::from_str(r#"{"ppm": [10.0, 10.0]}"#).unwrap();
        assert_eq!(mz, MzTolerance::Ppm((10.0, 10.0)));
    }
}
