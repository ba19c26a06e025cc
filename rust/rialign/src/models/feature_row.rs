use super::ri_record::RetentionIndexRecord;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::sync::Arc;

/// Index of a feature list in the set being aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListId(pub u32);

impl Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle of a row: its list and its position in that list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId {
    pub list: ListId,
    pub index: u32,
}

impl Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.list, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub mz: f64,
    pub intensity: f32,
}

/// Fragment (or GC-EI pseudo) spectrum of a feature.
///
/// `mass_list` holds the centroided peaks; it is `None` when mass detection
/// was never run on the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentScan {
    pub ms_level: u8,
    #[serde(default)]
    pub mass_list: Option<Vec<DataPoint>>,
}

/// What a row offers for spectral comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpectrumAvailability<'a> {
    Usable(&'a [DataPoint]),
    NoScan,
    NotMs1,
    MissingPeakList,
}

/// One detected compound of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub id: RowId,
    pub average_mz: f64,
    pub average_ri: Option<f32>,
    pub height: f32,
    pub most_intense_fragment_scan: Option<FragmentScan>,
}

impl FeatureRow {
    /// The row's own RI as a record with only a default entry.
    pub fn ri_record(&self) -> Option<RetentionIndexRecord> {
        self.average_ri.map(RetentionIndexRecord::from_default)
    }

    /// GC-EI alignment compares the MS1 pseudo spectra of the features.
    pub fn spectrum(&self) -> SpectrumAvailability<'_> {
        match &self.most_intense_fragment_scan {
            None => SpectrumAvailability::NoScan,
            Some(scan) if scan.ms_level != 1 => SpectrumAvailability::NotMs1,
            Some(FragmentScan {
                mass_list: None, ..
            }) => SpectrumAvailability::MissingPeakList,
            Some(FragmentScan {
                mass_list: Some(peaks),
                ..
            }) => SpectrumAvailability::Usable(peaks),
        }
    }
}

/// Row as read from input, before it gets a handle.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureRowInput {
    pub average_mz: f64,
    #[serde(default)]
    pub average_ri: Option<f32>,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub most_intense_fragment_scan: Option<FragmentScan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureListInput {
    pub name: String,
    pub rows: Vec<FeatureRowInput>,
}

/// Rows of one run. Rows are shared (`Arc`) with the consensus rows that
/// reference them.
#[derive(Debug, Clone)]
pub struct FeatureList {
    id: ListId,
    name: String,
    rows: Vec<Arc<FeatureRow>>,
}

impl FeatureList {
    pub fn new(id: ListId, name: impl Into<String>, rows: Vec<FeatureRowInput>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                Arc::new(FeatureRow {
                    id: RowId {
                        list: id,
                        index: i as u32,
                    },
                    average_mz: row.average_mz,
                    average_ri: row.average_ri,
                    height: row.height,
                    most_intense_fragment_scan: row.most_intense_fragment_scan,
                })
            })
            .collect();
        Self {
            id,
            name: name.into(),
            rows,
        }
    }

    pub fn from_input(id: ListId, input: FeatureListInput) -> Self {
        Self::new(id, input.name, input.rows)
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Arc<FeatureRow>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_scan(scan: Option<FragmentScan>) -> FeatureRowInput {
        FeatureRowInput {
            average_mz: 100.0,
            average_ri: Some(1000.0),
            height: 1.0,
            most_intense_fragment_scan: scan,
        }
    }

    #[test]
    fn test_spectrum_availability() {
        let peaks = vec![DataPoint {
            mz: 73.0,
            intensity: 100.0,
        }];
        let list = FeatureList::new(
            ListId(3),
            "run",
            vec![
                row_with_scan(None),
                row_with_scan(Some(FragmentScan {
                    ms_level: 2,
                    mass_list: Some(peaks.clone()),
                })),
                row_with_scan(Some(FragmentScan {
                    ms_level: 1,
                    mass_list: None,
                })),
                row_with_scan(Some(FragmentScan {
                    ms_level: 1,
                    mass_list: Some(peaks.clone()),
                })),
            ],
        );
        let rows = list.rows();
        assert_eq!(rows[0].spectrum(), SpectrumAvailability::NoScan);
        assert_eq!(rows[1].spectrum(), SpectrumAvailability::NotMs1);
        assert_eq!(rows[2].spectrum(), SpectrumAvailability::MissingPeakList);
        assert_eq!(rows[3].spectrum(), SpectrumAvailability::Usable(&peaks));
        assert_eq!(
            rows[3].id,
            RowId {
                list: ListId(3),
                index: 3
            }
        );
    }

    #[test]
    fn test_deserialize_list_input() {
        let input: FeatureListInput = serde_json::from_str(
            r#"{
                "name": "sample_a",
                "rows": [
                    {"average_mz": 73.0, "average_ri": 1200.5, "height": 10.0,
                     "most_intense_fragment_scan": {"ms_level": 1, "mass_list": [{"mz": 73.0, "intensity": 999.0}]}},
                    {"average_mz": 147.0}
                ]
            }"#,
        )
        .unwrap();
        let list = FeatureList::from_input(ListId(0), input);
        assert_eq!(list.name(), "sample_a");
        assert_eq!(list.len(), 2);
        assert_eq!(list.rows()[0].average_ri, Some(1200.5));
        assert!(list.rows()[1].average_ri.is_none());
        assert!(list.rows()[1].ri_record().is_none());
        assert_eq!(
            list.rows()[0].ri_record().unwrap().get(crate::models::RetentionIndexColumn::Polar),
            Some(1200.5)
        );
    }
}
