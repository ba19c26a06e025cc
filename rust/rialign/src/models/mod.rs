pub mod consensus;
pub mod feature_row;
pub mod ri_record;
pub mod tolerance;

pub use consensus::{
    ConsensusRow,
    ConsensusRowId,
    sort_for_search,
};
pub use feature_row::{
    DataPoint,
    FeatureList,
    FeatureListInput,
    FeatureRow,
    FeatureRowInput,
    FragmentScan,
    ListId,
    RowId,
    SpectrumAvailability,
};
pub use ri_record::{
    RetentionIndexColumn,
    RetentionIndexRecord,
    RetentionIndexRecordPart,
};
pub use tolerance::{
    MzTolerance,
    RetentionIndexTolerance,
};
