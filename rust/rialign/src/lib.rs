pub mod alignment;
pub mod errors;
pub mod library;
pub mod models;
pub mod similarity;
pub mod utils;

pub use errors::{
    AlignmentError,
    Result,
};

#[doc(inline)]
pub use alignment::{
    AlignedFeatureList,
    AlignmentParameters,
    CandidateSearch,
    ListAligner,
    PairScore,
    RowPairScorer,
};

#[doc(inline)]
pub use models::{
    FeatureList,
    FeatureRow,
    RetentionIndexColumn,
    RetentionIndexRecord,
    RetentionIndexTolerance,
};

#[doc(inline)]
pub use library::{
    LibraryEntry,
    LibrarySearch,
};
