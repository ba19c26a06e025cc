use crate::models::{
    ConsensusRowId,
    ListId,
    RowId,
};
use thiserror::Error;

/// Errors that stop an alignment pass.
///
/// Routinely missing data (no fragment scan, no overlapping signals, rows without RI)
/// is never an error, see [`crate::alignment::SkipReason`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    /// A fragment scan that should carry centroided peaks does not.
    /// Means a mass detection step was skipped upstream.
    #[error("Fragment scan of row {row} has no mass list, run mass detection first")]
    MissingRequiredPeakList { row: RowId },

    #[error("Consensus row {consensus} already holds a row from feature list {list}")]
    DuplicateSourceList {
        consensus: ConsensusRowId,
        list: ListId,
    },

    #[error("Unknown consensus row {0}")]
    UnknownConsensusRow(ConsensusRowId),

    #[error("Feature list {0} was already merged")]
    ListAlreadyMerged(ListId),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
}

impl AlignmentError {
    pub fn invalid_parameter(name: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AlignmentError>;
