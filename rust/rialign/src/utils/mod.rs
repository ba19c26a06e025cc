pub mod ranges;

pub use ranges::{
    OptionallyRestricted,
    TupleRange,
    TupleRangeError,
    partition_range_by_key,
};
