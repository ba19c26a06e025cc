use thiserror::Error;

/// Finds the index range of elements in a sorted slice whose keys fall within `range`.
///
/// The slice must be sorted ascending by `key_fn`. Both ends of `range` are inclusive,
/// so the returned `Range<usize>` can be used directly to slice the input.
///
/// Keys only need `PartialOrd` so that float keys (retention indices) can be searched
/// without wrapping them; a NaN key never compares inside the range.
///
/// # Examples
///
/// ```
/// use rialign::utils::{TupleRange, partition_range_by_key};
///
/// let ris = vec![1000.0_f32, 1100.0, 1180.0, 1200.0, 1220.0, 1300.0];
/// let range = TupleRange::try_new(1180.0, 1220.0).unwrap();
/// let idx = partition_range_by_key(&ris, range, |&x| x);
/// assert_eq!(&ris[idx], &[1180.0, 1200.0, 1220.0]);
/// ```
pub fn partition_range_by_key<T, K, F>(
    slice: &[T],
    range: TupleRange<K>,
    key_fn: F,
) -> std::ops::Range<usize>
where
    F: Fn(&T) -> K,
    K: Copy + PartialOrd,
{
    let start_idx = slice.partition_point(|x| key_fn(x) < range.start());
    let end_idx = start_idx + slice[start_idx..].partition_point(|x| key_fn(x) <= range.end());

    start_idx..end_idx
}

/// Closed-closed range `[a, b]` where `a <= b` is guaranteed on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TupleRange<T: Copy + PartialOrd>(T, T);

#[derive(Error, Debug)]
pub enum TupleRangeError<T: Copy + PartialOrd + std::fmt::Debug> {
    #[error(
        "Expected the first element to be less than or equal to the second, got ({0:?}, {1:?})"
    )]
    ExpectedOrderedRange(T, T),
}

impl<T: Copy + PartialOrd + std::fmt::Debug> TupleRange<T> {
    pub fn try_new(left: T, right: T) -> Result<Self, TupleRangeError<T>> {
        // Also rejects NaN bounds, since NaN <= NaN is false
        if left <= right {
            Ok(Self(left, right))
        } else {
            Err(TupleRangeError::ExpectedOrderedRange(left, right))
        }
    }
}

impl<T: Copy + PartialOrd> TupleRange<T> {
    pub fn as_tuple(&self) -> (T, T) {
        (self.0, self.1)
    }

    pub fn contains(&self, x: T) -> bool {
        self.0 <= x && x <= self.1
    }

    pub fn start(&self) -> T {
        self.0
    }

    pub fn end(&self) -> T {
        self.1
    }
}

/// A value that is either restricted to a range or not restricted at all.
///
/// Same shape as `Option<T>` but with different meaning: `Unrestricted` means
/// "everything passes", not "nothing there".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionallyRestricted<T: Copy> {
    Restricted(T),
    Unrestricted,
}

impl<T: Copy> OptionallyRestricted<T> {
    pub fn is_unrestricted_or(&self, f: impl FnOnce(&T) -> bool) -> bool {
        match self {
            OptionallyRestricted::Restricted(x) => f(x),
            OptionallyRestricted::Unrestricted => true,
        }
    }
}
