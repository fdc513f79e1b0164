use core::{fmt::Debug, hash::Hash};

/// A typed index into an id-keyed collection.
///
/// Every id stands for one `usize` position. Equality, ordering and hashing of ids agree with
/// those of their positions, so ids can be sorted or used as map keys in place of the position.
/// New id types are declared with [`define_id!`][crate::define_id].
pub trait Id: Copy + Ord + Hash + Debug {
    /// Number of distinct ids of this type.
    const CAPACITY: usize;

    /// The first id, at position zero.
    const MIN_ID: Self;

    /// Converts a position into an id, `None` when the position is not below
    /// [`CAPACITY`][Self::CAPACITY].
    fn try_from_id_index(index: usize) -> Option<Self>;

    /// Position of this id.
    fn id_index(self) -> usize;

    /// Converts a position into an id.
    ///
    /// # Panics
    ///
    /// Panics when the position is not below [`CAPACITY`][Self::CAPACITY].
    #[inline(always)]
    #[track_caller]
    fn from_id_index(index: usize) -> Self {
        let Some(id) = Self::try_from_id_index(index) else {
            panic!("position {index} is out of range for {} ids", Self::CAPACITY);
        };
        id
    }
}
