//! Type checked integer ids and id-indexed collections.
//!
//! Circuit elements reference each other through small integer ids into a single owned array.
//! This crate provides the [`Id`] trait, the [`define_id!`] macro that declares newtype ids, and
//! the [`IdVec`] / [`IdRange`] collections keyed by them.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod id;
mod id_range;
mod id_vec;

pub use id::Id;
pub use id_range::{IdRange, IdRangeIter};
pub use id_vec::IdVec;

/// Declares a `u32` backed newtype implementing [`Id`].
///
/// The generated type derives all comparison and hashing traits so that ordering two ids is the
/// same as ordering their indices. Its [`Debug`][core::fmt::Debug] output is `Name(index)`.
///
/// ```
/// atpg_ids::define_id! {
///     /// Index of a node.
///     pub struct NodeId;
/// }
///
/// use atpg_ids::Id;
/// assert_eq!(NodeId::from_id_index(3).id_index(), 3);
/// ```
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        $vis struct $name(u32);

        impl $crate::Id for $name {
            const CAPACITY: usize = (u32::MAX as usize).saturating_add(1);
            const MIN_ID: Self = Self(0);

            #[inline(always)]
            fn try_from_id_index(index: usize) -> Option<Self> {
                u32::try_from(index).ok().map(Self)
            }

            #[inline(always)]
            fn id_index(self) -> usize {
                self.0 as usize
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}
