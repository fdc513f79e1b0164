use core::{fmt, iter::FusedIterator, marker::PhantomData, ops::Range};

use crate::Id;

/// Ids with consecutive positions, `start` included and `end` excluded.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdRange<I> {
    positions: (usize, usize),
    _ids: PhantomData<I>,
}

impl<I: Id> IdRange<I> {
    /// The ids at the positions in `range`.
    ///
    /// # Panics
    ///
    /// Panics for a reversed range or one reaching past the id capacity.
    #[track_caller]
    pub fn from_index_range(range: Range<usize>) -> Self {
        assert!(range.start <= range.end, "reversed id range {range:?}");
        assert!(range.end <= I::CAPACITY, "id range {range:?} exceeds the id capacity");
        IdRange {
            positions: (range.start, range.end),
            _ids: PhantomData,
        }
    }

    /// Iterates the ids in increasing order.
    #[inline(always)]
    pub fn iter(&self) -> IdRangeIter<I> {
        IdRangeIter {
            positions: self.positions.0..self.positions.1,
            _ids: PhantomData,
        }
    }

    /// Number of ids.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.positions.1 - self.positions.0
    }

    /// Whether the range holds no id.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` lies within the range.
    #[inline]
    pub fn contains(&self, id: I) -> bool {
        let index = id.id_index();
        self.positions.0 <= index && index < self.positions.1
    }

    /// The id `n` places after the first one.
    #[inline]
    pub fn nth(&self, n: usize) -> Option<I> {
        if n < self.len() {
            Some(I::from_id_index(self.positions.0 + n))
        } else {
            None
        }
    }
}

impl<I: Id> fmt::Debug for IdRange<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.nth(0), self.len().checked_sub(1).and_then(|last| self.nth(last))) {
            (Some(first), Some(last)) => write!(f, "{first:?}..={last:?}"),
            _ => write!(f, "{}..{}", self.positions.0, self.positions.1),
        }
    }
}

impl<I: Id> IntoIterator for IdRange<I> {
    type Item = I;
    type IntoIter = IdRangeIter<I>;

    #[inline(always)]
    fn into_iter(self) -> IdRangeIter<I> {
        self.iter()
    }
}

impl<I: Id> IntoIterator for &IdRange<I> {
    type Item = I;
    type IntoIter = IdRangeIter<I>;

    #[inline(always)]
    fn into_iter(self) -> IdRangeIter<I> {
        self.iter()
    }
}

/// Iterator over an [`IdRange`].
#[derive(Clone, Debug)]
pub struct IdRangeIter<I> {
    positions: Range<usize>,
    _ids: PhantomData<I>,
}

impl<I: Id> Iterator for IdRangeIter<I> {
    type Item = I;

    #[inline(always)]
    fn next(&mut self) -> Option<I> {
        self.positions.next().map(I::from_id_index)
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}

impl<I: Id> DoubleEndedIterator for IdRangeIter<I> {
    #[inline(always)]
    fn next_back(&mut self) -> Option<I> {
        self.positions.next_back().map(I::from_id_index)
    }
}

impl<I: Id> ExactSizeIterator for IdRangeIter<I> {}

impl<I: Id> FusedIterator for IdRangeIter<I> {}
