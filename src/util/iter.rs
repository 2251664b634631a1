//! Small iterators used by branching steps

use crate::error::{TraversalError, TraversalResult};

/// Yields exactly two values, then reports exhaustion
///
/// [`DoubleIterator::advance`] fails past the end; the [`Iterator`] impl
/// returns `None` instead.
#[derive(Debug, Clone)]
pub struct DoubleIterator<T> {
    first: Option<T>,
    second: Option<T>,
}

impl<T> DoubleIterator<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            first: Some(first),
            second: Some(second),
        }
    }

    pub fn has_next(&self) -> bool {
        self.first.is_some() || self.second.is_some()
    }

    /// Next value, or `NoSuchElement` once both have been taken
    pub fn advance(&mut self) -> TraversalResult<T> {
        self.next().ok_or(TraversalError::NoSuchElement)
    }
}

impl<T> Iterator for DoubleIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.first.take().or_else(|| self.second.take())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.first.is_some() as usize + self.second.is_some() as usize;
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for DoubleIterator<T> {}
