//! Iteration over the features of an array.

use std::iter::FusedIterator;

use crate::array::FeatureArray;
use crate::feature::Feature;

/// Iterator over the features of a [`FeatureArray`], in header order.
///
/// Created by [`FeatureArray::iter`].
pub struct Features<'f, P> {
    array: &'f FeatureArray<'f, P>,
    front: usize,
    back: usize,
}

impl<'f, P> Features<'f, P> {
    pub(crate) fn new(array: &'f FeatureArray<'f, P>) -> Self {
        Self {
            array,
            front: 0,
            back: array.len(),
        }
    }
}

impl<P> Clone for Features<'_, P> {
    fn clone(&self) -> Self {
        Self {
            array: self.array,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'f, P> Iterator for Features<'f, P> {
    type Item = Feature<'f, P>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let feature = Feature::new(self.array, self.front);
        self.front += 1;
        Some(feature)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<P> DoubleEndedIterator for Features<'_, P> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(Feature::new(self.array, self.back))
    }
}

impl<P> ExactSizeIterator for Features<'_, P> {}

impl<P> FusedIterator for Features<'_, P> {}
