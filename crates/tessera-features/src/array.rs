//! The feature array and its synchronized mutators.
//!
//! Every mutator here edits the header buffer and the point buffer
//! together and shifts the offsets of the headers behind the edit, so an
//! aligned array stays aligned. Insertion and removal at a header index
//! need a coherent offset chain to find the point position and therefore
//! require the array to be aligned; appending at the end does not.

use std::fmt;
use std::ops::Range;

use log::trace;
use tessera_buffer::CowBuffer;
use tessera_core::{FeatureSource, FeatureType, GroupId, Header};

use crate::config::FeatureArrayConfig;
use crate::feature::{Feature, FeatureMut};
use crate::iter::Features;

/// A sequence of variable-length features over two contiguous buffers.
///
/// `P` is the point type. `'a` is the lifetime of wrapped external memory;
/// arrays that own their storage are `FeatureArray<'static, P>`.
///
/// Cloning shares both buffers. The clone and the original diverge on the
/// first mutation of either.
#[derive(Clone)]
pub struct FeatureArray<'a, P> {
    /// One header per feature, in feature order.
    pub(crate) headers: CowBuffer<'a, Header>,
    /// All points of all features.
    pub(crate) points: CowBuffer<'a, P>,
    /// Whether the header windows tile `points` in header order.
    pub(crate) aligned: bool,
}

// Compile-time assertion: arrays of plain points can cross threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FeatureArray<'static, tessera_core::Point3d>>();
};

/// Convert a point count or position to a header offset.
///
/// # Panics
///
/// Panics if `n` does not fit the `u32` offset range.
pub(crate) fn offset_u32(n: usize) -> u32 {
    assert!(
        n <= u32::MAX as usize,
        "{n} points exceed the u32 offset range"
    );
    n as u32
}

impl<'a, P> FeatureArray<'a, P> {
    /// An empty array.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// An empty array with room for `header_capacity` features and
    /// `point_capacity` points in total.
    pub fn with_capacity(header_capacity: usize, point_capacity: usize) -> Self {
        Self {
            headers: CowBuffer::with_capacity(header_capacity),
            points: CowBuffer::with_capacity(point_capacity),
            aligned: true,
        }
    }

    /// An empty array sized by `config`.
    pub fn with_config(config: &FeatureArrayConfig) -> Self {
        Self::with_capacity(config.header_capacity, config.point_capacity)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the array holds no features.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Total number of points across all features.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Capacity of the header buffer.
    pub fn header_capacity(&self) -> usize {
        self.headers.capacity()
    }

    /// Capacity of the point buffer.
    pub fn point_capacity(&self) -> usize {
        self.points.capacity()
    }

    /// The raw header table.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// The raw point buffer.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Whether the header windows tile the point buffer in header order.
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// Whether both buffers are private to this instance.
    ///
    /// A wrapped, shared or freshly cloned array is not owned; it becomes
    /// owned, buffer by buffer, as it is written.
    pub fn is_owned(&self) -> bool {
        self.headers.is_owned() && self.points.is_owned()
    }

    /// Whether either buffer still reads from wrapped external memory.
    pub fn is_borrowed(&self) -> bool {
        self.headers.is_borrowed() || self.points.is_borrowed()
    }

    /// A read-only view of feature `index`, or `None` if out of range.
    pub fn feature(&self, index: usize) -> Option<Feature<'_, P>> {
        (index < self.len()).then(|| Feature::new(self, index))
    }

    /// An editable view of feature `index`, or `None` if out of range.
    pub fn feature_mut(&mut self, index: usize) -> Option<FeatureMut<'_, 'a, P>> {
        (index < self.len()).then(|| FeatureMut::new(self, index))
    }

    /// The first feature.
    pub fn first(&self) -> Option<Feature<'_, P>> {
        self.feature(0)
    }

    /// The last feature.
    pub fn last(&self) -> Option<Feature<'_, P>> {
        self.len().checked_sub(1).and_then(|i| self.feature(i))
    }

    /// Iterate over the features in header order.
    pub fn iter(&self) -> Features<'_, P> {
        Features::new(self)
    }

    /// Clear the aligned flag.
    ///
    /// Called whenever the offset chain may no longer match the point
    /// buffer. Clearing it more often than necessary only costs a
    /// realignment; leaving it set after such a change is a defect.
    pub(crate) fn on_data_changed(&mut self) {
        if self.aligned {
            trace!("feature array marked unaligned");
            self.aligned = false;
        }
    }

    /// Panic unless the array is aligned.
    pub(crate) fn assert_aligned(&self, operation: &str) {
        assert!(
            self.aligned,
            "{operation} requires an aligned feature array; call align_points_with_headers first"
        );
    }

    /// Identity of this instance, for same-array checks.
    pub(crate) fn identity(&self) -> *const () {
        (self as *const Self).cast()
    }

    /// Point position at which a feature inserted before `index` starts.
    fn window_start(&self, index: usize) -> usize {
        match self.headers.get(index) {
            Some(header) => header.offset as usize,
            None => self.points.len(),
        }
    }

    /// Debug-build check that an aligned array really is aligned.
    pub(crate) fn debug_check(&self) {
        debug_assert!(
            !self.aligned || self.check_alignment(),
            "aligned flag set on a broken offset chain"
        );
    }
}

impl<'a, P: Clone> FeatureArray<'a, P> {
    /// Reserve room for `header_capacity` features and `point_capacity`
    /// points in total.
    ///
    /// Contents and alignment are unchanged. Capacities already met are
    /// left alone, so reserving on a wrapped array does not copy it.
    pub fn reserve(&mut self, header_capacity: usize, point_capacity: usize) {
        self.headers
            .reserve(header_capacity.saturating_sub(self.headers.len()));
        self.points
            .reserve(point_capacity.saturating_sub(self.points.len()));
    }

    /// Mutable access to the whole point buffer.
    ///
    /// Point values may change freely; the number of points cannot, so
    /// alignment is unaffected.
    pub fn points_mut(&mut self) -> &mut [P] {
        self.points.as_mut_slice()
    }

    /// Append a copy of `feature` at the end and return its index.
    ///
    /// The new window starts at the current end of the point buffer, so
    /// this is valid whether or not the array is aligned and keeps
    /// whichever state it was in.
    pub fn append<S>(&mut self, feature: &S) -> usize
    where
        S: FeatureSource<P> + ?Sized,
    {
        let offset = self.points.len();
        let size = feature.len();
        offset_u32(offset + size);
        let index = self.headers.len();
        self.headers.push(Header::init(
            feature.feature_type(),
            offset as u32,
            size as u32,
            feature.group_id(),
        ));
        self.points.extend_from_slice(feature.points());
        self.debug_check();
        index
    }

    /// Append an empty feature and return an editor for it.
    pub fn append_empty(
        &mut self,
        feature_type: FeatureType,
        group_id: GroupId,
    ) -> FeatureMut<'_, 'a, P> {
        let offset = offset_u32(self.points.len());
        let index = self.headers.len();
        self.headers
            .push(Header::init(feature_type, offset, 0, group_id));
        FeatureMut::new(self, index)
    }

    /// Append a feature built from `points` and return its index.
    pub fn append_points<I>(&mut self, feature_type: FeatureType, group_id: GroupId, points: I) -> usize
    where
        I: IntoIterator<Item = P>,
    {
        let offset = offset_u32(self.points.len());
        let added = self.points.insert_from(self.points.len(), points);
        offset_u32(self.points.len());
        let index = self.headers.len();
        self.headers.push(Header::init(
            feature_type,
            offset,
            added as u32,
            group_id,
        ));
        self.debug_check();
        index
    }

    /// Append a copy of every feature in `features`, in order.
    pub fn extend_features<I>(&mut self, features: I)
    where
        I: IntoIterator,
        I::Item: FeatureSource<P>,
    {
        let features = features.into_iter();
        self.headers.reserve(features.size_hint().0);
        for feature in features {
            self.append(&feature);
        }
    }

    /// Insert a copy of `feature` before feature `index` and return an
    /// editor for it. `index == len()` appends.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned or `index > len()`.
    pub fn insert<S>(&mut self, index: usize, feature: &S) -> FeatureMut<'_, 'a, P>
    where
        S: FeatureSource<P> + ?Sized,
    {
        self.assert_aligned("insert");
        let len = self.len();
        assert!(index <= len, "insert index {index} out of bounds (len {len})");
        let size = feature.len();
        offset_u32(self.points.len() + size);
        let start = self.window_start(index);
        self.points
            .insert_from(start, feature.points().iter().cloned());
        self.headers.insert_from(
            index,
            [Header::init(
                feature.feature_type(),
                start as u32,
                size as u32,
                feature.group_id(),
            )],
        );
        self.increment_point_offsets(index + 1, size as u32);
        self.debug_check();
        FeatureMut::new(self, index)
    }

    /// Insert an empty feature before feature `index` and return an
    /// editor for it.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned or `index > len()`.
    pub fn insert_empty(
        &mut self,
        index: usize,
        feature_type: FeatureType,
        group_id: GroupId,
    ) -> FeatureMut<'_, 'a, P> {
        self.assert_aligned("insert_empty");
        let len = self.len();
        assert!(index <= len, "insert index {index} out of bounds (len {len})");
        let start = self.window_start(index) as u32;
        self.headers
            .insert_from(index, [Header::init(feature_type, start, 0, group_id)]);
        FeatureMut::new(self, index)
    }

    /// Insert copies of `features` before feature `index`, in order.
    ///
    /// All points are spliced into the point buffer in one operation and
    /// the headers behind the block are shifted once, so the cost does not
    /// grow with the square of the number of inserted features.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned or `index > len()`.
    pub fn insert_features<S>(&mut self, index: usize, features: &[S])
    where
        S: FeatureSource<P>,
    {
        self.assert_aligned("insert_features");
        let len = self.len();
        assert!(index <= len, "insert index {index} out of bounds (len {len})");
        if features.is_empty() {
            return;
        }
        let total: usize = features.iter().map(|f| f.len()).sum();
        offset_u32(self.points.len() + total);
        let start = self.window_start(index);

        self.points.reserve(total);
        self.points.insert_from(
            start,
            features.iter().flat_map(|f| f.points().iter().cloned()),
        );

        let slots = self.headers.insert_fill(
            index,
            features.len(),
            Header::empty(FeatureType::NONE, 0),
        );
        let mut offset = start as u32;
        for (slot, feature) in slots.iter_mut().zip(features) {
            let size = feature.len() as u32;
            *slot = Header::init(feature.feature_type(), offset, size, feature.group_id());
            offset += size;
        }

        self.increment_point_offsets(index + features.len(), total as u32);
        self.debug_check();
    }

    /// Remove feature `index` and its points.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned or `index >= len()`.
    pub fn erase(&mut self, index: usize) {
        self.assert_aligned("erase");
        let len = self.len();
        assert!(index < len, "erase index {index} out of bounds (len {len})");
        let header = self.headers[index];
        self.points.erase(header.range());
        self.decrement_point_offsets(index + 1, header.size);
        self.headers.remove(index);
        self.debug_check();
    }

    /// Remove the features in `range` and their points.
    ///
    /// The removed points form one contiguous span, erased in a single
    /// operation.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned, the range is inverted or it
    /// extends past `len()`.
    pub fn erase_range(&mut self, range: Range<usize>) {
        self.assert_aligned("erase_range");
        let len = self.len();
        assert!(
            range.start <= range.end,
            "inverted erase range {}..{}",
            range.start,
            range.end
        );
        assert!(
            range.end <= len,
            "erase range {}..{} out of bounds (len {len})",
            range.start,
            range.end
        );
        if range.is_empty() {
            return;
        }
        let span_start = self.headers[range.start].offset as usize;
        let span_end = self.headers[range.end - 1].end() as usize;
        let removed = span_end - span_start;
        self.decrement_point_offsets(range.end, removed as u32);
        self.points.erase(span_start..span_end);
        self.headers.erase(range);
        self.debug_check();
    }

    /// Remove every feature. The array is aligned afterwards.
    pub fn clear(&mut self) {
        self.headers.clear();
        self.points.clear();
        self.aligned = true;
    }

    /// Mutable access to the raw header table.
    ///
    /// This is the escape hatch for reordering features in bulk (sorting,
    /// reversing, partitioning the headers). It clears the aligned flag:
    /// call [`FeatureArray::align_points_with_headers`] once done, before
    /// any other edit. Each header's own window must stay inside the point
    /// buffer; windows may be reordered or duplicated freely.
    pub fn edit_headers(&mut self) -> &mut [Header] {
        self.on_data_changed();
        self.headers.as_mut_slice()
    }

    /// Reorder the features by a key of their headers, then realign.
    pub fn sort_features_by_key<K, F>(&mut self, key: F)
    where
        K: Ord,
        F: FnMut(&Header) -> K,
    {
        self.edit_headers().sort_by_key(key);
        self.align_points_with_headers();
    }
}

impl<P> Default for FeatureArray<'_, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f, P> IntoIterator for &'f FeatureArray<'_, P> {
    type Item = Feature<'f, P>;
    type IntoIter = Features<'f, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P: Clone, S: FeatureSource<P>> Extend<S> for FeatureArray<'_, P> {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.extend_features(iter);
    }
}

impl<P: Clone, S: FeatureSource<P>> FromIterator<S> for FeatureArray<'_, P> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend_features(iter);
        array
    }
}

/// Structural equality: same features, in order, with equal points.
///
/// Physical offsets are not compared, so an aligned array equals an
/// unaligned one holding the same features.
impl<P: PartialEq> PartialEq for FeatureArray<'_, P> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<P: fmt::Debug> fmt::Debug for FeatureArray<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureArray")
            .field("aligned", &self.aligned)
            .field("headers", &self.headers.as_slice())
            .field("points", &self.points.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::OwnedFeature;

    fn line(feature_type: FeatureType, points: &[i32]) -> OwnedFeature<i32> {
        OwnedFeature::from_points(feature_type, GroupId::NULL, points.iter().copied())
    }

    /// `[A(0,1), B(10,11,12), C()]`, aligned.
    fn abc() -> FeatureArray<'static, i32> {
        let mut array = FeatureArray::new();
        array.append(&line(FeatureType::BREAKLINE, &[0, 1]));
        array.append(&line(FeatureType::VOID, &[10, 11, 12]));
        array.append(&line(FeatureType::HULL, &[]));
        array
    }

    fn offsets(array: &FeatureArray<'_, i32>) -> Vec<(u32, u32)> {
        array.headers().iter().map(|h| (h.offset, h.size)).collect()
    }

    #[test]
    fn new_array_is_empty_and_aligned() {
        let array: FeatureArray<'_, i32> = FeatureArray::new();
        assert!(array.is_empty());
        assert!(array.is_aligned());
        assert!(array.check_alignment());
        assert!(array.first().is_none());
        assert!(array.last().is_none());
    }

    #[test]
    fn with_config_reserves_both_buffers() {
        let array: FeatureArray<'_, i32> =
            FeatureArray::with_config(&FeatureArrayConfig::for_features(10, 4));
        assert!(array.header_capacity() >= 10);
        assert!(array.point_capacity() >= 40);
    }

    #[test]
    fn reserve_keeps_contents() {
        let mut array = abc();
        array.reserve(100, 1000);
        assert!(array.header_capacity() >= 100);
        assert!(array.point_capacity() >= 1000);
        assert_eq!(array, abc());
        assert!(array.is_aligned());
    }

    #[test]
    fn append_assigns_contiguous_offsets() {
        let array = abc();
        assert_eq!(offsets(&array), vec![(0, 2), (2, 3), (5, 0)]);
        assert_eq!(array.point_count(), 5);
        assert!(array.check_alignment());
    }

    #[test]
    fn append_empty_then_fill() {
        let mut array = abc();
        {
            let mut f = array.append_empty(FeatureType::ISLAND, GroupId(2));
            f.append([7, 8]);
        }
        let last = array.last().unwrap();
        assert_eq!(last.feature_type(), FeatureType::ISLAND);
        assert_eq!(last.group_id(), GroupId(2));
        assert_eq!(last.points(), &[7, 8]);
        assert!(array.check_alignment());
    }

    #[test]
    fn append_points_counts_items() {
        let mut array: FeatureArray<'_, i32> = FeatureArray::new();
        let i = array.append_points(FeatureType::CONTOUR_LINE, GroupId(5), (0..10).filter(|v| v % 2 == 0));
        assert_eq!(i, 0);
        assert_eq!(array.headers()[0].size, 5);
        assert_eq!(array.feature(0).unwrap().points(), &[0, 2, 4, 6, 8]);
    }

    #[test]
    fn extend_and_collect() {
        let features = vec![line(FeatureType::VOID, &[1]), line(FeatureType::HOLE, &[2, 3])];
        let collected: FeatureArray<'_, i32> = features.iter().collect();
        let mut extended = FeatureArray::new();
        extended.extend(features.iter());
        assert_eq!(collected, extended);
        assert_eq!(offsets(&collected), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn insert_in_middle_shifts_later_offsets() {
        let mut array = abc();
        array.insert(1, &line(FeatureType::ISLAND, &[5, 6, 7, 8]));
        assert_eq!(offsets(&array), vec![(0, 2), (2, 4), (6, 3), (9, 0)]);
        assert_eq!(array.points(), &[0, 1, 5, 6, 7, 8, 10, 11, 12]);
        assert!(array.check_alignment());
    }

    #[test]
    fn insert_at_front_and_end() {
        let mut array = abc();
        array.insert(0, &line(FeatureType::NONE, &[-1]));
        let len = array.len();
        array.insert(len, &line(FeatureType::NONE, &[99]));
        assert_eq!(array.points(), &[-1, 0, 1, 10, 11, 12, 99]);
        assert!(array.check_alignment());
    }

    #[test]
    fn insert_before_empty_feature() {
        let mut array = abc();
        array.insert(2, &line(FeatureType::NONE, &[13]));
        assert_eq!(offsets(&array), vec![(0, 2), (2, 3), (5, 1), (6, 0)]);
        assert!(array.check_alignment());
    }

    #[test]
    fn insert_empty_keeps_points() {
        let mut array = abc();
        array.insert_empty(1, FeatureType::HOLE, GroupId::NULL);
        assert_eq!(offsets(&array), vec![(0, 2), (2, 0), (2, 3), (5, 0)]);
        assert_eq!(array.point_count(), 5);
        assert!(array.check_alignment());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn insert_past_end_panics() {
        let mut array = abc();
        array.insert(4, &line(FeatureType::NONE, &[1]));
    }

    #[test]
    fn insert_features_splices_block() {
        let mut array = abc();
        let block = [
            line(FeatureType::VOID, &[100, 101]),
            line(FeatureType::ISLAND, &[]),
            line(FeatureType::HOLE, &[102]),
        ];
        array.insert_features(1, &block);
        assert_eq!(array.len(), 6);
        assert_eq!(
            offsets(&array),
            vec![(0, 2), (2, 2), (4, 0), (4, 1), (5, 3), (8, 0)]
        );
        assert_eq!(array.points(), &[0, 1, 100, 101, 102, 10, 11, 12]);
        assert_eq!(array.feature(3).unwrap().feature_type(), FeatureType::HOLE);
        assert!(array.check_alignment());
    }

    #[test]
    fn insert_features_empty_block_is_noop() {
        let mut array = abc();
        let block: [OwnedFeature<i32>; 0] = [];
        array.insert_features(1, &block);
        assert_eq!(array, abc());
    }

    #[test]
    fn erase_single_feature() {
        let mut array = abc();
        array.erase(0);
        assert_eq!(offsets(&array), vec![(0, 3), (3, 0)]);
        assert_eq!(array.points(), &[10, 11, 12]);
        assert!(array.check_alignment());
    }

    #[test]
    fn erase_range_removes_contiguous_span() {
        let mut array = abc();
        array.append(&line(FeatureType::NONE, &[20, 21]));
        array.erase_range(1..3);
        assert_eq!(offsets(&array), vec![(0, 2), (2, 2)]);
        assert_eq!(array.points(), &[0, 1, 20, 21]);
        assert!(array.check_alignment());
    }

    #[test]
    fn erase_empty_range_is_noop() {
        let mut array = abc();
        array.erase_range(2..2);
        assert_eq!(array, abc());
    }

    #[test]
    #[should_panic(expected = "inverted erase range")]
    #[allow(clippy::reversed_empty_ranges)]
    fn erase_inverted_range_panics() {
        let mut array = abc();
        array.erase_range(2..1);
    }

    #[test]
    fn clear_resets_alignment() {
        let mut array = abc();
        array.edit_headers().reverse();
        assert!(!array.is_aligned());
        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.point_count(), 0);
        assert!(array.is_aligned());
    }

    #[test]
    #[should_panic(expected = "requires an aligned feature array")]
    fn erase_while_unaligned_panics() {
        let mut array = abc();
        array.edit_headers().swap(0, 1);
        array.erase(0);
    }

    #[test]
    fn append_while_unaligned_keeps_windows_valid() {
        let mut array = abc();
        array.edit_headers().swap(0, 1);
        array.append(&line(FeatureType::NONE, &[42]));
        assert!(!array.is_aligned());
        assert_eq!(array.last().unwrap().points(), &[42]);
        array.align_points_with_headers();
        assert_eq!(array.points(), &[10, 11, 12, 0, 1, 42]);
    }

    #[test]
    fn sort_features_by_key_realigns() {
        let mut array = abc();
        array.sort_features_by_key(|h| std::cmp::Reverse(h.size));
        assert!(array.is_aligned());
        let sizes: Vec<usize> = array.iter().map(|f| f.len()).collect();
        assert_eq!(sizes, vec![3, 2, 0]);
        assert_eq!(array.points(), &[10, 11, 12, 0, 1]);
    }

    #[test]
    fn points_mut_edits_values_only() {
        let mut array = abc();
        array.points_mut()[0] = -5;
        assert_eq!(array.feature(0).unwrap().points(), &[-5, 1]);
        assert!(array.is_aligned());
    }

    #[test]
    fn equality_ignores_physical_layout() {
        let mut a = abc();
        a.edit_headers();
        assert!(!a.is_aligned());
        assert_eq!(a, abc());
    }

    #[test]
    #[should_panic(expected = "u32 offset range")]
    fn offset_overflow_panics() {
        offset_u32(u32::MAX as usize + 1);
    }
}
