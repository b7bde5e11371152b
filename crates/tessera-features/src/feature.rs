//! Feature views: `(array, index)` pairs resolved on every access.
//!
//! A [`Feature`] borrows its array immutably and is `Copy`; any number may
//! coexist. A [`FeatureMut`] borrows it exclusively and edits the owning
//! array in place, keeping the offsets of the features behind it in step.
//! Because the borrow checker ties a view to its array, a view can never
//! outlive the array or observe it mid-reallocation.

use std::fmt;
use std::ops::Range;

use tessera_core::{FeatureSource, FeatureType, GroupId, Header, OwnedFeature};

use crate::array::{offset_u32, FeatureArray};

/// Read-only view of one feature.
pub struct Feature<'f, P> {
    array: &'f FeatureArray<'f, P>,
    index: usize,
}

impl<P> Clone for Feature<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Feature<'_, P> {}

impl<'f, P> Feature<'f, P> {
    pub(crate) fn new(array: &'f FeatureArray<'f, P>, index: usize) -> Self {
        debug_assert!(index < array.len());
        Self { array, index }
    }

    /// Position of the feature in its array.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The array this view reads from.
    pub fn array(&self) -> &'f FeatureArray<'f, P> {
        self.array
    }

    /// The feature's header.
    pub fn header(&self) -> &'f Header {
        &self.array.headers[self.index]
    }

    /// Kind of the feature.
    pub fn feature_type(&self) -> FeatureType {
        self.header().feature_type
    }

    /// Group of the feature.
    pub fn group_id(&self) -> GroupId {
        self.header().group_id
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.header().size as usize
    }

    /// Whether the feature has no points.
    pub fn is_empty(&self) -> bool {
        self.header().is_empty()
    }

    /// The feature's points.
    ///
    /// On an unaligned array this is the window the header currently
    /// addresses.
    ///
    /// # Panics
    ///
    /// Panics if the header's window lies outside the point buffer, which
    /// can only happen after a bad [`FeatureArray::edit_headers`] edit.
    pub fn points(&self) -> &'f [P] {
        window(self.array, self.index)
    }

    /// Whether `other` views the same array instance.
    ///
    /// This is identity, not equality: two arrays with equal contents are
    /// still different lists.
    pub fn is_part_of_same_list(&self, other: &Feature<'_, P>) -> bool {
        std::ptr::eq(self.array.identity(), other.array.identity())
    }
}

impl<P: Clone> Feature<'_, P> {
    /// Copy the feature out of the array.
    pub fn detach(&self) -> OwnedFeature<P> {
        OwnedFeature::copy_from(self)
    }
}

/// Resolve the point window of header `index`, checking its bounds.
fn window<'p, P>(array: &'p FeatureArray<'_, P>, index: usize) -> &'p [P] {
    let header = &array.headers[index];
    let point_count = array.points.len();
    assert!(
        header.fits(point_count),
        "feature {index} window [{}, +{}) exceeds {point_count} points",
        header.offset,
        header.size
    );
    &array.points[header.range()]
}

impl<P> FeatureSource<P> for Feature<'_, P> {
    fn feature_type(&self) -> FeatureType {
        Feature::feature_type(self)
    }

    fn group_id(&self) -> GroupId {
        Feature::group_id(self)
    }

    fn points(&self) -> &[P] {
        Feature::points(self)
    }
}

/// Structural equality: same type, group and points.
impl<P: PartialEq> PartialEq for Feature<'_, P> {
    fn eq(&self, other: &Self) -> bool {
        self.feature_type() == other.feature_type()
            && self.group_id() == other.group_id()
            && self.points() == other.points()
    }
}

impl<P: fmt::Debug> fmt::Debug for Feature<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("index", &self.index)
            .field("feature_type", &self.feature_type())
            .field("group_id", &self.group_id())
            .field("points", &self.points())
            .finish()
    }
}

/// Editable view of one feature.
///
/// Size-changing edits shift the offsets of every later feature, so they
/// keep an aligned array aligned. They require the array to be aligned.
pub struct FeatureMut<'f, 'a, P> {
    array: &'f mut FeatureArray<'a, P>,
    index: usize,
}

impl<'f, 'a, P> FeatureMut<'f, 'a, P> {
    pub(crate) fn new(array: &'f mut FeatureArray<'a, P>, index: usize) -> Self {
        debug_assert!(index < array.len());
        Self { array, index }
    }

    /// A read-only view of the same feature.
    pub fn as_feature(&self) -> Feature<'_, P> {
        Feature::new(self.array, self.index)
    }

    /// Turn the editor into a read-only view for the rest of the borrow.
    pub fn into_feature(self) -> Feature<'f, P> {
        let array: &'f FeatureArray<'a, P> = self.array;
        Feature::new(array, self.index)
    }

    /// Position of the feature in its array.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The feature's header.
    pub fn header(&self) -> &Header {
        &self.array.headers[self.index]
    }

    /// Kind of the feature.
    pub fn feature_type(&self) -> FeatureType {
        self.header().feature_type
    }

    /// Group of the feature.
    pub fn group_id(&self) -> GroupId {
        self.header().group_id
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.header().size as usize
    }

    /// Whether the feature has no points.
    pub fn is_empty(&self) -> bool {
        self.header().is_empty()
    }

    /// The feature's points.
    pub fn points(&self) -> &[P] {
        window(self.array, self.index)
    }

    /// Clear the owning array's aligned flag.
    ///
    /// For callers that have changed the point buffer's layout behind the
    /// array's back. The editing methods on this type do not need it.
    pub fn on_array_data_changed(&mut self) {
        self.array.on_data_changed();
    }
}

impl<P: Clone> FeatureMut<'_, '_, P> {
    /// Mutable access to the feature's points.
    ///
    /// Values may change; the count cannot. The point buffer is made
    /// private first if it is shared or borrowed.
    pub fn points_mut(&mut self) -> &mut [P] {
        let header = self.array.headers[self.index];
        let point_count = self.array.points.len();
        assert!(
            header.fits(point_count),
            "feature {} window [{}, +{}) exceeds {point_count} points",
            self.index,
            header.offset,
            header.size
        );
        &mut self.array.points.as_mut_slice()[header.range()]
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.array.headers.as_mut_slice()[self.index]
    }

    /// Change the kind of the feature.
    pub fn set_feature_type(&mut self, feature_type: FeatureType) {
        self.header_mut().feature_type = feature_type;
    }

    /// Change the group of the feature.
    pub fn set_group_id(&mut self, group_id: GroupId) {
        self.header_mut().group_id = group_id;
    }

    /// Insert the items of `points` before position `pos` of this feature
    /// and return how many were inserted.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned or `pos > len()`.
    pub fn insert<I>(&mut self, pos: usize, points: I) -> usize
    where
        I: IntoIterator<Item = P>,
    {
        self.array.assert_aligned("FeatureMut::insert");
        let header = self.array.headers[self.index];
        let len = header.size as usize;
        assert!(pos <= len, "insert position {pos} out of bounds (len {len})");
        let inserted = self
            .array
            .points
            .insert_from(header.offset as usize + pos, points);
        if inserted == 0 {
            return 0;
        }
        offset_u32(self.array.points.len());
        self.header_mut().size += inserted as u32;
        self.array
            .increment_point_offsets(self.index + 1, inserted as u32);
        self.array.debug_check();
        inserted
    }

    /// Append the items of `points` and return how many were appended.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned.
    pub fn append<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = P>,
    {
        let len = self.len();
        self.insert(len, points)
    }

    /// Remove the points in `range`, relative to this feature, and return
    /// how many were removed.
    ///
    /// # Panics
    ///
    /// Panics if the array is unaligned, the range is inverted or it
    /// extends past `len()`.
    pub fn erase(&mut self, range: Range<usize>) -> usize {
        self.array.assert_aligned("FeatureMut::erase");
        let header = self.array.headers[self.index];
        let len = header.size as usize;
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
        let removed = range.len();
        if removed == 0 {
            return 0;
        }
        let base = header.offset as usize;
        self.array
            .points
            .erase(base + range.start..base + range.end);
        self.header_mut().size -= removed as u32;
        self.array
            .decrement_point_offsets(self.index + 1, removed as u32);
        self.array.debug_check();
        removed
    }

    /// Remove every point of this feature.
    pub fn clear(&mut self) -> usize {
        let len = self.len();
        self.erase(0..len)
    }

    /// Copy the feature out of the array.
    pub fn detach(&self) -> OwnedFeature<P> {
        OwnedFeature::copy_from(self)
    }
}

impl<P> FeatureSource<P> for FeatureMut<'_, '_, P> {
    fn feature_type(&self) -> FeatureType {
        FeatureMut::feature_type(self)
    }

    fn group_id(&self) -> GroupId {
        FeatureMut::group_id(self)
    }

    fn points(&self) -> &[P] {
        FeatureMut::points(self)
    }
}

impl<P: fmt::Debug> fmt::Debug for FeatureMut<'_, '_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureMut")
            .field("index", &self.index)
            .field("feature_type", &self.feature_type())
            .field("group_id", &self.group_id())
            .field("points", &self.points())
            .finish()
    }
}
