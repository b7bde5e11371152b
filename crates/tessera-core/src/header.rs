//! The per-feature header record.
//!
//! A [`Header`] describes one feature's slice of the shared point buffer.
//! It is a `#[repr(C)]` record of four `u32` words with no padding, so
//! tightly packed header tables can be cast from external byte buffers
//! without transformation.

use std::fmt;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::id::{FeatureType, GroupId};

/// Metadata for one feature: kind, group, and its point window.
///
/// The window is `[offset, offset + size)` in the owning array's point
/// buffer. Fields are public; the array-level alignment invariant is the
/// only constraint on their values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Header {
    /// Kind of the feature.
    pub feature_type: FeatureType,
    /// Grouping key, [`GroupId::NULL`] when ungrouped.
    pub group_id: GroupId,
    /// Index of the feature's first point in the point buffer.
    pub offset: u32,
    /// Number of points in the feature.
    pub size: u32,
}

impl Header {
    /// Size of one header record in bytes.
    pub const BYTES: usize = std::mem::size_of::<Self>();

    /// Build a header with all four fields set.
    pub fn init(feature_type: FeatureType, offset: u32, size: u32, group_id: GroupId) -> Self {
        Self {
            feature_type,
            group_id,
            offset,
            size,
        }
    }

    /// Build an ungrouped header of size zero at `offset`.
    pub fn empty(feature_type: FeatureType, offset: u32) -> Self {
        Self::init(feature_type, offset, 0, GroupId::NULL)
    }

    /// One past the last point of the window.
    ///
    /// Computed in `u64` so a corrupt header cannot overflow.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }

    /// The window as a `usize` range into the point buffer.
    pub fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.size as usize
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Whether the header carries a group.
    pub fn has_group(&self) -> bool {
        !self.group_id.is_null()
    }

    /// Whether the window fits inside a point buffer of `point_count` points.
    pub fn fits(&self, point_count: usize) -> bool {
        self.end() <= point_count as u64
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Header(type={}, group={}, off={}, size={})",
            self.feature_type, self.group_id, self.offset, self.size
        )
    }
}
