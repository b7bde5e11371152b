//! Strongly-typed identifiers stored in feature headers.
//!
//! Both identifiers are `#[repr(transparent)]` over `u32` so that a
//! [`Header`](crate::Header) stays a plain 16-byte record that can be cast
//! from external byte buffers.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// The kind of a feature (breakline, void, hull, ...).
///
/// The array treats the value as opaque. The associated constants cover
/// the kinds produced by the terrain import pipeline; callers are free to
/// use other values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct FeatureType(pub u32);

impl FeatureType {
    /// No particular kind.
    pub const NONE: Self = Self(0);
    /// Unconnected spot elevations.
    pub const RANDOM_SPOTS: Self = Self(1);
    /// Spot elevations belonging to one group.
    pub const GROUP_SPOTS: Self = Self(2);
    /// A hard breakline.
    pub const BREAKLINE: Self = Self(3);
    /// A soft breakline.
    pub const SOFT_BREAKLINE: Self = Self(4);
    /// A closed contour.
    pub const CONTOUR_LINE: Self = Self(5);
    /// A void polygon.
    pub const VOID: Self = Self(6);
    /// A break void polygon.
    pub const BREAK_VOID: Self = Self(7);
    /// A drape void polygon.
    pub const DRAPE_VOID: Self = Self(8);
    /// An island inside a void.
    pub const ISLAND: Self = Self(9);
    /// A hole inside an island.
    pub const HOLE: Self = Self(10);
    /// The outer boundary.
    pub const HULL: Self = Self(11);
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FeatureType {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Optional grouping key of a feature.
///
/// [`GroupId::NULL`] (`u32::MAX`) is the reserved "no group" sentinel and
/// is what every constructor uses when no group is given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct GroupId(pub u32);

impl GroupId {
    /// The "no group" sentinel.
    pub const NULL: Self = Self(u32::MAX);

    /// Whether this is the [`GroupId::NULL`] sentinel.
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<u32> for GroupId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_group_is_null() {
        assert!(GroupId::default().is_null());
        assert!(!GroupId(0).is_null());
    }

    #[test]
    fn display_formats() {
        assert_eq!(FeatureType::BREAKLINE.to_string(), "3");
        assert_eq!(GroupId(7).to_string(), "7");
        assert_eq!(GroupId::NULL.to_string(), "null");
    }

    #[test]
    fn ids_are_four_bytes() {
        assert_eq!(std::mem::size_of::<FeatureType>(), 4);
        assert_eq!(std::mem::size_of::<GroupId>(), 4);
    }
}
