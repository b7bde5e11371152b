//! Detached, owned features.
//!
//! An [`OwnedFeature`] carries the same data as a feature stored in an
//! array, without borrowing the array. It is the way to move a feature
//! from one position of an array to another: copy it out with
//! `Feature::detach`, then insert the copy.

use smallvec::SmallVec;

use crate::id::{FeatureType, GroupId};
use crate::traits::FeatureSource;

/// Inline point capacity. Most imported features are short polylines.
const INLINE_POINTS: usize = 4;

/// A feature that owns its points.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedFeature<P> {
    /// Kind of the feature.
    pub feature_type: FeatureType,
    /// Grouping key, [`GroupId::NULL`] when ungrouped.
    pub group_id: GroupId,
    /// The points, in order.
    pub points: SmallVec<[P; INLINE_POINTS]>,
}

impl<P> OwnedFeature<P> {
    /// An ungrouped feature with no points.
    pub fn new(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            group_id: GroupId::NULL,
            points: SmallVec::new(),
        }
    }

    /// Build a feature from its parts.
    pub fn from_points(
        feature_type: FeatureType,
        group_id: GroupId,
        points: impl IntoIterator<Item = P>,
    ) -> Self {
        Self {
            feature_type,
            group_id,
            points: points.into_iter().collect(),
        }
    }

    /// Set the group, builder style.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = group_id;
        self
    }
}

impl<P: Clone> OwnedFeature<P> {
    /// Copy any feature source into an owned feature.
    pub fn copy_from<S: FeatureSource<P> + ?Sized>(source: &S) -> Self {
        Self {
            feature_type: source.feature_type(),
            group_id: source.group_id(),
            points: SmallVec::from(source.points()),
        }
    }
}

impl<P> FeatureSource<P> for OwnedFeature<P> {
    fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    fn group_id(&self) -> GroupId {
        self.group_id
    }

    fn points(&self) -> &[P] {
        &self.points
    }
}
