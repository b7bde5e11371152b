//! Core abstraction over "something that looks like a feature".

use crate::id::{FeatureType, GroupId};

/// Read access to one feature's metadata and points.
///
/// Feature-array mutators that copy whole features (`append`, `insert`,
/// `insert_features`) accept any `FeatureSource`, so borrowed views of
/// another array and detached [`OwnedFeature`](crate::OwnedFeature)s are
/// interchangeable.
pub trait FeatureSource<P> {
    /// Kind of the feature.
    fn feature_type(&self) -> FeatureType;

    /// Grouping key of the feature.
    fn group_id(&self) -> GroupId;

    /// The feature's points, in order.
    fn points(&self) -> &[P];

    /// Number of points.
    fn len(&self) -> usize {
        self.points().len()
    }

    /// Whether the feature has no points.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P, T: FeatureSource<P> + ?Sized> FeatureSource<P> for &T {
    fn feature_type(&self) -> FeatureType {
        (**self).feature_type()
    }

    fn group_id(&self) -> GroupId {
        (**self).group_id()
    }

    fn points(&self) -> &[P] {
        (**self).points()
    }
}
