//! Feature-array construction parameters.

/// Capacity hints for a new [`FeatureArray`](crate::FeatureArray).
///
/// Both values are hints: the buffers grow past them on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureArrayConfig {
    /// Number of features to reserve room for.
    pub header_capacity: usize,
    /// Total number of points, across all features, to reserve room for.
    pub point_capacity: usize,
}

impl FeatureArrayConfig {
    /// Default header capacity: allocate lazily.
    pub const DEFAULT_HEADER_CAPACITY: usize = 0;

    /// Default point capacity: allocate lazily.
    pub const DEFAULT_POINT_CAPACITY: usize = 0;

    /// Create a config with explicit capacities.
    pub fn new(header_capacity: usize, point_capacity: usize) -> Self {
        Self {
            header_capacity,
            point_capacity,
        }
    }

    /// Size both buffers for `features` features of about
    /// `points_per_feature` points each.
    pub fn for_features(features: usize, points_per_feature: usize) -> Self {
        Self::new(features, features.saturating_mul(points_per_feature))
    }

    /// Replace the header capacity.
    pub fn with_header_capacity(mut self, header_capacity: usize) -> Self {
        self.header_capacity = header_capacity;
        self
    }

    /// Replace the point capacity.
    pub fn with_point_capacity(mut self, point_capacity: usize) -> Self {
        self.point_capacity = point_capacity;
        self
    }
}

impl Default for FeatureArrayConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HEADER_CAPACITY, Self::DEFAULT_POINT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lazy() {
        let config = FeatureArrayConfig::default();
        assert_eq!(config.header_capacity, 0);
        assert_eq!(config.point_capacity, 0);
    }

    #[test]
    fn for_features_multiplies() {
        let config = FeatureArrayConfig::for_features(100, 8);
        assert_eq!(config, FeatureArrayConfig::new(100, 800));
    }

    #[test]
    fn for_features_saturates() {
        let config = FeatureArrayConfig::for_features(usize::MAX, 2);
        assert_eq!(config.point_capacity, usize::MAX);
    }

    #[test]
    fn builders_replace_fields() {
        let config = FeatureArrayConfig::default()
            .with_header_capacity(3)
            .with_point_capacity(9);
        assert_eq!(config, FeatureArrayConfig::new(3, 9));
    }
}
