//! Benchmark profiles for Tessera feature arrays.
//!
//! Provides pre-built arrays for benchmarking:
//!
//! - [`reference_profile`]: 1K breaklines of 32 points (32K points)
//! - [`stress_profile`]: 100K short features (~1M points)
//! - [`terrain_points`]: deterministic point generation

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tessera_core::{FeatureType, GroupId, Point3d};
use tessera_features::{FeatureArray, FeatureArrayConfig};

/// Build a reference profile: 1000 breaklines of 32 points each.
pub fn reference_profile() -> FeatureArray<'static, Point3d> {
    build(1000, |_| 32)
}

/// Build a stress profile: 100K features of 1 to 19 points.
///
/// Sizes cycle so that windows are uneven and small, which is where
/// per-feature bookkeeping dominates.
pub fn stress_profile() -> FeatureArray<'static, Point3d> {
    build(100_000, |i| 1 + (i * 7) % 19)
}

fn build(features: usize, size_of: impl Fn(usize) -> usize) -> FeatureArray<'static, Point3d> {
    let total: usize = (0..features).map(&size_of).sum();
    let config = FeatureArrayConfig::new(features, total);
    let mut array = FeatureArray::with_config(&config);
    let mut seed = 0u64;
    for i in 0..features {
        let size = size_of(i);
        let feature_type = if i % 10 == 0 {
            FeatureType::VOID
        } else {
            FeatureType::BREAKLINE
        };
        array.append_points(
            feature_type,
            GroupId::NULL,
            terrain_points(size, seed),
        );
        seed += size as u64;
    }
    array
}

/// `count` points on a gently varying surface, deterministic in `seed`.
pub fn terrain_points(count: usize, seed: u64) -> impl Iterator<Item = Point3d> {
    (0..count).map(move |i| {
        let t = (seed + i as u64) as f64;
        Point3d::new(t, (t * 0.37).sin() * 100.0, (t * 0.11).cos() * 10.0)
    })
}
