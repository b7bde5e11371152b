//! Test fixtures and invariant checks for Tessera development.
//!
//! Provides small feature builders, a reference array of [`Point3d`]
//! features, a structural snapshot for comparing arrays against a
//! `Vec<OwnedFeature>` model, and proptest strategies in [`strategies`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod strategies;

use tessera_core::{FeatureType, GroupId, Header, OwnedFeature, Point3d};
use tessera_features::{offsets_form_chain, FeatureArray};

/// An ungrouped feature over integer points.
pub fn line(feature_type: FeatureType, points: &[i32]) -> OwnedFeature<i32> {
    OwnedFeature::from_points(feature_type, GroupId::NULL, points.iter().copied())
}

/// `count` points along the x axis starting at `x0`, with `z = x`.
pub fn ramp(x0: f64, count: usize) -> Vec<Point3d> {
    (0..count)
        .map(|i| {
            let x = x0 + i as f64;
            Point3d::new(x, 0.0, x)
        })
        .collect()
}

/// A small terrain-like array: a breakline, a grouped void with its
/// island, an empty hull and a spot group.
pub fn sample_array() -> FeatureArray<'static, Point3d> {
    let mut array = FeatureArray::new();
    array.append_points(FeatureType::BREAKLINE, GroupId::NULL, ramp(0.0, 4));
    array.append_points(FeatureType::VOID, GroupId(1), ramp(10.0, 5));
    array.append_points(FeatureType::ISLAND, GroupId(1), ramp(20.0, 3));
    array.append_points(FeatureType::HULL, GroupId::NULL, []);
    array.append_points(FeatureType::RANDOM_SPOTS, GroupId::NULL, ramp(30.0, 2));
    array
}

/// The array's features, detached, in order.
pub fn snapshot<P: Clone>(array: &FeatureArray<'_, P>) -> Vec<OwnedFeature<P>> {
    array.iter().map(|f| f.detach()).collect()
}

/// Panic unless the aligned flag and the data agree and every window
/// fits the point buffer.
pub fn assert_invariants<P>(array: &FeatureArray<'_, P>) {
    let point_count = array.point_count();
    for (index, header) in array.headers().iter().enumerate() {
        assert!(
            header.fits(point_count),
            "header {index} ({header}) exceeds {point_count} points"
        );
    }
    if array.is_aligned() {
        assert!(
            offsets_form_chain(array.headers(), point_count),
            "aligned flag set but offsets do not tile the points: {:?}",
            windows(array.headers())
        );
    }
}

/// `(offset, size)` of every header.
pub fn windows(headers: &[Header]) -> Vec<(u32, u32)> {
    headers.iter().map(|h| (h.offset, h.size)).collect()
}
