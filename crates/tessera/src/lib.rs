//! Tessera: copy-on-write composite feature arrays.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Tessera sub-crates. For most users, adding `tessera` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tessera::prelude::*;
//!
//! let mut array = FeatureArray::new();
//! array.append_points(
//!     FeatureType::BREAKLINE,
//!     GroupId::NULL,
//!     [Point3d::new(0.0, 0.0, 1.0), Point3d::new(5.0, 0.0, 1.5)],
//! );
//! array.append_points(FeatureType::HULL, GroupId::NULL, []);
//!
//! // Grow the breakline in place; the hull's window moves up behind it.
//! array
//!     .feature_mut(0)
//!     .unwrap()
//!     .append([Point3d::new(9.0, 2.0, 1.2)]);
//! assert_eq!(array.feature(0).unwrap().len(), 3);
//! assert_eq!(array.feature(1).unwrap().header().offset, 3);
//!
//! // Clones share storage until one of them is written.
//! let snapshot = array.clone();
//! array.erase(0);
//! assert_eq!(snapshot.len(), 2);
//! assert_eq!(array.len(), 1);
//!
//! // Reorder through the header escape hatch, then realign.
//! let mut reordered = snapshot.clone();
//! reordered.edit_headers().reverse();
//! reordered.align_points_with_headers();
//! assert!(reordered.is_aligned());
//! assert_eq!(reordered.feature(0).unwrap().feature_type(), FeatureType::HULL);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tessera-core` | Headers, IDs, points, owned features, errors |
//! | [`buffer`] | `tessera-buffer` | The copy-on-write buffer under both tables |
//! | [`features`] | `tessera-features` | `FeatureArray`, feature views, realignment |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`tessera-core`).
///
/// Contains [`types::Header`], the [`types::FeatureType`] and
/// [`types::GroupId`] IDs, the default [`types::Point3d`], detached
/// [`types::OwnedFeature`]s and the error types.
pub use tessera_core as types;

/// Copy-on-write storage (`tessera-buffer`).
///
/// [`buffer::CowBuffer`] reads borrowed or shared memory in place and
/// copies it on the first write.
pub use tessera_buffer as buffer;

/// Feature arrays (`tessera-features`).
///
/// [`features::FeatureArray`] with its [`features::Feature`] and
/// [`features::FeatureMut`] views.
pub use tessera_features as features;

/// Common imports for typical Tessera usage.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tessera_core::{FeatureSource, FeatureType, GroupId, Header, OwnedFeature, Point3d};

    // Errors
    pub use tessera_core::{BufferError, FeatureError};

    // Arrays
    pub use tessera_features::{Feature, FeatureArray, FeatureArrayConfig, FeatureMut};
}
