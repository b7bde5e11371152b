//! Core types for Tessera feature arrays.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! fixed-layout records shared by the buffer and feature-array crates:
//! feature and group identifiers, the per-feature [`Header`], the default
//! [`Point3d`] point type, the error types and the [`FeatureSource`] trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod feature;
pub mod header;
pub mod id;
pub mod point;
pub mod traits;

pub use error::{BufferError, FeatureError};
pub use feature::OwnedFeature;
pub use header::Header;
pub use id::{FeatureType, GroupId};
pub use point::Point3d;
pub use traits::FeatureSource;
