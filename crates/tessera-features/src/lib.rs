//! Copy-on-write composite feature arrays.
//!
//! A [`FeatureArray`] presents a sequence of variable-length features
//! (polylines, polygons, spot groups) as individually addressable elements
//! while storing all of their points in one contiguous buffer and all of
//! their metadata in a second one.
//!
//! # Architecture
//!
//! ```text
//! FeatureArray<'a, P>
//! ├── headers: CowBuffer<'a, Header>   one 16-byte record per feature
//! ├── points:  CowBuffer<'a, P>        every feature's points, back to back
//! └── aligned: bool                    offset chain witness
//!
//! Feature<'f, P> / FeatureMut<'f, 'a, P>
//! └── (array borrow, header index)     resolved on every access
//! ```
//!
//! # Alignment
//!
//! The array is *aligned* when the header windows `[offset, offset+size)`
//! tile the point buffer in header order with no gaps. Every mutator on
//! [`FeatureArray`], [`FeatureMut`] preserves alignment by shifting the
//! offsets of the headers behind the edit. [`FeatureArray::edit_headers`]
//! is the escape hatch for reordering headers directly; it clears the
//! aligned flag and [`FeatureArray::align_points_with_headers`] must be
//! called before the next size-changing edit.
//!
//! # Copy-on-write
//!
//! Cloning, [`FeatureArray::share`], [`FeatureArray::wrap`] and
//! [`FeatureArray::wrap_bytes`] never copy. The first mutation through an
//! instance privatizes that instance's buffers; siblings are unaffected.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod align;
pub mod array;
pub mod config;
pub mod feature;
pub mod iter;
mod wrap;

// Public re-exports for the primary API surface.
pub use align::offsets_form_chain;
pub use array::FeatureArray;
pub use config::FeatureArrayConfig;
pub use feature::{Feature, FeatureMut};
pub use iter::Features;
pub use tessera_core::{
    FeatureError, FeatureSource, FeatureType, GroupId, Header, OwnedFeature, Point3d,
};
