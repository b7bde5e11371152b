//! Copy-on-write growable contiguous buffers.
//!
//! [`CowBuffer`] is the storage primitive underneath every feature array:
//! one instance holds the headers, another holds the points. A buffer is
//! either a borrowed wrap over external memory or an `Arc`-shared owned
//! vector, and it privatizes its storage on the first write.
//!
//! ```text
//! CowBuffer<'a, T>
//! ├── Borrowed(&'a [T])     wrap over external memory, never written
//! └── Shared(Arc<Vec<T>>)   owned; clones share until one of them writes
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cow;

pub use cow::CowBuffer;
