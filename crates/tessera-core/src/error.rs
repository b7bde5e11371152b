//! Error types for buffer wrapping and feature-array construction.
//!
//! Only construction from untrusted input is fallible. Misuse of a live
//! array (bad index, inverted range, mutating while unaligned) is a
//! programming error and panics instead.

use std::error::Error;
use std::fmt;

/// Errors from viewing an external byte buffer as typed elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The byte length is not a multiple of the element size.
    LengthMismatch {
        /// Length of the byte buffer.
        byte_len: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// The byte buffer does not start on the element's alignment.
    Misaligned {
        /// Alignment required by the element type.
        required_align: usize,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                byte_len,
                element_size,
            } => {
                write!(
                    f,
                    "byte length {byte_len} is not a multiple of element size {element_size}"
                )
            }
            Self::Misaligned { required_align } => {
                write!(f, "byte buffer is not aligned to {required_align} bytes")
            }
        }
    }
}

impl Error for BufferError {}

/// Errors from building a feature array out of raw parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeatureError {
    /// The header byte buffer could not be viewed as headers.
    HeaderBuffer(BufferError),
    /// The point byte buffer could not be viewed as points.
    PointBuffer(BufferError),
    /// A header addresses points past the end of the point buffer.
    WindowOutOfBounds {
        /// Index of the offending header.
        index: usize,
        /// The header's offset.
        offset: u32,
        /// The header's size.
        size: u32,
        /// Length of the point buffer.
        point_count: usize,
    },
    /// The point buffer is longer than a `u32` offset can address.
    TooManyPoints {
        /// Length of the point buffer.
        point_count: usize,
    },
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderBuffer(e) => write!(f, "invalid header buffer: {e}"),
            Self::PointBuffer(e) => write!(f, "invalid point buffer: {e}"),
            Self::WindowOutOfBounds {
                index,
                offset,
                size,
                point_count,
            } => {
                write!(
                    f,
                    "feature {index} window [{offset}, +{size}) exceeds {point_count} points"
                )
            }
            Self::TooManyPoints { point_count } => {
                write!(f, "{point_count} points exceed the u32 offset range")
            }
        }
    }
}

impl Error for FeatureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::HeaderBuffer(e) | Self::PointBuffer(e) => Some(e),
            _ => None,
        }
    }
}
