//! Building arrays from raw parts and wrapping external memory.

use bytemuck::Pod;
use log::debug;
use tessera_buffer::CowBuffer;
use tessera_core::{FeatureError, Header};

use crate::align::offsets_form_chain;
use crate::array::FeatureArray;

/// Check that every window fits and derive the aligned flag.
fn validate<P>(headers: &[Header], points: &[P]) -> Result<bool, FeatureError> {
    let point_count = points.len();
    if point_count > u32::MAX as usize {
        return Err(FeatureError::TooManyPoints { point_count });
    }
    if let Some((index, header)) = headers
        .iter()
        .enumerate()
        .find(|(_, h)| !h.fits(point_count))
    {
        return Err(FeatureError::WindowOutOfBounds {
            index,
            offset: header.offset,
            size: header.size,
            point_count,
        });
    }
    Ok(offsets_form_chain(headers, point_count))
}

impl<'a, P> FeatureArray<'a, P> {
    fn from_buffers(
        headers: CowBuffer<'a, Header>,
        points: CowBuffer<'a, P>,
    ) -> Result<Self, FeatureError> {
        let aligned = validate(&headers, &points)?;
        if !aligned {
            debug!(
                "built unaligned feature array over {} headers and {} points",
                headers.len(),
                points.len()
            );
        }
        Ok(Self {
            headers,
            points,
            aligned,
        })
    }

    /// Take ownership of a header table and a point buffer.
    ///
    /// The aligned flag is computed from the data; an array whose headers
    /// do not tile the points must be realigned before size-changing
    /// edits.
    ///
    /// # Errors
    ///
    /// [`FeatureError::WindowOutOfBounds`] if a header addresses points
    /// past the end of `points`, [`FeatureError::TooManyPoints`] if
    /// `points` exceeds the `u32` offset range.
    pub fn from_parts(headers: Vec<Header>, points: Vec<P>) -> Result<Self, FeatureError> {
        Self::from_buffers(CowBuffer::from_vec(headers), CowBuffer::from_vec(points))
    }

    /// View external header and point tables without copying them.
    ///
    /// The first mutation copies the affected table into private storage;
    /// the external memory is never written.
    ///
    /// # Errors
    ///
    /// As [`FeatureArray::from_parts`].
    pub fn wrap(headers: &'a [Header], points: &'a [P]) -> Result<Self, FeatureError> {
        Self::from_buffers(CowBuffer::wrap(headers), CowBuffer::wrap(points))
    }

    /// A read-only sibling over this array's current storage.
    ///
    /// No copy is made. The sibling borrows `self`; mutating it copies
    /// its buffers first, so `self` is never affected.
    pub fn share(&self) -> FeatureArray<'_, P> {
        FeatureArray {
            headers: CowBuffer::wrap(self.headers.as_slice()),
            points: CowBuffer::wrap(self.points.as_slice()),
            aligned: self.aligned,
        }
    }
}

impl<'a, P: Pod> FeatureArray<'a, P> {
    /// View tightly packed external byte buffers as a feature array.
    ///
    /// `header_bytes` holds 16-byte [`Header`] records and `point_bytes`
    /// holds `P` values, both in native byte order and suitably aligned.
    ///
    /// # Errors
    ///
    /// [`FeatureError::HeaderBuffer`] or [`FeatureError::PointBuffer`] if a
    /// byte buffer has the wrong length or alignment, otherwise as
    /// [`FeatureArray::from_parts`].
    pub fn wrap_bytes(header_bytes: &'a [u8], point_bytes: &'a [u8]) -> Result<Self, FeatureError> {
        let headers = CowBuffer::wrap_bytes(header_bytes).map_err(FeatureError::HeaderBuffer)?;
        let points = CowBuffer::wrap_bytes(point_bytes).map_err(FeatureError::PointBuffer)?;
        Self::from_buffers(headers, points)
    }

    /// The header table as bytes.
    pub fn header_bytes(&self) -> &[u8] {
        self.headers.as_bytes()
    }

    /// The point buffer as bytes.
    pub fn point_bytes(&self) -> &[u8] {
        self.points.as_bytes()
    }
}

impl<P: Clone> FeatureArray<'_, P> {
    /// Split the array into its header table and point buffer.
    ///
    /// Buffers still shared or borrowed are copied.
    pub fn into_parts(self) -> (Vec<Header>, Vec<P>) {
        (self.headers.into_vec(), self.points.into_vec())
    }
}

impl<P: Clone + 'static> FeatureArray<'_, P> {
    /// Detach the array from any borrowed memory.
    ///
    /// Shared storage stays shared; only borrowed tables are copied.
    pub fn into_owned(self) -> FeatureArray<'static, P> {
        FeatureArray {
            headers: self.headers.into_owned(),
            points: self.points.into_owned(),
            aligned: self.aligned,
        }
    }
}
