//! Offset-chain maintenance and realignment.

use log::{debug, trace};
use tessera_buffer::CowBuffer;
use tessera_core::Header;

use crate::array::{offset_u32, FeatureArray};

/// Whether `headers` tile `point_count` points exactly, in order.
///
/// The first window starts at zero, every window starts where the previous
/// one ended, and the last one ends at `point_count`. An empty header
/// table tiles only an empty point buffer.
pub fn offsets_form_chain(headers: &[Header], point_count: usize) -> bool {
    let mut next: u64 = 0;
    for header in headers {
        if u64::from(header.offset) != next {
            return false;
        }
        next = header.end();
    }
    next == point_count as u64
}

impl<P> FeatureArray<'_, P> {
    /// Recompute the alignment invariant from the data.
    ///
    /// Independent of the aligned flag; used by tests and debug assertions.
    pub fn check_alignment(&self) -> bool {
        offsets_form_chain(&self.headers, self.points.len())
    }

    /// Panic unless every header's window lies inside the point buffer.
    pub(crate) fn assert_windows_in_bounds(&self) {
        let point_count = self.points.len();
        for (index, header) in self.headers.iter().enumerate() {
            assert!(
                header.fits(point_count),
                "feature {index} window [{}, +{}) exceeds {point_count} points",
                header.offset,
                header.size
            );
        }
    }
}

impl<P: Clone> FeatureArray<'_, P> {
    /// Rebuild the point buffer so that it follows header order.
    ///
    /// Each feature's current window is copied, in header order, into a
    /// fresh buffer of the same capacity; the offsets are then rewritten as
    /// a running sum of sizes. Points no header addresses are dropped and
    /// windows addressed by several headers are copied once per header.
    ///
    /// Does nothing to the buffers when the array is already aligned.
    ///
    /// # Panics
    ///
    /// Panics if a header's window lies outside the point buffer or the
    /// realigned buffer would exceed the `u32` offset range.
    pub fn align_points_with_headers(&mut self) {
        if self.aligned {
            return;
        }
        if self.check_alignment() {
            trace!("headers already tile the point buffer, no copy needed");
            self.aligned = true;
            return;
        }
        self.assert_windows_in_bounds();

        let total: usize = self.headers.iter().map(|h| h.size as usize).sum();
        offset_u32(total);
        let capacity = self.points.capacity().max(total);
        let mut fresh = Vec::with_capacity(capacity);
        for header in self.headers.iter() {
            fresh.extend_from_slice(&self.points[header.range()]);
        }
        debug!(
            "realigned {} features: {} points copied, {} dropped",
            self.headers.len(),
            fresh.len(),
            self.points.len().saturating_sub(fresh.len())
        );

        self.points = CowBuffer::from_vec(fresh);
        self.recompute_point_offsets();
        self.aligned = true;
        self.debug_check();
    }

    /// Overwrite every offset with the running sum of the preceding sizes.
    pub(crate) fn recompute_point_offsets(&mut self) {
        let mut offset: u32 = 0;
        for header in self.headers.as_mut_slice() {
            header.offset = offset;
            offset = offset
                .checked_add(header.size)
                .unwrap_or_else(|| panic!("point offsets exceed the u32 range"));
        }
    }

    /// Shift the offsets of headers `from..` up by `amount`.
    pub(crate) fn increment_point_offsets(&mut self, from: usize, amount: u32) {
        self.assert_aligned("increment_point_offsets");
        if amount == 0 || from >= self.headers.len() {
            return;
        }
        trace!("shifting {} offsets up by {amount}", self.headers.len() - from);
        for header in &mut self.headers.as_mut_slice()[from..] {
            header.offset += amount;
        }
    }

    /// Shift the offsets of headers `from..` down by `amount`.
    pub(crate) fn decrement_point_offsets(&mut self, from: usize, amount: u32) {
        self.assert_aligned("decrement_point_offsets");
        if amount == 0 || from >= self.headers.len() {
            return;
        }
        trace!(
            "shifting {} offsets down by {amount}",
            self.headers.len() - from
        );
        for header in &mut self.headers.as_mut_slice()[from..] {
            header.offset -= amount;
        }
    }
}
