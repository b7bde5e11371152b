//! The copy-on-write buffer.
//!
//! Reads go straight to the current storage. Every mutator funnels through
//! a single promotion point ([`CowBuffer::make_mut`]) which copies borrowed
//! or shared storage into a private `Vec` before the write happens, so
//! sibling buffers never observe each other's mutations.

use std::fmt;
use std::ops::{Deref, Range};
use std::sync::Arc;

use bytemuck::{Pod, PodCastError};
use log::debug;
use tessera_core::BufferError;

enum Storage<'a, T> {
    Borrowed(&'a [T]),
    Shared(Arc<Vec<T>>),
}

impl<T> Clone for Storage<'_, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Borrowed(slice) => Self::Borrowed(*slice),
            Self::Shared(vec) => Self::Shared(Arc::clone(vec)),
        }
    }
}

/// A growable contiguous buffer with copy-on-write storage.
///
/// Cloning is O(1): clones share the same storage until one of them is
/// mutated. Wrapping external memory with [`CowBuffer::wrap`] is also
/// O(1); the first mutation copies the wrapped slice.
///
/// Read access is through `Deref<Target = [T]>`.
pub struct CowBuffer<'a, T> {
    storage: Storage<'a, T>,
}

impl<T> Clone for CowBuffer<'_, T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<'a, T> CowBuffer<'a, T> {
    /// An empty, privately owned buffer.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// An empty buffer with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_vec(Vec::with_capacity(capacity))
    }

    /// Take ownership of an existing vector.
    pub fn from_vec(vec: Vec<T>) -> Self {
        Self {
            storage: Storage::Shared(Arc::new(vec)),
        }
    }

    /// Wrap externally owned memory without copying.
    ///
    /// The wrapped slice is never written; the first mutation copies it.
    pub fn wrap(slice: &'a [T]) -> Self {
        Self {
            storage: Storage::Borrowed(slice),
        }
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        match &self.storage {
            Storage::Borrowed(slice) => *slice,
            Storage::Shared(vec) => vec.as_slice(),
        }
    }

    /// Number of elements the buffer can hold without reallocating.
    ///
    /// A borrowed buffer reports its length: any growth reallocates.
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Borrowed(slice) => slice.len(),
            Storage::Shared(vec) => vec.capacity(),
        }
    }

    /// Whether the buffer wraps external memory.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    /// Whether the storage is owned but shared with at least one clone.
    pub fn is_shared(&self) -> bool {
        match &self.storage {
            Storage::Borrowed(_) => false,
            Storage::Shared(vec) => Arc::strong_count(vec) > 1,
        }
    }

    /// Whether the storage is private: owned and not shared.
    ///
    /// A write to a private buffer never copies.
    pub fn is_owned(&self) -> bool {
        match &self.storage {
            Storage::Borrowed(_) => false,
            Storage::Shared(vec) => Arc::strong_count(vec) == 1,
        }
    }

    /// Whether both buffers currently read from the same memory.
    ///
    /// Two empty buffers never share storage.
    pub fn shares_storage_with(&self, other: &CowBuffer<'_, T>) -> bool {
        let (a, b) = (self.as_slice(), other.as_slice());
        !a.is_empty() && std::ptr::eq(a.as_ptr(), b.as_ptr())
    }

    /// Whether `index` addresses an element.
    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.as_slice().len()
    }

    /// Exchange the contents of two buffers without copying.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.storage, &mut other.storage);
    }

    /// Remove every element.
    ///
    /// Private storage is cleared in place and keeps its capacity. Borrowed
    /// or shared storage is released instead of copied.
    pub fn clear(&mut self) {
        if let Storage::Shared(vec) = &mut self.storage {
            if let Some(private) = Arc::get_mut(vec) {
                private.clear();
                return;
            }
        }
        self.storage = Storage::Shared(Arc::new(Vec::new()));
    }
}

impl<'a, T: Clone> CowBuffer<'a, T> {
    /// Mutable access to the backing vector, privatizing it first.
    ///
    /// This is the single copy-on-write promotion point. Borrowed storage
    /// is copied into a new vector; shared storage is detached from its
    /// siblings. The copy keeps the current capacity.
    pub fn make_mut(&mut self) -> &mut Vec<T> {
        self.make_mut_reserving(0)
    }

    /// Like [`CowBuffer::make_mut`], sizing any promotion copy so that
    /// `additional` more elements fit without a second reallocation.
    fn make_mut_reserving(&mut self, additional: usize) -> &mut Vec<T> {
        if let Storage::Borrowed(slice) = self.storage {
            debug!(
                "promoting borrowed buffer of {} elements to owned storage",
                slice.len()
            );
            let mut private = Vec::with_capacity(slice.len() + additional);
            private.extend_from_slice(slice);
            self.storage = Storage::Shared(Arc::new(private));
        }
        match &mut self.storage {
            Storage::Shared(vec) => {
                if Arc::strong_count(vec) > 1 {
                    debug!(
                        "detaching shared buffer of {} elements before write",
                        vec.len()
                    );
                    let capacity = vec.capacity().max(vec.len() + additional);
                    let mut private = Vec::with_capacity(capacity);
                    private.extend_from_slice(vec.as_slice());
                    *vec = Arc::new(private);
                }
                Arc::make_mut(vec)
            }
            Storage::Borrowed(_) => unreachable!("borrowed storage is promoted above"),
        }
    }

    /// The elements as a mutable slice, privatizing the storage first.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.make_mut().as_mut_slice()
    }

    /// Ensure room for `additional` more elements.
    ///
    /// Does nothing, and in particular does not copy borrowed or shared
    /// storage, when the spare capacity already suffices.
    pub fn reserve(&mut self, additional: usize) {
        if self.capacity() - self.as_slice().len() >= additional {
            return;
        }
        self.make_mut_reserving(additional).reserve(additional);
    }

    /// Append one element.
    pub fn push(&mut self, value: T) {
        self.make_mut_reserving(1).push(value);
    }

    /// Append a copy of every element of `values`.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.make_mut_reserving(values.len()).extend_from_slice(values);
    }

    /// Insert the items of `iter` before `pos` and return how many were
    /// inserted.
    ///
    /// # Panics
    ///
    /// Panics if `pos > len`.
    pub fn insert_from<I>(&mut self, pos: usize, iter: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let len = self.as_slice().len();
        assert!(pos <= len, "insert position {pos} out of bounds (len {len})");
        let iter = iter.into_iter();
        let vec = self.make_mut_reserving(iter.size_hint().0);
        if pos == len {
            vec.extend(iter);
        } else {
            vec.splice(pos..pos, iter).for_each(drop);
        }
        vec.len() - len
    }

    /// Insert `count` copies of `value` before `pos` and return the new
    /// slots.
    ///
    /// # Panics
    ///
    /// Panics if `pos > len`.
    pub fn insert_fill(&mut self, pos: usize, count: usize, value: T) -> &mut [T] {
        let inserted = self.insert_from(pos, std::iter::repeat_n(value, count));
        &mut self.make_mut()[pos..pos + inserted]
    }

    /// Append `count` copies of `value` and return the new slots.
    pub fn append_fill(&mut self, count: usize, value: T) -> &mut [T] {
        let len = self.as_slice().len();
        self.insert_fill(len, count, value)
    }

    /// Insert `count` default values before `pos` and return the new
    /// slots.
    ///
    /// # Panics
    ///
    /// Panics if `pos > len`.
    pub fn insert_default(&mut self, pos: usize, count: usize) -> &mut [T]
    where
        T: Default,
    {
        self.insert_fill(pos, count, T::default())
    }

    /// Append `count` default values and return the new slots.
    pub fn append_default(&mut self, count: usize) -> &mut [T]
    where
        T: Default,
    {
        self.append_fill(count, T::default())
    }

    /// Remove and return the element at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= len`.
    pub fn remove(&mut self, pos: usize) -> T {
        let len = self.as_slice().len();
        assert!(pos < len, "remove position {pos} out of bounds (len {len})");
        self.make_mut().remove(pos)
    }

    /// Remove the elements in `range`.
    ///
    /// An empty range is a no-op and does not copy shared storage.
    ///
    /// # Panics
    ///
    /// Panics if the range is inverted or extends past the end.
    pub fn erase(&mut self, range: Range<usize>) {
        let len = self.as_slice().len();
        assert!(
            range.start <= range.end,
            "inverted erase range {}..{}",
            range.start,
            range.end
        );
        assert!(
            range.end <= len,
            "erase range {}..{} out of bounds (len {len})",
            range.start,
            range.end
        );
        if range.is_empty() {
            return;
        }
        self.make_mut().drain(range);
    }

    /// Shorten the buffer to `len` elements.
    pub fn truncate(&mut self, len: usize) {
        if len < self.as_slice().len() {
            self.make_mut().truncate(len);
        }
    }

    /// Take the elements out as a vector, copying only if the storage is
    /// borrowed or shared.
    pub fn into_vec(self) -> Vec<T> {
        match self.storage {
            Storage::Borrowed(slice) => slice.to_vec(),
            Storage::Shared(vec) => Arc::try_unwrap(vec).unwrap_or_else(|arc| arc.as_ref().clone()),
        }
    }
}

impl<T: Clone + 'static> CowBuffer<'_, T> {
    /// Detach from any borrowed memory so the buffer can outlive it.
    ///
    /// Shared storage stays shared; only borrowed storage is copied.
    pub fn into_owned(self) -> CowBuffer<'static, T> {
        match self.storage {
            Storage::Borrowed(slice) => CowBuffer::from_vec(slice.to_vec()),
            Storage::Shared(vec) => CowBuffer {
                storage: Storage::Shared(vec),
            },
        }
    }
}

impl<'a, T: Pod> CowBuffer<'a, T> {
    /// Wrap an external byte buffer laid out as tightly packed `T` records.
    ///
    /// No bytes are copied or transformed.
    pub fn wrap_bytes(bytes: &'a [u8]) -> Result<Self, BufferError> {
        let slice = bytemuck::try_cast_slice(bytes).map_err(|e| match e {
            PodCastError::TargetAlignmentGreaterAndInputNotAligned
            | PodCastError::AlignmentMismatch => BufferError::Misaligned {
                required_align: std::mem::align_of::<T>(),
            },
            _ => BufferError::LengthMismatch {
                byte_len: bytes.len(),
                element_size: std::mem::size_of::<T>(),
            },
        })?;
        Ok(Self::wrap(slice))
    }

    /// The elements viewed as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<T> Default for CowBuffer<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for CowBuffer<'_, T> {
    fn from(vec: Vec<T>) -> Self {
        Self::from_vec(vec)
    }
}

impl<T> Deref for CowBuffer<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for CowBuffer<'_, T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: PartialEq> PartialEq for CowBuffer<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: fmt::Debug> fmt::Debug for CowBuffer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.storage {
            Storage::Borrowed(_) => "borrowed",
            Storage::Shared(vec) if Arc::strong_count(vec) > 1 => "shared",
            Storage::Shared(_) => "owned",
        };
        f.debug_struct("CowBuffer")
            .field("state", &state)
            .field("elements", &self.as_slice())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_owned_and_empty() {
        let buf: CowBuffer<'_, u32> = CowBuffer::new();
        assert!(buf.is_empty());
        assert!(buf.is_owned());
        assert!(!buf.is_borrowed());
    }

    #[test]
    fn with_capacity_reserves() {
        let buf: CowBuffer<'_, u32> = CowBuffer::with_capacity(64);
        assert!(buf.capacity() >= 64);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn wrap_does_not_copy() {
        let data = [1u32, 2, 3];
        let buf = CowBuffer::wrap(&data);
        assert!(buf.is_borrowed());
        assert_eq!(buf.as_ptr(), data.as_ptr());
        assert_eq!(&*buf, &data);
    }

    #[test]
    fn write_to_wrap_promotes_and_leaves_source() {
        let data = [1u32, 2, 3];
        let mut buf = CowBuffer::wrap(&data);
        buf.push(4);
        assert!(buf.is_owned());
        assert_eq!(&*buf, &[1, 2, 3, 4]);
        assert_eq!(data, [1, 2, 3]);
    }

    #[test]
    fn clones_share_until_written() {
        let mut a = CowBuffer::from_vec(vec![1u32, 2, 3]);
        let b = a.clone();
        assert!(a.is_shared());
        assert!(a.shares_storage_with(&b));

        a.as_mut_slice()[0] = 10;
        assert!(!a.shares_storage_with(&b));
        assert!(a.is_owned());
        assert!(b.is_owned());
        assert_eq!(&*a, &[10, 2, 3]);
        assert_eq!(&*b, &[1, 2, 3]);
    }

    #[test]
    fn detach_keeps_capacity() {
        let mut v = Vec::with_capacity(100);
        v.extend([1u8, 2, 3]);
        let mut a = CowBuffer::from_vec(v);
        let _b = a.clone();
        a.push(4);
        assert!(a.capacity() >= 100);
    }

    #[test]
    fn reserve_without_growth_does_not_promote() {
        let data = [1u32, 2];
        let mut buf = CowBuffer::wrap(&data);
        buf.reserve(0);
        assert!(buf.is_borrowed());
        buf.reserve(10);
        assert!(buf.is_owned());
        assert!(buf.capacity() >= 12);
    }

    #[test]
    fn insert_from_middle_and_end() {
        let mut buf = CowBuffer::from_vec(vec![1u32, 5]);
        assert_eq!(buf.insert_from(1, [2, 3, 4]), 3);
        assert_eq!(buf.insert_from(5, [6]), 1);
        assert_eq!(buf.insert_from(0, std::iter::empty()), 0);
        assert_eq!(&*buf, &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn insert_from_counts_unsized_iterators() {
        let mut buf = CowBuffer::from_vec(vec![0u32, 100]);
        let n = buf.insert_from(1, (1..50).filter(|v| v % 10 == 0));
        assert_eq!(n, 4);
        assert_eq!(&*buf, &[0, 10, 20, 30, 40, 100]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn insert_past_end_panics() {
        let mut buf = CowBuffer::from_vec(vec![1u32]);
        buf.insert_from(3, [2]);
    }

    #[test]
    fn insert_fill_returns_new_slots() {
        let mut buf = CowBuffer::from_vec(vec![1u32, 9]);
        let slots = buf.insert_fill(1, 3, 0);
        assert_eq!(slots.len(), 3);
        slots.copy_from_slice(&[2, 3, 4]);
        assert_eq!(&*buf, &[1, 2, 3, 4, 9]);

        let tail = buf.append_fill(2, 7);
        assert_eq!(tail, &[7, 7]);
        assert_eq!(buf.len(), 7);
    }

    #[test]
    fn default_slots_on_wrapped_buffer() {
        let data = [5u32, 6];
        let mut buf = CowBuffer::wrap(&data);
        buf.insert_default(0, 2)[1] = 1;
        buf.append_default(1);
        assert_eq!(&*buf, &[0, 1, 5, 6, 0]);
        assert_eq!(data, [5, 6]);
    }

    #[test]
    fn erase_and_remove() {
        let mut buf = CowBuffer::from_vec((0u32..10).collect());
        buf.erase(2..5);
        assert_eq!(&*buf, &[0, 1, 5, 6, 7, 8, 9]);
        assert_eq!(buf.remove(0), 0);
        assert_eq!(&*buf, &[1, 5, 6, 7, 8, 9]);
        buf.truncate(2);
        assert_eq!(&*buf, &[1, 5]);
    }

    #[test]
    fn empty_erase_keeps_sharing() {
        let mut a = CowBuffer::from_vec(vec![1u32, 2]);
        let b = a.clone();
        a.erase(1..1);
        assert!(a.shares_storage_with(&b));
    }

    #[test]
    #[should_panic(expected = "inverted erase range")]
    fn inverted_erase_panics() {
        let mut buf = CowBuffer::from_vec(vec![1u32, 2, 3]);
        #[allow(clippy::reversed_empty_ranges)]
        buf.erase(2..1);
    }

    #[test]
    fn clear_releases_shared_storage() {
        let mut a = CowBuffer::from_vec(vec![1u32, 2, 3]);
        let b = a.clone();
        a.clear();
        assert!(a.is_empty());
        assert!(a.is_owned());
        assert_eq!(&*b, &[1, 2, 3]);
    }

    #[test]
    fn clear_keeps_private_capacity() {
        let mut a = CowBuffer::with_capacity(32);
        a.extend_from_slice(&[1u32, 2]);
        a.clear();
        assert!(a.capacity() >= 32);
    }

    #[test]
    fn swap_exchanges_storage() {
        let data = [7u32];
        let mut a = CowBuffer::wrap(&data);
        let mut b = CowBuffer::from_vec(vec![1, 2]);
        a.swap(&mut b);
        assert!(b.is_borrowed());
        assert_eq!(&*a, &[1, 2]);
        assert_eq!(&*b, &[7]);
    }

    #[test]
    fn valid_index() {
        let buf = CowBuffer::from_vec(vec![1u32, 2]);
        assert!(buf.is_valid_index(1));
        assert!(!buf.is_valid_index(2));
    }

    #[test]
    fn wrap_bytes_casts_packed_records() {
        let values = [1u32, 2, 3];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let buf: CowBuffer<'_, u32> = CowBuffer::wrap_bytes(bytes).unwrap();
        assert_eq!(&*buf, &values);
        assert_eq!(buf.as_bytes(), bytes);
    }

    #[test]
    fn wrap_bytes_rejects_partial_records() {
        let values = [1u32, 2];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let err = CowBuffer::<'_, u32>::wrap_bytes(&bytes[..7]).unwrap_err();
        assert_eq!(
            err,
            BufferError::LengthMismatch {
                byte_len: 7,
                element_size: 4
            }
        );
    }

    #[test]
    fn wrap_bytes_rejects_misaligned_input() {
        let values = [0u32; 4];
        let bytes: &[u8] = bytemuck::cast_slice(&values);
        let err = CowBuffer::<'_, u32>::wrap_bytes(&bytes[1..5]).unwrap_err();
        assert_eq!(err, BufferError::Misaligned { required_align: 4 });
    }

    #[test]
    fn into_vec_and_into_owned() {
        let data = [1u32, 2];
        let buf = CowBuffer::wrap(&data);
        let owned: CowBuffer<'static, u32> = buf.clone().into_owned();
        assert!(owned.is_owned());
        assert_eq!(buf.into_vec(), vec![1, 2]);

        let a = CowBuffer::from_vec(vec![3u32]);
        let b = a.clone();
        assert_eq!(a.into_vec(), vec![3]);
        assert!(b.is_owned());
    }

    #[test]
    fn debug_reports_state() {
        let data = [1u8];
        let buf = CowBuffer::wrap(&data);
        assert!(format!("{buf:?}").contains("borrowed"));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Insert(usize, Vec<u16>),
            Erase(usize, usize),
            Push(u16),
            Snapshot,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (any::<usize>(), proptest::collection::vec(any::<u16>(), 0..5))
                    .prop_map(|(p, v)| Op::Insert(p, v)),
                (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Erase(a, b)),
                any::<u16>().prop_map(Op::Push),
                Just(Op::Snapshot),
            ]
        }

        proptest! {
            #[test]
            fn behaves_like_vec_and_snapshots_never_change(
                ops in proptest::collection::vec(op(), 1..40),
            ) {
                let mut buf: CowBuffer<'_, u16> = CowBuffer::new();
                let mut model: Vec<u16> = Vec::new();
                let mut snapshots: Vec<(CowBuffer<'_, u16>, Vec<u16>)> = Vec::new();
                for op in ops {
                    match op {
                        Op::Insert(p, items) => {
                            let p = p % (model.len() + 1);
                            let n = buf.insert_from(p, items.clone());
                            prop_assert_eq!(n, items.len());
                            model.splice(p..p, items);
                        }
                        Op::Erase(a, b) => {
                            let a = a % (model.len() + 1);
                            let b = a + b % (model.len() - a + 1);
                            buf.erase(a..b);
                            model.drain(a..b);
                        }
                        Op::Push(v) => {
                            buf.push(v);
                            model.push(v);
                        }
                        Op::Snapshot => snapshots.push((buf.clone(), model.clone())),
                    }
                    prop_assert_eq!(&*buf, model.as_slice());
                }
                for (snap, expected) in &snapshots {
                    prop_assert_eq!(&**snap, expected.as_slice());
                }
            }
        }
    }
}
