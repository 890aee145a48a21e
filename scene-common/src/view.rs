//! Strided, non-owning views over `Pod` element storage
//!
//! A view addresses `count` elements of type `T` spaced `stride` bytes apart.
//! With `stride == size_of::<T>()` the view is dense and behaves like a slice;
//! larger strides address one field of every record in an array of records
//! (e.g. the normal of every `(normal, tangent, bitangent)` accumulator).
//!
//! Views borrow their backing bytes, so they can never outlive the storage
//! (usually an [`Arena`](crate::Arena) block) they were created from.

use std::marker::PhantomData;
use std::mem::size_of;

use bytemuck::Pod;

/// Errors raised when constructing or copying views
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("stride {stride} is smaller than the element size {element_size}")]
    StrideTooSmall { stride: usize, element_size: usize },

    #[error("view of {count} elements with stride {stride} needs {required} bytes, only {available} available")]
    OutOfBounds {
        count: usize,
        stride: usize,
        required: usize,
        available: usize,
    },

    #[error("field at offset {offset} ({field_size} bytes) does not fit in a {record_size} byte record")]
    FieldOutsideRecord {
        offset: usize,
        field_size: usize,
        record_size: usize,
    },

    #[error("slice {first}+{count} exceeds view length {len}")]
    SliceOutOfRange {
        first: usize,
        count: usize,
        len: usize,
    },

    #[error("copy target holds {target} elements, source has {source_len}")]
    TargetTooSmall { target: usize, source_len: usize },
}

/// Bytes needed to address `count` elements of `element_size` at `stride`
#[inline]
fn required_bytes(count: usize, stride: usize, element_size: usize) -> usize {
    if count == 0 {
        0
    } else {
        (count - 1) * stride + element_size
    }
}

fn check_layout<T>(len: usize, count: usize, stride: usize) -> Result<(), ViewError> {
    let element_size = size_of::<T>();
    if stride < element_size {
        return Err(ViewError::StrideTooSmall {
            stride,
            element_size,
        });
    }
    let required = required_bytes(count, stride, element_size);
    if required > len {
        return Err(ViewError::OutOfBounds {
            count,
            stride,
            required,
            available: len,
        });
    }
    Ok(())
}

/// Resolve `(first, count?)` against a view of `len` elements
fn slice_bounds(
    len: usize,
    stride: usize,
    element_size: usize,
    first: usize,
    count: Option<usize>,
) -> Result<(usize, std::ops::Range<usize>), ViewError> {
    let remaining = len.checked_sub(first).ok_or(ViewError::SliceOutOfRange {
        first,
        count: count.unwrap_or(0),
        len,
    })?;
    let count = count.unwrap_or(remaining);
    if count > remaining {
        return Err(ViewError::SliceOutOfRange { first, count, len });
    }
    if count == 0 {
        return Ok((0, 0..0));
    }
    let start = first * stride;
    Ok((count, start..start + required_bytes(count, stride, element_size)))
}

/// Read-only strided view
pub struct StridedView<'a, T> {
    bytes: &'a [u8],
    count: usize,
    stride: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for StridedView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StridedView<'_, T> {}

impl<T> std::fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedView")
            .field("count", &self.count)
            .field("stride", &self.stride)
            .finish()
    }
}

impl<'a, T: Pod> StridedView<'a, T> {
    /// Dense view over a slice
    pub fn from_slice(elements: &'a [T]) -> Self {
        Self {
            bytes: bytemuck::cast_slice(elements),
            count: elements.len(),
            stride: size_of::<T>(),
            _marker: PhantomData,
        }
    }

    /// View over raw bytes with an explicit stride
    pub fn from_bytes(bytes: &'a [u8], count: usize, stride: usize) -> Result<Self, ViewError> {
        check_layout::<T>(bytes.len(), count, stride)?;
        Ok(Self {
            bytes,
            count,
            stride,
            _marker: PhantomData,
        })
    }

    /// View of the `T` field at byte `offset` inside every record
    pub fn field_of<R: Pod>(records: &'a [R], offset: usize) -> Result<Self, ViewError> {
        if offset + size_of::<T>() > size_of::<R>() {
            return Err(ViewError::FieldOutsideRecord {
                offset,
                field_size: size_of::<T>(),
                record_size: size_of::<R>(),
            });
        }
        let bytes: &[u8] = bytemuck::cast_slice(records);
        Self::from_bytes(&bytes[offset.min(bytes.len())..], records.len(), size_of::<R>())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// True when elements are tightly packed
    pub fn is_dense(&self) -> bool {
        self.stride == size_of::<T>()
    }

    /// Element `index`, or `None` past the end
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.count {
            return None;
        }
        let start = index * self.stride;
        Some(bytemuck::pod_read_unaligned(
            &self.bytes[start..start + size_of::<T>()],
        ))
    }

    /// Element `index`
    ///
    /// # Panics
    /// Panics if `index >= len()`, like slice indexing.
    #[inline]
    pub fn at(&self, index: usize) -> T {
        match self.get(index) {
            Some(value) => value,
            None => panic!("index {index} out of range for view of {}", self.count),
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + '_ {
        (0..self.count).map(move |i| self.at(i))
    }

    /// Sub-view sharing the same storage; `count` defaults to the remaining elements
    pub fn slice(&self, first: usize, count: Option<usize>) -> Result<StridedView<'a, T>, ViewError> {
        let (count, range) = slice_bounds(self.count, self.stride, size_of::<T>(), first, count)?;
        let bytes: &'a [u8] = self.bytes;
        Ok(StridedView {
            bytes: &bytes[range],
            count,
            stride: self.stride,
            _marker: PhantomData,
        })
    }

    /// Copy every element into `target`, which must hold at least `len()` elements
    pub fn copy_to(&self, target: &mut StridedViewMut<'_, T>) -> Result<(), ViewError> {
        if target.count < self.count {
            return Err(ViewError::TargetTooSmall {
                target: target.count,
                source_len: self.count,
            });
        }
        if self.is_dense() && target.is_dense() {
            let n = self.count * size_of::<T>();
            target.bytes[..n].copy_from_slice(&self.bytes[..n]);
        } else {
            for i in 0..self.count {
                target.set(i, self.at(i));
            }
        }
        Ok(())
    }
}

/// Mutable strided view
pub struct StridedViewMut<'a, T> {
    bytes: &'a mut [u8],
    count: usize,
    stride: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: Pod> StridedViewMut<'a, T> {
    pub fn from_slice(elements: &'a mut [T]) -> Self {
        let count = elements.len();
        Self {
            bytes: bytemuck::cast_slice_mut(elements),
            count,
            stride: size_of::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn from_bytes(bytes: &'a mut [u8], count: usize, stride: usize) -> Result<Self, ViewError> {
        check_layout::<T>(bytes.len(), count, stride)?;
        Ok(Self {
            bytes,
            count,
            stride,
            _marker: PhantomData,
        })
    }

    /// Mutable view of the `T` field at byte `offset` inside every record
    pub fn field_of<R: Pod>(records: &'a mut [R], offset: usize) -> Result<Self, ViewError> {
        if offset + size_of::<T>() > size_of::<R>() {
            return Err(ViewError::FieldOutsideRecord {
                offset,
                field_size: size_of::<T>(),
                record_size: size_of::<R>(),
            });
        }
        let count = records.len();
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(records);
        let start = offset.min(bytes.len());
        Self::from_bytes(&mut bytes[start..], count, size_of::<R>())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_dense(&self) -> bool {
        self.stride == size_of::<T>()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.as_view().get(index)
    }

    /// Overwrite element `index`
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        assert!(
            index < self.count,
            "index {index} out of range for view of {}",
            self.count
        );
        let start = index * self.stride;
        self.bytes[start..start + size_of::<T>()].copy_from_slice(bytemuck::bytes_of(&value));
    }

    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            bytes: &*self.bytes,
            count: self.count,
            stride: self.stride,
            _marker: PhantomData,
        }
    }

    /// Mutable sub-view consuming `self`; `count` defaults to the remaining elements
    pub fn into_slice(self, first: usize, count: Option<usize>) -> Result<StridedViewMut<'a, T>, ViewError> {
        let (count, range) = slice_bounds(self.count, self.stride, size_of::<T>(), first, count)?;
        let bytes = self.bytes;
        Ok(StridedViewMut {
            bytes: &mut bytes[range],
            count,
            stride: self.stride,
            _marker: PhantomData,
        })
    }
}
