// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory descriptors and the logical-to-physical layout mapper.
//!
//! A [`MemoryDesc`] binds a logical shape to a [`LayoutTag`] and a
//! [`Precision`]. Its [`offset`](MemoryDesc::offset) method is the single
//! mapping every compute kernel uses: given one integer per logical axis,
//! it returns the physical element offset for this descriptor's format.
//! Kernels never special-case a layout; correctness for blocked formats
//! lives entirely here.

use crate::{LayoutError, LayoutTag, Precision};

/// Describes a tensor: logical dimensions, element precision, and the
/// physical format its elements are stored in.
///
/// Immutable once constructed. Descriptors are value objects; building
/// and discarding them is cheap.
///
/// # Examples
/// ```
/// use tensor_layout::{LayoutTag, MemoryDesc, Precision};
///
/// let md = MemoryDesc::new(&[2, 32, 6, 6], Precision::F32, LayoutTag::Nchw).unwrap();
/// assert_eq!(md.logical_elements(), 2 * 32 * 6 * 6);
/// assert_eq!(md.offset(&[0, 0, 0, 1]), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryDesc {
    dims: Vec<usize>,
    precision: Precision,
    format: LayoutTag,
}

impl MemoryDesc {
    /// Creates a descriptor for the given logical dimensions.
    ///
    /// # Errors
    /// Returns [`LayoutError::UnsupportedFormat`] if `dims` does not have
    /// the rank the tag describes, and [`LayoutError::InvalidShape`] if
    /// any dimension has zero extent.
    pub fn new(
        dims: &[usize],
        precision: Precision,
        format: LayoutTag,
    ) -> Result<Self, LayoutError> {
        if dims.len() != format.rank() {
            return Err(LayoutError::UnsupportedFormat {
                format,
                expected: format.rank(),
                actual: dims.len(),
            });
        }
        if dims.iter().any(|&d| d == 0) {
            return Err(LayoutError::InvalidShape {
                dims: dims.to_vec(),
            });
        }
        Ok(Self {
            dims: dims.to_vec(),
            precision,
            format,
        })
    }

    /// Returns the logical dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the number of logical axes.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the element precision.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Returns the layout tag.
    pub fn format(&self) -> LayoutTag {
        self.format
    }

    /// Returns the number of logical elements.
    pub fn logical_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the number of physical element slots, including any padding
    /// introduced by a blocked axis whose extent is not a block multiple.
    pub fn padded_elements(&self) -> usize {
        self.padded_dims().iter().product()
    }

    /// Returns the physical footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        self.padded_elements() * self.precision.size_bytes()
    }

    /// Returns the extents of the physical storage axes.
    ///
    /// For contiguous tags these equal the logical dims. For blocked tags
    /// the blocked axis is rounded up to whole blocks and the inner block
    /// appears as an extra fastest-varying trailing axis.
    pub fn padded_dims(&self) -> Vec<usize> {
        match self.format.blocking() {
            None => self.dims.clone(),
            Some(b) => {
                let mut padded = self.dims.clone();
                padded[b.axis] = self.dims[b.axis].div_ceil(b.block);
                padded.push(b.block);
                padded
            }
        }
    }

    /// Maps a logical multi-index to its physical element offset.
    ///
    /// `index` must hold one value per logical axis with
    /// `index[d] < dims[d]`; out-of-range indices are a caller-contract
    /// violation and are only debug-asserted, never checked in release
    /// builds.
    ///
    /// Contiguous tags use plain row-major strides. Blocked tags split the
    /// blocked axis `a` into `outer = index[a] / block` (which occupies
    /// axis `a`'s position over `ceil(dims[a] / block)` slots) and
    /// `inner = index[a] % block` (the fastest-varying trailing axis).
    pub fn offset(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.rank(), "index rank mismatch");
        debug_assert!(
            index.iter().zip(&self.dims).all(|(&i, &d)| i < d),
            "logical index {index:?} out of range for dims {:?}",
            self.dims
        );

        // Uniform Horner walk over the outer axes; block == 1 degenerates
        // to the contiguous row-major case.
        let (axis, block) = match self.format.blocking() {
            Some(b) => (b.axis, b.block),
            None => (0, 1),
        };

        let mut off = 0;
        for d in 0..self.dims.len() {
            let (extent, i) = if d == axis {
                (self.dims[d].div_ceil(block), index[d] / block)
            } else {
                (self.dims[d], index[d])
            };
            off = off * extent + i;
        }
        off * block + index[axis] % block
    }

    /// Decomposes a logical linear position (row-major over the logical
    /// dims) into a multi-index.
    pub(crate) fn unravel(&self, mut linear: usize, index: &mut [usize]) {
        for d in (0..self.dims.len()).rev() {
            index[d] = linear % self.dims[d];
            linear /= self.dims[d];
        }
    }
}

impl std::fmt::Display for MemoryDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}:{}:{}",
            self.dims,
            self.precision.as_str(),
            self.format
        )
    }
}
