// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory objects: a descriptor paired with physical storage.
//!
//! [`Memory`] is the data carrier primitives are bound to. The handle is
//! cheaply clonable and all clones share one buffer, so the same memory
//! can be bound as the output of one primitive and the input of the next.
//! Buffer lifetime is managed by the shared handle; it outlives every
//! primitive referencing it by construction.
//!
//! During execution, input buffers are only read and the destination
//! buffer is written through an exclusive guard. Overlap between a
//! destination and any other bound buffer is a caller contract, not
//! checked here.

use crate::{LayoutError, MemoryDesc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A tensor: descriptor plus shared storage sized to the descriptor's
/// physical footprint.
///
/// # Examples
/// ```
/// use tensor_layout::{LayoutTag, Memory, MemoryDesc, Precision};
///
/// let md = MemoryDesc::new(&[2, 3], Precision::F32, LayoutTag::Nc).unwrap();
/// let mem = Memory::new(md);
/// mem.write_logical(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(mem.read_logical(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Memory {
    desc: MemoryDesc,
    data: Arc<RwLock<Vec<f32>>>,
}

impl Memory {
    /// Creates a memory object with an owned, zero-filled buffer covering
    /// the descriptor's padded footprint.
    pub fn new(desc: MemoryDesc) -> Self {
        let data = vec![0.0f32; desc.padded_elements()];
        Self {
            desc,
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Creates a memory object around a caller-supplied buffer.
    ///
    /// The buffer must cover at least the descriptor's padded footprint;
    /// a larger buffer is allowed and the excess is ignored.
    ///
    /// # Errors
    /// Returns [`LayoutError::InsufficientBuffer`] if the buffer is too
    /// small.
    pub fn with_buffer(desc: MemoryDesc, buffer: Vec<f32>) -> Result<Self, LayoutError> {
        let required = desc.padded_elements();
        if buffer.len() < required {
            return Err(LayoutError::InsufficientBuffer {
                required: required * desc.precision().size_bytes(),
                provided: buffer.len() * desc.precision().size_bytes(),
            });
        }
        Ok(Self {
            desc,
            data: Arc::new(RwLock::new(buffer)),
        })
    }

    /// Returns the descriptor.
    pub fn desc(&self) -> &MemoryDesc {
        &self.desc
    }

    /// Acquires a shared read guard over the physical buffer.
    ///
    /// Multiple primitives may hold read guards concurrently; this is how
    /// input operands are accessed during execution.
    pub fn data(&self) -> MemoryReadGuard<'_> {
        MemoryReadGuard {
            guard: self.data.read().expect("memory lock poisoned"),
        }
    }

    /// Acquires an exclusive write guard over the physical buffer.
    pub fn data_mut(&self) -> MemoryWriteGuard<'_> {
        MemoryWriteGuard {
            guard: self.data.write().expect("memory lock poisoned"),
        }
    }

    /// Writes `values` in logical row-major order, routing each element
    /// through the layout mapper.
    ///
    /// # Errors
    /// Returns [`LayoutError::InsufficientBuffer`] if `values` does not
    /// hold exactly [`MemoryDesc::logical_elements`] values.
    pub fn write_logical(&self, values: &[f32]) -> Result<(), LayoutError> {
        let logical = self.desc.logical_elements();
        if values.len() != logical {
            let elem = self.desc.precision().size_bytes();
            return Err(LayoutError::InsufficientBuffer {
                required: logical * elem,
                provided: values.len() * elem,
            });
        }

        let mut guard = self.data_mut();
        let buf = guard.as_mut_slice();
        let mut index = vec![0usize; self.desc.rank()];
        for (linear, &v) in values.iter().enumerate() {
            self.desc.unravel(linear, &mut index);
            buf[self.desc.offset(&index)] = v;
        }
        Ok(())
    }

    /// Reads the tensor back in logical row-major order through the
    /// layout mapper. Padding slots are never visited.
    pub fn read_logical(&self) -> Vec<f32> {
        let guard = self.data();
        let buf = guard.as_slice();
        let mut index = vec![0usize; self.desc.rank()];
        (0..self.desc.logical_elements())
            .map(|linear| {
                self.desc.unravel(linear, &mut index);
                buf[self.desc.offset(&index)]
            })
            .collect()
    }
}

/// Shared read access to a [`Memory`] buffer.
pub struct MemoryReadGuard<'a> {
    guard: RwLockReadGuard<'a, Vec<f32>>,
}

impl MemoryReadGuard<'_> {
    /// Returns the physical buffer (padded footprint, layout order).
    pub fn as_slice(&self) -> &[f32] {
        &self.guard
    }
}

/// Exclusive write access to a [`Memory`] buffer.
pub struct MemoryWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Vec<f32>>,
}

impl MemoryWriteGuard<'_> {
    /// Returns the physical buffer (padded footprint, layout order).
    pub fn as_slice(&self) -> &[f32] {
        &self.guard
    }

    /// Returns the physical buffer mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayoutTag, Precision};

    fn md(dims: &[usize], format: LayoutTag) -> MemoryDesc {
        MemoryDesc::new(dims, Precision::F32, format).unwrap()
    }

    #[test]
    fn test_new_zero_filled_padded() {
        let mem = Memory::new(md(&[1, 12, 2, 2], LayoutTag::NChw8c));
        assert_eq!(mem.data().as_slice().len(), 64);
        assert!(mem.data().as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_with_buffer_too_small() {
        let desc = md(&[4, 4], LayoutTag::Nc);
        let r = Memory::with_buffer(desc, vec![0.0; 15]);
        assert!(matches!(
            r,
            Err(LayoutError::InsufficientBuffer {
                required: 64,
                provided: 60,
            })
        ));
    }

    #[test]
    fn test_with_buffer_larger_is_ok() {
        let desc = md(&[4], LayoutTag::X);
        let mem = Memory::with_buffer(desc, vec![1.0; 10]).unwrap();
        assert_eq!(mem.read_logical(), vec![1.0; 4]);
    }

    #[test]
    fn test_logical_roundtrip_contiguous() {
        let mem = Memory::new(md(&[2, 3, 2, 2], LayoutTag::Nchw));
        let values: Vec<f32> = (0..24).map(|i| i as f32).collect();
        mem.write_logical(&values).unwrap();
        assert_eq!(mem.read_logical(), values);
        // Contiguous layout: physical order equals logical order.
        assert_eq!(mem.data().as_slice(), &values[..]);
    }

    #[test]
    fn test_logical_roundtrip_blocked() {
        let mem = Memory::new(md(&[1, 12, 2, 2], LayoutTag::NChw8c));
        let values: Vec<f32> = (0..48).map(|i| (i as f32) * 0.5 - 7.0).collect();
        mem.write_logical(&values).unwrap();
        assert_eq!(mem.read_logical(), values);
    }

    /// Copying element-by-element through the mapper between two layouts
    /// and back is the identity on logical content.
    #[test]
    fn test_relayout_identity() {
        let values: Vec<f32> = (0..96).map(|i| (i as f32).sin()).collect();

        let plain = Memory::new(md(&[2, 12, 2, 2], LayoutTag::Nchw));
        plain.write_logical(&values).unwrap();

        let blocked = Memory::new(md(&[2, 12, 2, 2], LayoutTag::NChw8c));
        blocked.write_logical(&plain.read_logical()).unwrap();

        let back = Memory::new(md(&[2, 12, 2, 2], LayoutTag::Nchw));
        back.write_logical(&blocked.read_logical()).unwrap();

        assert_eq!(back.read_logical(), values);
    }

    #[test]
    fn test_write_logical_wrong_len() {
        let mem = Memory::new(md(&[2, 2], LayoutTag::Nc));
        assert!(mem.write_logical(&[1.0, 2.0]).is_err());
        assert!(mem.write_logical(&[0.0; 5]).is_err());
    }

    #[test]
    fn test_clones_share_storage() {
        let mem = Memory::new(md(&[3], LayoutTag::X));
        let alias = mem.clone();
        mem.write_logical(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(alias.read_logical(), vec![1.0, 2.0, 3.0]);
    }
}
