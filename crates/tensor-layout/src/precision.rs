// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element precisions.

/// Enumerates the scalar types a [`crate::Memory`] buffer can hold.
///
/// The engine uses `Precision` to size physical footprints and to select
/// compute kernels at primitive-descriptor construction. Only
/// single-precision float is currently supported; the enum exists so
/// kernels dispatch on an explicit closed type rather than a generic
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Precision {
    /// 32-bit IEEE 754 floating point.
    F32,
}

impl Precision {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            Precision::F32 => 4,
        }
    }

    /// Returns a human-readable label for this precision.
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::F32 => "f32",
        }
    }
}
