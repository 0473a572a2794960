// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Physical layout tags.
//!
//! A [`LayoutTag`] describes how a tensor's logical axes are arranged in
//! physical storage. Contiguous tags are plain row-major; blocked tags
//! split one axis into an outer index and a fixed-size inner block stored
//! contiguously as the fastest-varying trailing axis.

/// Inner block size used by the blocked channel formats.
pub const CHANNEL_BLOCK: usize = 8;

/// Describes the blocking of a single logical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blocking {
    /// Index of the logical axis that is split.
    pub axis: usize,
    /// Extent of the contiguous inner block.
    pub block: usize,
}

/// The closed set of supported physical formats.
///
/// Naming follows the usual deep-learning axis letters: `n` minibatch,
/// `c` channels, `h`/`w` spatial, `o`/`i` output/input channels of a
/// weight tensor. A capitalised letter followed by a trailing `8c`/`8i`
/// marks the axis that is blocked by 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LayoutTag {
    /// 1-D contiguous vector.
    X,
    /// 2-D contiguous row-major matrix.
    Nc,
    /// 4-D contiguous activation tensor (minibatch, channels, height, width).
    Nchw,
    /// 4-D contiguous weight tensor (out-channels, in-channels, height, width).
    Oihw,
    /// 4-D activation tensor with channels blocked by 8.
    NChw8c,
    /// 4-D weight tensor with input channels blocked by 8.
    OIhw8i,
}

impl LayoutTag {
    /// Returns the tensor rank this tag describes.
    pub fn rank(self) -> usize {
        match self {
            LayoutTag::X => 1,
            LayoutTag::Nc => 2,
            LayoutTag::Nchw | LayoutTag::Oihw | LayoutTag::NChw8c | LayoutTag::OIhw8i => 4,
        }
    }

    /// Returns the blocking descriptor, or `None` for contiguous tags.
    ///
    /// Both blocked formats split the channel axis (axis 1: `c` of an
    /// activation, `i` of a weight tensor).
    pub fn blocking(self) -> Option<Blocking> {
        match self {
            LayoutTag::NChw8c | LayoutTag::OIhw8i => Some(Blocking {
                axis: 1,
                block: CHANNEL_BLOCK,
            }),
            _ => None,
        }
    }

    /// Returns `true` if this tag uses a blocked arrangement.
    pub fn is_blocked(self) -> bool {
        self.blocking().is_some()
    }

    /// Returns the conventional short name of this format.
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutTag::X => "x",
            LayoutTag::Nc => "nc",
            LayoutTag::Nchw => "nchw",
            LayoutTag::Oihw => "oihw",
            LayoutTag::NChw8c => "nChw8c",
            LayoutTag::OIhw8i => "oIhw8i",
        }
    }
}

impl std::fmt::Display for LayoutTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
