// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-layout
//!
//! Memory descriptors and layout-aware tensor storage for the prim-rt
//! primitive execution engine.
//!
//! This crate provides:
//! - [`MemoryDesc`] — shape + precision + physical layout tag, with the
//!   layout mapper that converts a logical multi-index into a physical
//!   element offset for any supported format.
//! - [`LayoutTag`] — the closed set of supported physical formats,
//!   including blocked (tiled) channel layouts.
//! - [`Memory`] — a descriptor paired with a shared data buffer sized to
//!   the descriptor's physical footprint.
//! - [`Precision`] — supported element types (f32).
//!
//! # Design Goals
//! - One mapping function per descriptor; compute kernels stay
//!   layout-agnostic by routing every element access through it.
//! - Blocked formats are first-class: padding introduced by a non-multiple
//!   channel extent is part of the physical footprint, never visible at
//!   the logical level.
//! - Clean error types via `thiserror`.

mod desc;
mod error;
mod format;
mod memory;
mod precision;

pub use desc::MemoryDesc;
pub use error::LayoutError;
pub use format::{Blocking, LayoutTag};
pub use memory::{Memory, MemoryReadGuard, MemoryWriteGuard};
pub use precision::Precision;
