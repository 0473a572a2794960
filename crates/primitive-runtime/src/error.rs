// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for primitive construction and execution.

use crate::{EngineKind, OpFamily};
use tensor_layout::LayoutError;

/// Errors raised by the primitive runtime.
///
/// Everything except [`Unimplemented`](PrimitiveError::Unimplemented) is a
/// construction-time status: `constraint` and the primitive constructors
/// validate up front so execution itself has nothing left to check. A
/// failed construction leaves no partially-initialized object behind.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PrimitiveError {
    /// No implementation of this operator family is registered for the
    /// engine kind. Raised only by `constraint`.
    #[error("no {family} implementation registered for engine kind '{kind}'")]
    UnsupportedEngine { kind: EngineKind, family: OpFamily },

    /// The operation descriptor's shape parameters are internally
    /// inconsistent. Raised only by `constraint`.
    #[error("invalid operation shape: {0}")]
    InvalidOperationShape(String),

    /// A bound memory object disagrees with the operation descriptor.
    /// Raised once at primitive construction, never per element.
    #[error("shape mismatch for {operand}: {detail}")]
    ShapeMismatch {
        operand: &'static str,
        detail: String,
    },

    /// A descriptor or memory construction failed in the layout crate.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// The requested entry point is not provided by this implementation.
    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    /// Configuration parsing or validation failed.
    #[error("configuration error: {0}")]
    Config(String),
}
