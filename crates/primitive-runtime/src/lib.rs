// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # primitive-runtime
//!
//! The primitive/engine/stream execution model on top of `tensor-layout`.
//!
//! A caller describes an operation with an [`OperationDesc`], validates
//! it against an [`Engine`] (`constraint`), binds concrete
//! [`Memory`](tensor_layout::Memory) operands into a [`Primitive`], and
//! executes through a [`Stream`]:
//!
//! ```text
//! OperationDesc ──constraint──▶ PrimitiveDesc ──bind Memory──▶ Primitive
//!                                                                  │
//!                                       Stream::submit ◀───────────┘
//!                                       Stream::wait   ──▶ read outputs
//! ```
//!
//! The reference kernels ([`RefConvolution`], [`RefInnerProduct`]) are
//! layout-agnostic: every element access goes through the operand's own
//! layout mapper, so contiguous and blocked operands mix freely within
//! one computation. Optimized or off-CPU implementations register
//! through [`register`] and are selected by the same `constraint` path.

mod config;
mod descriptor;
mod engine;
mod error;
mod metrics;
mod ops;
mod primitive;
mod registry;
mod stream;

pub use config::RuntimeConfig;
pub use descriptor::{ConvolutionDesc, InnerProductDesc, OpFamily, OperationDesc};
pub use engine::{Engine, EngineKind};
pub use error::PrimitiveError;
pub use metrics::{PrimitiveMetrics, StreamMetrics};
pub use ops::{RefConvolution, RefInnerProduct};
pub use primitive::{constraint, Primitive, PrimitiveDesc};
pub use registry::{implementation_names, register, BuildFn, ImplEntry, SupportsFn};
pub use stream::Stream;
