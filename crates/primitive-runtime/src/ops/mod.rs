// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference compute kernels.
//!
//! Every kernel here is layout-agnostic: each element access goes through
//! the operand's own layout mapper, so the same accumulation loop is
//! correct whether an operand is contiguous or blocked. Output elements
//! are computed data-parallel across `(minibatch, output_channel)`
//! coordinates; the accumulation order within one output element is fixed
//! so sequential and parallel runs produce identical results.

mod conv_op;
mod inner_product_op;

pub use conv_op::RefConvolution;
pub use inner_product_op::RefInnerProduct;
