// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Primitive descriptors and the primitive capability trait.
//!
//! The construction pipeline is strictly ordered:
//!
//! ```text
//! OperationDesc + Engine
//!     │  constraint (shape validity + engine coverage)
//!     ▼
//! PrimitiveDesc               (implementation selected, immutable)
//!     │  create_primitive (bind Memory, one-time shape checks)
//!     ▼
//! Box<dyn Primitive>          (submit to a Stream)
//! ```
//!
//! Skipping `constraint` is impossible through this API: the only way to
//! obtain a [`PrimitiveDesc`] runs it.

use crate::{registry, Engine, OperationDesc, PrimitiveError};
use tensor_layout::Memory;

/// An executable unit bound to concrete input/output memory.
///
/// Implementations are stateless across invocations beyond their bound
/// buffers: a primitive may be executed repeatedly and concurrently with
/// other primitives, provided the caller keeps destination buffers
/// disjoint from every other bound buffer.
pub trait Primitive: Send + Sync {
    /// Returns the implementation name (as registered).
    fn name(&self) -> &'static str;

    /// Returns the engine this primitive was created for.
    fn engine(&self) -> Engine;

    /// Runs the forward computation.
    fn execute_forward(&self) -> Result<(), PrimitiveError>;

    /// Runs the backward computation, for training-capable operators.
    fn execute_backward(&self) -> Result<(), PrimitiveError> {
        Err(PrimitiveError::Unimplemented("backward propagation"))
    }
}

/// Validates that `op` is internally consistent and that some registered
/// implementation covers `engine`.
///
/// Performs no computation and has no side effects. This check is
/// mandatory before a [`PrimitiveDesc`] may be built;
/// [`PrimitiveDesc::new`] runs it internally so the ordering cannot be
/// bypassed.
///
/// # Errors
/// [`PrimitiveError::InvalidOperationShape`] for inconsistent shape
/// parameters, [`PrimitiveError::UnsupportedEngine`] when no
/// implementation is registered for the engine kind.
pub fn constraint(op: &OperationDesc, engine: &Engine) -> Result<(), PrimitiveError> {
    op.validate()?;
    if registry::select(op.family(), engine).is_none() {
        return Err(PrimitiveError::UnsupportedEngine {
            kind: engine.kind(),
            family: op.family(),
        });
    }
    Ok(())
}

/// A validated (operation, engine, implementation) combination.
///
/// Constructed once per distinct combination and reusable to build any
/// number of primitives. Immutable.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveDesc {
    op: OperationDesc,
    engine: Engine,
    implementation: registry::ImplEntry,
}

impl PrimitiveDesc {
    /// Runs `constraint` and, on success, selects the concrete
    /// implementation for this combination.
    pub fn new(op: OperationDesc, engine: Engine) -> Result<Self, PrimitiveError> {
        op.validate()?;
        let implementation = registry::select(op.family(), &engine).ok_or(
            PrimitiveError::UnsupportedEngine {
                kind: engine.kind(),
                family: op.family(),
            },
        )?;
        tracing::debug!(
            "selected '{}' for {} on {engine}",
            implementation.name,
            op.family(),
        );
        Ok(Self {
            op,
            engine,
            implementation,
        })
    }

    /// Returns the operation descriptor.
    pub fn op(&self) -> &OperationDesc {
        &self.op
    }

    /// Returns the engine.
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Returns the selected implementation's name.
    pub fn implementation_name(&self) -> &'static str {
        self.implementation.name
    }

    /// Builds an executable primitive bound to the given memory objects.
    ///
    /// Inputs are ordered `[src, weights]` or `[src, weights, bias]`;
    /// outputs are `[dst]`. Shape consistency between the bound memory
    /// and the operation descriptor is checked here, once.
    ///
    /// # Errors
    /// [`PrimitiveError::ShapeMismatch`] if any bound memory disagrees
    /// with the operation descriptor.
    pub fn create_primitive(
        &self,
        inputs: &[Memory],
        outputs: &[Memory],
    ) -> Result<Box<dyn Primitive>, PrimitiveError> {
        (self.implementation.build)(self, inputs, outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConvolutionDesc, EngineKind, InnerProductDesc, OpFamily};

    #[test]
    fn test_constraint_success() {
        let op: OperationDesc = InnerProductDesc::new(2, 4, 8).into();
        let engine = Engine::new(EngineKind::Cpu, 0);
        assert!(constraint(&op, &engine).is_ok());
    }

    #[test]
    fn test_constraint_rejects_zero_channels() {
        let op: OperationDesc = InnerProductDesc::new(2, 0, 8).into();
        let engine = Engine::new(EngineKind::Cpu, 0);
        assert!(matches!(
            constraint(&op, &engine),
            Err(PrimitiveError::InvalidOperationShape(_))
        ));
    }

    #[test]
    fn test_constraint_rejects_uncovered_engine() {
        let op: OperationDesc = ConvolutionDesc::new(1, 2, 2, 3, 3).into();
        let engine = Engine::new(EngineKind::Gpu, 0);
        assert!(matches!(
            constraint(&op, &engine),
            Err(PrimitiveError::UnsupportedEngine {
                kind: EngineKind::Gpu,
                family: OpFamily::Convolution,
            })
        ));
    }

    #[test]
    fn test_desc_selects_reference() {
        let op: OperationDesc = ConvolutionDesc::new(1, 2, 2, 3, 3).into();
        let pd = PrimitiveDesc::new(op, Engine::new(EngineKind::Cpu, 0)).unwrap();
        assert_eq!(pd.implementation_name(), "reference-convolution");
        assert_eq!(pd.op().family(), OpFamily::Convolution);
    }

    #[test]
    fn test_desc_rejects_invalid_shape() {
        let op: OperationDesc = ConvolutionDesc::new(0, 2, 2, 3, 3).into();
        assert!(PrimitiveDesc::new(op, Engine::new(EngineKind::Cpu, 0)).is_err());
    }
}
