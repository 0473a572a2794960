// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Process-wide implementation registry.
//!
//! Implementations of each operator family are registered once and
//! queried many times: `constraint` asks the registry whether any
//! implementation covers a given engine, and primitive-descriptor
//! construction selects the concrete one. The registry is seeded with
//! the built-in reference kernels on first use; external backends (for
//! example a GPU engine) call [`register`] during their initialization.
//! Newly registered entries take priority, so optimized variants shadow
//! the reference ones for the engines they support.

use crate::ops::{RefConvolution, RefInnerProduct};
use crate::{Engine, OpFamily, Primitive, PrimitiveDesc, PrimitiveError};
use once_cell::sync::Lazy;
use std::sync::RwLock;
use tensor_layout::Memory;

/// Constructs an executable primitive from a validated descriptor and
/// bound memory objects.
pub type BuildFn =
    fn(&PrimitiveDesc, &[Memory], &[Memory]) -> Result<Box<dyn Primitive>, PrimitiveError>;

/// Reports whether an implementation can run on the given engine.
pub type SupportsFn = fn(&Engine) -> bool;

/// A registered implementation of one operator family.
#[derive(Clone, Copy)]
pub struct ImplEntry {
    /// Implementation name, unique within the family.
    pub name: &'static str,
    /// The operator family this implementation computes.
    pub family: OpFamily,
    /// Engine capability predicate.
    pub supports: SupportsFn,
    /// Primitive constructor.
    pub build: BuildFn,
}

impl std::fmt::Debug for ImplEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImplEntry")
            .field("name", &self.name)
            .field("family", &self.family)
            .finish()
    }
}

static REGISTRY: Lazy<RwLock<Vec<ImplEntry>>> =
    Lazy::new(|| RwLock::new(builtin_implementations()));

fn builtin_implementations() -> Vec<ImplEntry> {
    vec![RefConvolution::entry(), RefInnerProduct::entry()]
}

/// Registers an implementation, giving it priority over earlier entries
/// for the engines it supports.
pub fn register(entry: ImplEntry) {
    tracing::info!("registering {} implementation '{}'", entry.family, entry.name);
    REGISTRY
        .write()
        .expect("implementation registry poisoned")
        .insert(0, entry);
}

/// Selects the highest-priority implementation of `family` that supports
/// `engine`, or `None` if the engine kind is uncovered.
pub fn select(family: OpFamily, engine: &Engine) -> Option<ImplEntry> {
    REGISTRY
        .read()
        .expect("implementation registry poisoned")
        .iter()
        .find(|e| e.family == family && (e.supports)(engine))
        .copied()
}

/// Returns the names of all registered implementations of a family, in
/// priority order.
pub fn implementation_names(family: OpFamily) -> Vec<&'static str> {
    REGISTRY
        .read()
        .expect("implementation registry poisoned")
        .iter()
        .filter(|e| e.family == family)
        .map(|e| e.name)
        .collect()
}
