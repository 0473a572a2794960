// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! engine = "cpu"
//! engine_index = 0
//! num_threads = 4
//! enable_profiling = true
//! ```

use crate::{Engine, EngineKind, PrimitiveError};
use std::path::Path;

/// Configuration for driving the primitive runtime.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Engine kind name: `"cpu"`, `"cpu-lazy"`, or `"gpu"`.
    pub engine: String,
    /// Device index of the engine.
    #[serde(default)]
    pub engine_index: usize,
    /// Number of worker threads for data-parallel kernels (defaults to
    /// the number of online CPU cores).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
    /// Whether to print per-primitive timing after a stream joins.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_true() -> bool {
    true
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PrimitiveError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PrimitiveError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PrimitiveError> {
        toml::from_str(toml_str)
            .map_err(|e| PrimitiveError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, PrimitiveError> {
        toml::to_string_pretty(self)
            .map_err(|e| PrimitiveError::Config(format!("TOML serialise error: {e}")))
    }

    /// Creates the engine identity named by this config.
    pub fn create_engine(&self) -> Result<Engine, PrimitiveError> {
        let kind = match self.engine.to_lowercase().as_str() {
            "cpu" => EngineKind::Cpu,
            "cpu-lazy" | "cpu_lazy" => EngineKind::CpuLazy,
            "gpu" => EngineKind::Gpu,
            other => {
                return Err(PrimitiveError::Config(format!(
                    "unknown engine kind '{other}'; expected 'cpu', 'cpu-lazy', or 'gpu'"
                )))
            }
        };
        Ok(Engine::new(kind, self.engine_index))
    }

    /// Resolves the number of worker threads.
    pub fn resolve_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: "cpu".to_string(),
            engine_index: 0,
            num_threads: None,
            enable_profiling: true,
        }
    }
}
