// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CLI subcommand implementations and shared helpers.

pub mod benchmark;
pub mod inspect;
pub mod run;

use tensor_layout::LayoutTag;

/// Initializes the tracing subscriber based on `-v` count.
pub fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

/// Parses a layout tag from its conventional short name.
pub fn parse_format(name: &str) -> anyhow::Result<LayoutTag> {
    match name {
        "x" => Ok(LayoutTag::X),
        "nc" => Ok(LayoutTag::Nc),
        "nchw" => Ok(LayoutTag::Nchw),
        "oihw" => Ok(LayoutTag::Oihw),
        "nChw8c" => Ok(LayoutTag::NChw8c),
        "oIhw8i" => Ok(LayoutTag::OIhw8i),
        other => anyhow::bail!(
            "unknown format '{other}'; expected one of x, nc, nchw, oihw, nChw8c, oIhw8i"
        ),
    }
}

/// Parses comma-separated dimensions, e.g. `"2,12,6,6"`.
pub fn parse_dims(spec: &str) -> anyhow::Result<Vec<usize>> {
    spec.split(',')
        .map(|d| {
            d.trim()
                .parse::<usize>()
                .map_err(|e| anyhow::anyhow!("invalid dimension '{d}': {e}"))
        })
        .collect()
}

/// Deterministic demo values.
pub fn demo_values(n: usize, seed: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((i * 13 + seed * 7) % 21) as f32 * 0.25 - 2.5)
        .collect()
}
