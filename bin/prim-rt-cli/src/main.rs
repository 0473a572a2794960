// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # prim-rt
//!
//! Command-line interface for the prim-rt primitive execution engine.
//!
//! ## Usage
//! ```bash
//! # Run a demo convolution + inner-product pipeline
//! prim-rt run --src-format nChw8c --wei-format oIhw8i
//!
//! # Compare layouts for one convolution shape
//! prim-rt benchmark --iterations 50
//!
//! # Inspect a memory descriptor's physical layout
//! prim-rt inspect --dims 2,12,6,6 --format nChw8c
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "prim-rt",
    about = "Layout-aware deep-learning primitive execution engine",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (overrides CLI arguments).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a demo convolution + inner-product pipeline.
    Run {
        /// Engine kind: cpu, cpu-lazy.
        #[arg(short, long, default_value = "cpu")]
        engine: String,

        /// Minibatch size.
        #[arg(long, default_value_t = 2)]
        minibatch: usize,

        /// Input channels of the convolution.
        #[arg(long, default_value_t = 16)]
        in_channels: usize,

        /// Output channels of the convolution.
        #[arg(long, default_value_t = 16)]
        out_channels: usize,

        /// Activation layout: nchw or nChw8c.
        #[arg(long, default_value = "nchw")]
        src_format: String,

        /// Weight layout: oihw or oIhw8i.
        #[arg(long, default_value = "oihw")]
        wei_format: String,
    },

    /// Benchmark one convolution shape across layouts.
    Benchmark {
        /// Iterations per layout.
        #[arg(short, long, default_value_t = 20)]
        iterations: usize,

        /// Minibatch size.
        #[arg(long, default_value_t = 1)]
        minibatch: usize,

        /// Channels (input and output).
        #[arg(long, default_value_t = 32)]
        channels: usize,

        /// Spatial extent of the square input.
        #[arg(long, default_value_t = 16)]
        spatial: usize,
    },

    /// Inspect a memory descriptor: footprint, padded dims, offsets.
    Inspect {
        /// Comma-separated logical dimensions, e.g. "2,12,6,6".
        #[arg(short, long)]
        dims: String,

        /// Layout tag: x, nc, nchw, oihw, nChw8c, oIhw8i.
        #[arg(short, long)]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            engine,
            minibatch,
            in_channels,
            out_channels,
            src_format,
            wei_format,
        } => commands::run::execute(
            cli.config.as_deref(),
            engine,
            minibatch,
            in_channels,
            out_channels,
            src_format,
            wei_format,
        ),
        Commands::Benchmark {
            iterations,
            minibatch,
            channels,
            spatial,
        } => commands::benchmark::execute(iterations, minibatch, channels, spatial),
        Commands::Inspect { dims, format } => commands::inspect::execute(dims, format),
    }
}
