// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `prim-rt run` command: execute a demo pipeline.
//!
//! Builds a convolution followed by an inner product that consumes the
//! convolution's destination, submits both to one stream, joins, and
//! prints the metrics summary:
//! ```text
//! src ──conv──▶ mid ──inner product──▶ dst [minibatch, out_channels]
//! ```

use crate::commands::{demo_values, parse_format};
use primitive_runtime::{
    ConvolutionDesc, InnerProductDesc, PrimitiveDesc, RuntimeConfig, Stream,
};
use std::path::Path;
use tensor_layout::{LayoutTag, Memory, MemoryDesc, Precision};

const SPATIAL: usize = 8;
const KERNEL: usize = 3;

pub fn execute(
    config_path: Option<&Path>,
    engine: String,
    minibatch: usize,
    in_channels: usize,
    out_channels: usize,
    src_format: String,
    wei_format: String,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              prim-rt · Pipeline Runner              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Configuration ──────────────────────────────────────────
    let config = match config_path {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig {
            engine,
            ..Default::default()
        },
    };
    let engine = config.create_engine()?;

    if let Some(threads) = config.num_threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            tracing::warn!("thread pool already initialized: {e}");
        }
    }

    let src_fmt = parse_format(&src_format)?;
    let wei_fmt = parse_format(&wei_format)?;

    println!("  Config:");
    println!("   Engine:       {engine}");
    println!("   Threads:      {}", config.resolve_threads());
    println!("   Shape:        [{minibatch}, {in_channels}, {SPATIAL}, {SPATIAL}]");
    println!("   Activations:  {src_fmt}");
    println!("   Weights:      {wei_fmt}");
    println!();

    // ── Build memory ───────────────────────────────────────────
    let out_spatial = SPATIAL - KERNEL + 1;
    let src = filled(&[minibatch, in_channels, SPATIAL, SPATIAL], src_fmt, 1)?;
    let conv_wei = filled(&[out_channels, in_channels, KERNEL, KERNEL], wei_fmt, 2)?;
    let conv_bias = filled(&[out_channels], LayoutTag::X, 3)?;
    let mid = Memory::new(MemoryDesc::new(
        &[minibatch, out_channels, out_spatial, out_spatial],
        Precision::F32,
        src_fmt,
    )?);
    let ip_wei = filled(
        &[out_channels, out_channels, out_spatial, out_spatial],
        LayoutTag::Oihw,
        4,
    )?;
    let dst = Memory::new(MemoryDesc::new(
        &[minibatch, out_channels],
        Precision::F32,
        LayoutTag::Nc,
    )?);

    // ── Build primitives (constraint runs inside) ──────────────
    let conv_d = ConvolutionDesc::new(minibatch, in_channels, out_channels, KERNEL, KERNEL);
    let conv_pd = PrimitiveDesc::new(conv_d.into(), engine)?;
    println!("  [1/3] convolution: '{}'", conv_pd.implementation_name());
    let conv = conv_pd.create_primitive(
        &[src, conv_wei, conv_bias],
        &[mid.clone()],
    )?;

    let ip_d = InnerProductDesc::with_spatial(
        minibatch,
        out_channels,
        out_channels,
        out_spatial,
        out_spatial,
    );
    let ip_pd = PrimitiveDesc::new(ip_d.into(), engine)?;
    println!("  [2/3] inner product: '{}'", ip_pd.implementation_name());
    let ip = ip_pd.create_primitive(&[mid, ip_wei], &[dst.clone()])?;

    // ── Execute ────────────────────────────────────────────────
    println!("  [3/3] executing stream...");
    let mut stream = Stream::new();
    stream.submit(conv).submit(ip);
    stream.wait()?;
    println!();

    if config.enable_profiling {
        println!("  {}", stream.metrics().summary());
    }

    let out = dst.read_logical();
    let checksum: f32 = out.iter().sum();
    println!(
        "  Output: [{minibatch}, {out_channels}], checksum {checksum:.4}, first {:?}",
        &out[..out.len().min(4)],
    );
    Ok(())
}

fn filled(dims: &[usize], format: LayoutTag, seed: usize) -> anyhow::Result<Memory> {
    let mem = Memory::new(MemoryDesc::new(dims, Precision::F32, format)?);
    mem.write_logical(&demo_values(mem.desc().logical_elements(), seed))?;
    Ok(mem)
}
