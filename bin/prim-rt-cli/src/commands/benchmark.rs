// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `prim-rt benchmark` command: compare layouts for one convolution shape.

use crate::commands::demo_values;
use primitive_runtime::{ConvolutionDesc, Engine, EngineKind, PrimitiveDesc};
use std::time::Instant;
use tensor_layout::{LayoutTag, Memory, MemoryDesc, Precision};

const KERNEL: usize = 3;

pub fn execute(
    iterations: usize,
    minibatch: usize,
    channels: usize,
    spatial: usize,
) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             prim-rt · Layout Benchmark              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!(
        "  Shape: [{minibatch}, {channels}, {spatial}, {spatial}], kernel {KERNEL}x{KERNEL}, {iterations} iterations"
    );
    println!();
    println!(
        "  {:<24} {:>12} {:>12}",
        "Layouts (src/wei)", "Total (ms)", "Per-iter (ms)"
    );
    println!("  {}", "-".repeat(50));

    let engine = Engine::new(EngineKind::Cpu, 0);
    let desc = ConvolutionDesc::new(minibatch, channels, channels, KERNEL, KERNEL);
    let pd = PrimitiveDesc::new(desc.into(), engine)?;
    let out_spatial = spatial - KERNEL + 1;

    for (label, src_fmt, wei_fmt) in [
        ("nchw / oihw", LayoutTag::Nchw, LayoutTag::Oihw),
        ("nChw8c / oIhw8i", LayoutTag::NChw8c, LayoutTag::OIhw8i),
    ] {
        let src = filled(&[minibatch, channels, spatial, spatial], src_fmt, 1)?;
        let wei = filled(&[channels, channels, KERNEL, KERNEL], wei_fmt, 2)?;
        let dst = Memory::new(MemoryDesc::new(
            &[minibatch, channels, out_spatial, out_spatial],
            Precision::F32,
            LayoutTag::Nchw,
        )?);

        let conv = pd.create_primitive(&[src, wei], &[dst])?;

        // Warm-up run before timing.
        conv.execute_forward()?;
        let start = Instant::now();
        for _ in 0..iterations {
            conv.execute_forward()?;
        }
        let total = start.elapsed();

        println!(
            "  {:<24} {:>12.2} {:>12.3}",
            label,
            total.as_secs_f64() * 1000.0,
            total.as_secs_f64() * 1000.0 / iterations.max(1) as f64,
        );
    }
    println!();
    Ok(())
}

fn filled(dims: &[usize], format: LayoutTag, seed: usize) -> anyhow::Result<Memory> {
    let mem = Memory::new(MemoryDesc::new(dims, Precision::F32, format)?);
    mem.write_logical(&demo_values(mem.desc().logical_elements(), seed))?;
    Ok(mem)
}
