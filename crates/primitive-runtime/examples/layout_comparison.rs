// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Run one convolution across layout combinations.
//!
//! Demonstrates the core value proposition of the runtime: the reference
//! kernel is written once against the layout mapper, so contiguous and
//! channel-blocked operands mix freely and every combination produces the
//! same logical result.
//!
//! ```bash
//! cargo run -p primitive-runtime --example layout_comparison
//! ```

use primitive_runtime::{ConvolutionDesc, Engine, EngineKind, PrimitiveDesc, Stream};
use std::time::Instant;
use tensor_layout::{LayoutTag, Memory, MemoryDesc, Precision};

const MB: usize = 2;
const IC: usize = 16;
const OC: usize = 16;
const SPATIAL: usize = 12;
const KERNEL: usize = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing.
    tracing_subscriber::fmt().with_env_filter("info").init();

    let engine = Engine::new(EngineKind::Cpu, 0);
    let desc = ConvolutionDesc::new(MB, IC, OC, KERNEL, KERNEL);
    let pd = PrimitiveDesc::new(desc.into(), engine)?;
    let out_spatial = SPATIAL - KERNEL + 1;

    println!(
        "Convolution [{MB}, {IC}, {SPATIAL}, {SPATIAL}] * [{OC}, {IC}, {KERNEL}, {KERNEL}] via '{}'\n",
        pd.implementation_name()
    );

    // Compare layout combinations.
    let combos = [
        (LayoutTag::Nchw, LayoutTag::Oihw, LayoutTag::Nchw),
        (LayoutTag::NChw8c, LayoutTag::Oihw, LayoutTag::Nchw),
        (LayoutTag::Nchw, LayoutTag::OIhw8i, LayoutTag::Nchw),
        (LayoutTag::NChw8c, LayoutTag::OIhw8i, LayoutTag::NChw8c),
    ];

    println!(
        "{:<30} {:>12} {:>14}",
        "Layouts (src/wei/dst)", "Time (ms)", "Checksum"
    );
    println!("{}", "-".repeat(58));

    let mut baseline: Option<Vec<f32>> = None;
    for (src_fmt, wei_fmt, dst_fmt) in combos {
        let src = filled(&[MB, IC, SPATIAL, SPATIAL], src_fmt, 1)?;
        let wei = filled(&[OC, IC, KERNEL, KERNEL], wei_fmt, 2)?;
        let bias = filled(&[OC], LayoutTag::X, 3)?;
        let dst = Memory::new(MemoryDesc::new(
            &[MB, OC, out_spatial, out_spatial],
            Precision::F32,
            dst_fmt,
        )?);

        let conv = pd.create_primitive(&[src, wei, bias], &[dst.clone()])?;

        let start = Instant::now();
        let mut stream = Stream::new();
        stream.submit(conv);
        stream.wait()?;
        let elapsed = start.elapsed();

        let out = dst.read_logical();
        let checksum: f32 = out.iter().sum();
        println!(
            "{:<30} {:>12.3} {:>14.4}",
            format!("{src_fmt} / {wei_fmt} / {dst_fmt}"),
            elapsed.as_secs_f64() * 1000.0,
            checksum,
        );

        // Every combination must agree with the first one.
        match &baseline {
            None => baseline = Some(out),
            Some(expected) => {
                let max_diff = out
                    .iter()
                    .zip(expected)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0f32, f32::max);
                assert!(max_diff <= 1e-4, "layouts disagree by {max_diff}");
            }
        }
    }

    println!("\nAll layout combinations produced identical results.");
    Ok(())
}

fn filled(
    dims: &[usize],
    format: LayoutTag,
    seed: usize,
) -> Result<Memory, Box<dyn std::error::Error>> {
    let mem = Memory::new(MemoryDesc::new(dims, Precision::F32, format)?);
    let values: Vec<f32> = (0..mem.desc().logical_elements())
        .map(|i| ((i * 13 + seed * 7) % 21) as f32 * 0.25 - 2.5)
        .collect();
    mem.write_logical(&values)?;
    Ok(mem)
}
