// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `prim-rt inspect` command: display a descriptor's physical layout.

use crate::commands::{parse_dims, parse_format};
use tensor_layout::{MemoryDesc, Precision};

pub fn execute(dims: String, format: String) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             prim-rt · Layout Inspector              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let dims = parse_dims(&dims)?;
    let format = parse_format(&format)?;
    let md = MemoryDesc::new(&dims, Precision::F32, format)?;

    println!("  Descriptor: {md}");
    println!("   Rank:             {}", md.rank());
    println!("   Logical elements: {}", md.logical_elements());
    println!("   Padded elements:  {}", md.padded_elements());
    println!("   Footprint:        {} bytes", md.size_bytes());
    println!("   Physical dims:    {:?}", md.padded_dims());
    if let Some(b) = format.blocking() {
        println!(
            "   Blocking:         axis {} in blocks of {}",
            b.axis, b.block
        );
    }
    println!();

    // Show where the first elements land physically.
    println!("  {:<20} {:>10}", "Logical index", "Offset");
    println!("  {}", "-".repeat(32));
    let mut index = vec![0usize; md.rank()];
    let samples = md.logical_elements().min(8);
    for _ in 0..samples {
        println!("  {:<20} {:>10}", format_index(&index), md.offset(&index));
        increment(&mut index, &dims);
    }
    let last: Vec<usize> = dims.iter().map(|d| d - 1).collect();
    println!("  {:<20} {:>10}", format_index(&last), md.offset(&last));
    println!();
    Ok(())
}

fn format_index(index: &[usize]) -> String {
    format!("{index:?}")
}

/// Advances a multi-index one step in logical row-major order.
fn increment(index: &mut [usize], dims: &[usize]) {
    for d in (0..dims.len()).rev() {
        index[d] += 1;
        if index[d] < dims[d] {
            return;
        }
        index[d] = 0;
    }
}
