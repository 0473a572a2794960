// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: end-to-end primitive execution.
//!
//! These tests exercise the complete flow from memory descriptors →
//! constraint checks → primitive construction → stream execution, and
//! compare every kernel result against an independent brute-force
//! reduction over logical (layout-free) values.

use primitive_runtime::{
    constraint, ConvolutionDesc, Engine, EngineKind, InnerProductDesc, OpFamily, OperationDesc,
    PrimitiveDesc, PrimitiveError, Stream,
};
use tensor_layout::{LayoutTag, Memory, MemoryDesc, Precision};

// ── Helpers ────────────────────────────────────────────────────

fn cpu() -> Engine {
    Engine::new(EngineKind::Cpu, 0)
}

fn md(dims: &[usize], format: LayoutTag) -> MemoryDesc {
    MemoryDesc::new(dims, Precision::F32, format).unwrap()
}

/// Deterministic, exactly-representable test values.
fn test_values(n: usize, seed: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((i * 13 + seed * 7) % 21) as f32 * 0.25 - 2.5)
        .collect()
}

fn filled(dims: &[usize], format: LayoutTag, seed: usize) -> Memory {
    let mem = Memory::new(md(dims, format));
    let values = test_values(mem.desc().logical_elements(), seed);
    mem.write_logical(&values).unwrap();
    mem
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= 1e-4 * e.abs().max(1.0),
            "element {i}: got {a}, expected {e}"
        );
    }
}

/// Brute-force inner product over logical row-major values.
fn brute_inner_product(
    d: &InnerProductDesc,
    src: &[f32],
    wei: &[f32],
    bias: Option<&[f32]>,
) -> Vec<f32> {
    let (ic, kh, kw) = (d.input_channels, d.kernel_h, d.kernel_w);
    let mut dst = vec![0.0f32; d.minibatch * d.output_channels];
    for n in 0..d.minibatch {
        for oc in 0..d.output_channels {
            let mut acc = bias.map_or(0.0, |b| b[oc]);
            for c in 0..ic {
                for h in 0..kh {
                    for w in 0..kw {
                        let s = src[((n * ic + c) * kh + h) * kw + w];
                        let g = wei[((oc * ic + c) * kh + h) * kw + w];
                        acc += s * g;
                    }
                }
            }
            dst[n * d.output_channels + oc] = acc;
        }
    }
    dst
}

/// Brute-force convolution over logical row-major values.
#[allow(clippy::too_many_arguments)]
fn brute_convolution(
    d: &ConvolutionDesc,
    src: &[f32],
    wei: &[f32],
    bias: Option<&[f32]>,
    in_h: usize,
    in_w: usize,
    out_h: usize,
    out_w: usize,
) -> Vec<f32> {
    let (ic, oc_total) = (d.input_channels, d.output_channels);
    let mut dst = vec![0.0f32; d.minibatch * oc_total * out_h * out_w];
    for n in 0..d.minibatch {
        for oc in 0..oc_total {
            for oh in 0..out_h {
                for ow in 0..out_w {
                    let mut acc = bias.map_or(0.0, |b| b[oc]);
                    for c in 0..ic {
                        for kh in 0..d.kernel_h {
                            for kw in 0..d.kernel_w {
                                let ih = (oh * d.stride_h + kh) as isize - d.pad_h as isize;
                                let iw = (ow * d.stride_w + kw) as isize - d.pad_w as isize;
                                if ih < 0 || ih >= in_h as isize || iw < 0 || iw >= in_w as isize
                                {
                                    continue;
                                }
                                let s = src
                                    [((n * ic + c) * in_h + ih as usize) * in_w + iw as usize];
                                let g = wei[((oc * ic + c) * d.kernel_h + kh) * d.kernel_w + kw];
                                acc += s * g;
                            }
                        }
                    }
                    dst[((n * oc_total + oc) * out_h + oh) * out_w + ow] = acc;
                }
            }
        }
    }
    dst
}

fn run_inner_product(
    d: InnerProductDesc,
    src_fmt: LayoutTag,
    wei_fmt: LayoutTag,
) -> (Vec<f32>, Vec<f32>) {
    let spatial = d.has_spatial();
    let src_dims: Vec<usize> = if spatial {
        vec![d.minibatch, d.input_channels, d.kernel_h, d.kernel_w]
    } else {
        vec![d.minibatch, d.input_channels]
    };
    let wei_dims: Vec<usize> = if spatial {
        vec![d.output_channels, d.input_channels, d.kernel_h, d.kernel_w]
    } else {
        vec![d.output_channels, d.input_channels]
    };

    let src = filled(&src_dims, src_fmt, 1);
    let wei = filled(&wei_dims, wei_fmt, 2);
    let bias = filled(&[d.output_channels], LayoutTag::X, 3);
    let dst = Memory::new(md(&[d.minibatch, d.output_channels], LayoutTag::Nc));

    let pd = PrimitiveDesc::new(d.into(), cpu()).unwrap();
    let ip = pd
        .create_primitive(
            &[src.clone(), wei.clone(), bias.clone()],
            &[dst.clone()],
        )
        .unwrap();

    let mut stream = Stream::new();
    stream.submit(ip);
    stream.wait().unwrap();

    let expected = brute_inner_product(
        &d,
        &src.read_logical(),
        &wei.read_logical(),
        Some(&bias.read_logical()),
    );
    (dst.read_logical(), expected)
}

// ── Inner Product ──────────────────────────────────────────────

/// src [2,32,6,6], weights [48,32,6,6], bias [48], contiguous layouts,
/// destination [2,48]: the kernel covers the full spatial extent.
#[test]
fn test_inner_product_contiguous_matches_brute_force() {
    let d = InnerProductDesc::with_spatial(2, 32, 48, 6, 6);
    let (actual, expected) = run_inner_product(d, LayoutTag::Nchw, LayoutTag::Oihw);
    assert_close(&actual, &expected);
}

/// Same shapes with blocked activation and weight layouts: the layout
/// must not change results.
#[test]
fn test_inner_product_blocked_matches_contiguous() {
    let d = InnerProductDesc::with_spatial(2, 32, 48, 6, 6);
    let (contiguous, expected) = run_inner_product(d, LayoutTag::Nchw, LayoutTag::Oihw);
    let (blocked, _) = run_inner_product(d, LayoutTag::NChw8c, LayoutTag::OIhw8i);

    assert_close(&contiguous, &expected);
    assert_close(&blocked, &contiguous);
}

/// Blocked layouts must also hold when the channel extent is not a
/// multiple of the block (padding lanes in play).
#[test]
fn test_inner_product_blocked_with_channel_padding() {
    let d = InnerProductDesc::with_spatial(2, 12, 5, 3, 3);
    let (contiguous, expected) = run_inner_product(d, LayoutTag::Nchw, LayoutTag::Oihw);
    let (blocked, _) = run_inner_product(d, LayoutTag::NChw8c, LayoutTag::OIhw8i);

    assert_close(&contiguous, &expected);
    assert_close(&blocked, &contiguous);
}

/// Degenerate scenario: no spatial extent; the inner product is a plain
/// matrix multiply `[2,2] x [4,2]^T` plus bias.
#[test]
fn test_inner_product_degenerate_is_matmul() {
    let d = InnerProductDesc::new(2, 2, 4);
    let (actual, expected) = run_inner_product(d, LayoutTag::Nc, LayoutTag::Nc);
    assert_close(&actual, &expected);

    // Cross-check `expected` against an explicit matmul.
    let src = test_values(4, 1);
    let wei = test_values(8, 2);
    let bias = test_values(4, 3);
    for n in 0..2 {
        for oc in 0..4 {
            let direct: f32 =
                bias[oc] + (0..2).map(|ic| src[n * 2 + ic] * wei[oc * 2 + ic]).sum::<f32>();
            assert!((expected[n * 4 + oc] - direct).abs() <= 1e-5);
        }
    }
}

/// Wide no-spatial inner product, the shape of a fully-connected
/// classifier head.
#[test]
fn test_inner_product_wide_matmul_matches_brute_force() {
    let d = InnerProductDesc::new(2, 32, 1152);
    let (actual, expected) = run_inner_product(d, LayoutTag::Nc, LayoutTag::Nc);
    assert_close(&actual, &expected);
}

// ── Convolution ────────────────────────────────────────────────

#[test]
fn test_convolution_contiguous_matches_brute_force() {
    let d = ConvolutionDesc::new(2, 4, 3, 3, 3);
    let src = filled(&[2, 4, 5, 5], LayoutTag::Nchw, 4);
    let wei = filled(&[3, 4, 3, 3], LayoutTag::Oihw, 5);
    let bias = filled(&[3], LayoutTag::X, 6);
    let dst = Memory::new(md(&[2, 3, 3, 3], LayoutTag::Nchw));

    let pd = PrimitiveDesc::new(d.into(), cpu()).unwrap();
    let conv = pd
        .create_primitive(&[src.clone(), wei.clone(), bias.clone()], &[dst.clone()])
        .unwrap();

    Stream::new().submit(conv).wait().unwrap();

    let expected = brute_convolution(
        &d,
        &src.read_logical(),
        &wei.read_logical(),
        Some(&bias.read_logical()),
        5,
        5,
        3,
        3,
    );
    assert_close(&dst.read_logical(), &expected);
}

#[test]
fn test_convolution_blocked_matches_contiguous() {
    let d = ConvolutionDesc::new(1, 16, 8, 3, 3);

    let run = |src_fmt, wei_fmt, dst_fmt| {
        let src = filled(&[1, 16, 6, 6], src_fmt, 7);
        let wei = filled(&[8, 16, 3, 3], wei_fmt, 8);
        let dst = Memory::new(md(&[1, 8, 4, 4], dst_fmt));
        let pd = PrimitiveDesc::new(d.into(), cpu()).unwrap();
        let conv = pd
            .create_primitive(&[src, wei], &[dst.clone()])
            .unwrap();
        Stream::new().submit(conv).wait().unwrap();
        dst.read_logical()
    };

    let contiguous = run(LayoutTag::Nchw, LayoutTag::Oihw, LayoutTag::Nchw);
    let blocked_inputs = run(LayoutTag::NChw8c, LayoutTag::OIhw8i, LayoutTag::Nchw);
    let blocked_all = run(LayoutTag::NChw8c, LayoutTag::OIhw8i, LayoutTag::NChw8c);

    assert_close(&blocked_inputs, &contiguous);
    assert_close(&blocked_all, &contiguous);
}

#[test]
fn test_convolution_strided_padded_matches_brute_force() {
    let d = ConvolutionDesc::new(2, 3, 4, 3, 3)
        .with_strides(2, 2)
        .with_padding(1, 1);
    // (7 + 2 - 3)/2 + 1 = 4 output rows and columns.
    let src = filled(&[2, 3, 7, 7], LayoutTag::Nchw, 9);
    let wei = filled(&[4, 3, 3, 3], LayoutTag::Oihw, 10);
    let dst = Memory::new(md(&[2, 4, 4, 4], LayoutTag::Nchw));

    let pd = PrimitiveDesc::new(d.into(), cpu()).unwrap();
    let conv = pd
        .create_primitive(&[src.clone(), wei.clone()], &[dst.clone()])
        .unwrap();
    Stream::new().submit(conv).wait().unwrap();

    let expected = brute_convolution(
        &d,
        &src.read_logical(),
        &wei.read_logical(),
        None,
        7,
        7,
        4,
        4,
    );
    assert_close(&dst.read_logical(), &expected);
}

// ── Pipelines ──────────────────────────────────────────────────

/// Two chained primitives in one stream: a convolution whose destination
/// feeds an inner product, joined once.
#[test]
fn test_stream_pipeline_conv_then_inner_product() {
    let conv_d = ConvolutionDesc::new(2, 4, 6, 3, 3);
    let src = filled(&[2, 4, 6, 6], LayoutTag::Nchw, 11);
    let wei = filled(&[6, 4, 3, 3], LayoutTag::Oihw, 12);
    let mid = Memory::new(md(&[2, 6, 4, 4], LayoutTag::Nchw));

    let ip_d = InnerProductDesc::with_spatial(2, 6, 5, 4, 4);
    let ip_wei = filled(&[5, 6, 4, 4], LayoutTag::Oihw, 13);
    let dst = Memory::new(md(&[2, 5], LayoutTag::Nc));

    let conv = PrimitiveDesc::new(conv_d.into(), cpu())
        .unwrap()
        .create_primitive(&[src.clone(), wei.clone()], &[mid.clone()])
        .unwrap();
    let ip = PrimitiveDesc::new(ip_d.into(), cpu())
        .unwrap()
        .create_primitive(&[mid.clone(), ip_wei.clone()], &[dst.clone()])
        .unwrap();

    let mut stream = Stream::new();
    stream.submit(conv).submit(ip);
    stream.wait().unwrap();
    assert_eq!(stream.metrics().executed(), 2);

    // Compose the two brute-force references.
    let mid_expected = brute_convolution(
        &conv_d,
        &src.read_logical(),
        &wei.read_logical(),
        None,
        6,
        6,
        4,
        4,
    );
    let expected = brute_inner_product(&ip_d, &mid_expected, &ip_wei.read_logical(), None);
    assert_close(&dst.read_logical(), &expected);
}

/// The lazy CPU engine produces the same results through the same join.
#[test]
fn test_lazy_engine_matches_eager() {
    let d = InnerProductDesc::new(3, 4, 2);
    let src = filled(&[3, 4], LayoutTag::Nc, 14);
    let wei = filled(&[2, 4], LayoutTag::Nc, 15);

    let run = |engine: Engine| {
        let dst = Memory::new(md(&[3, 2], LayoutTag::Nc));
        let ip = PrimitiveDesc::new(d.into(), engine)
            .unwrap()
            .create_primitive(&[src.clone(), wei.clone()], &[dst.clone()])
            .unwrap();
        Stream::new().submit(ip).wait().unwrap();
        dst.read_logical()
    };

    let eager = run(Engine::new(EngineKind::Cpu, 0));
    let lazy = run(Engine::new(EngineKind::CpuLazy, 0));
    assert_eq!(eager, lazy);
}

// ── Validation ─────────────────────────────────────────────────

#[test]
fn test_constraint_rejects_zero_channels_without_building() {
    let engine = cpu();
    for op in [
        OperationDesc::from(InnerProductDesc::new(2, 0, 4)),
        OperationDesc::from(InnerProductDesc::new(2, 4, 0)),
        OperationDesc::from(ConvolutionDesc::new(2, 0, 4, 3, 3)),
    ] {
        assert!(matches!(
            constraint(&op, &engine),
            Err(PrimitiveError::InvalidOperationShape(_))
        ));
    }
}

#[test]
fn test_constraint_rejects_uncovered_engine_kind() {
    // Convolution has no GPU implementation anywhere in this test
    // binary, so this stays uncovered even once the toy backend below
    // has registered itself.
    let op: OperationDesc = ConvolutionDesc::new(2, 4, 4, 3, 3).into();
    let gpu = Engine::new(EngineKind::Gpu, 0);
    assert!(matches!(
        constraint(&op, &gpu),
        Err(PrimitiveError::UnsupportedEngine {
            kind: EngineKind::Gpu,
            family: OpFamily::Convolution,
        })
    ));
}

#[test]
fn test_shape_mismatch_at_construction() {
    let d = InnerProductDesc::with_spatial(2, 32, 48, 6, 6);
    let src = Memory::new(md(&[2, 32, 6, 6], LayoutTag::Nchw));
    // Weight output-channel extent disagrees with the descriptor.
    let wei = Memory::new(md(&[47, 32, 6, 6], LayoutTag::Oihw));
    let dst = Memory::new(md(&[2, 48], LayoutTag::Nc));

    let pd = PrimitiveDesc::new(d.into(), cpu()).unwrap();
    let r = pd.create_primitive(&[src, wei], &[dst]);
    assert!(matches!(
        r,
        Err(PrimitiveError::ShapeMismatch {
            operand: "weights",
            ..
        })
    ));
}

// ── Registry extension ─────────────────────────────────────────

mod gpu_backend {
    //! A toy external backend: registers a GPU inner-product
    //! implementation that writes a constant, proving that registration
    //! opens new engine kinds to `constraint` and shadows nothing on CPU.

    use primitive_runtime::{
        register, Engine, EngineKind, ImplEntry, OpFamily, Primitive, PrimitiveDesc,
        PrimitiveError,
    };
    use tensor_layout::Memory;

    struct ConstantFill {
        engine: Engine,
        dst: Memory,
    }

    impl Primitive for ConstantFill {
        fn name(&self) -> &'static str {
            "test-gpu-inner-product"
        }
        fn engine(&self) -> Engine {
            self.engine
        }
        fn execute_forward(&self) -> Result<(), PrimitiveError> {
            let logical = self.dst.desc().logical_elements();
            self.dst.write_logical(&vec![42.0; logical])?;
            Ok(())
        }
    }

    fn build(
        pd: &PrimitiveDesc,
        _inputs: &[Memory],
        outputs: &[Memory],
    ) -> Result<Box<dyn Primitive>, PrimitiveError> {
        Ok(Box::new(ConstantFill {
            engine: pd.engine(),
            dst: outputs[0].clone(),
        }))
    }

    pub fn install() {
        register(ImplEntry {
            name: "test-gpu-inner-product",
            family: OpFamily::InnerProduct,
            supports: |e| e.kind() == EngineKind::Gpu,
            build,
        });
    }
}

#[test]
fn test_registered_backend_opens_engine_kind() {
    gpu_backend::install();

    let op: OperationDesc = InnerProductDesc::new(1, 2, 2).into();
    let gpu = Engine::new(EngineKind::Gpu, 0);
    constraint(&op, &gpu).unwrap();

    let pd = PrimitiveDesc::new(op, gpu).unwrap();
    assert_eq!(pd.implementation_name(), "test-gpu-inner-product");

    let src = Memory::new(md(&[1, 2], LayoutTag::Nc));
    let wei = Memory::new(md(&[2, 2], LayoutTag::Nc));
    let dst = Memory::new(md(&[1, 2], LayoutTag::Nc));
    let p = pd.create_primitive(&[src, wei], &[dst.clone()]).unwrap();

    Stream::new().submit(p).wait().unwrap();
    assert_eq!(dst.read_logical(), vec![42.0, 42.0]);

    // The CPU path is unaffected.
    let cpu_pd = PrimitiveDesc::new(InnerProductDesc::new(1, 2, 2).into(), cpu()).unwrap();
    assert_eq!(cpu_pd.implementation_name(), "reference-inner-product");
}
