// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference 2-D convolution.

use crate::registry::ImplEntry;
use crate::{ConvolutionDesc, Engine, EngineKind, OpFamily, OperationDesc, Primitive, PrimitiveDesc, PrimitiveError};
use rayon::prelude::*;
use tensor_layout::Memory;

/// Layout-agnostic forward convolution.
///
/// For every `(n, oc, oh, ow)` destination coordinate the kernel
/// accumulates
/// `bias[oc] + sum over (ic, kh, kw) of src[n, ic, oh*sh + kh - ph,
/// ow*sw + kw - pw] * weights[oc, ic, kh, kw]`
/// in f32, with source coordinates outside the tensor (possible only
/// with nonzero padding) contributing nothing. Accumulation order within
/// one destination element is fixed; destination elements are computed
/// in parallel.
pub struct RefConvolution {
    desc: ConvolutionDesc,
    engine: Engine,
    src: Memory,
    weights: Memory,
    bias: Option<Memory>,
    dst: Memory,
    in_h: usize,
    in_w: usize,
    out_h: usize,
    out_w: usize,
}

impl RefConvolution {
    /// Registry entry for this implementation.
    pub(crate) fn entry() -> ImplEntry {
        ImplEntry {
            name: "reference-convolution",
            family: OpFamily::Convolution,
            supports: |engine| matches!(engine.kind(), EngineKind::Cpu | EngineKind::CpuLazy),
            build: Self::build,
        }
    }

    fn build(
        pd: &PrimitiveDesc,
        inputs: &[Memory],
        outputs: &[Memory],
    ) -> Result<Box<dyn Primitive>, PrimitiveError> {
        let OperationDesc::Convolution(desc) = *pd.op() else {
            return Err(PrimitiveError::ShapeMismatch {
                operand: "descriptor",
                detail: format!("expected convolution, got {}", pd.op().family()),
            });
        };

        let (src, weights, bias) = match inputs {
            [src, weights] => (src.clone(), weights.clone(), None),
            [src, weights, bias] => (src.clone(), weights.clone(), Some(bias.clone())),
            _ => {
                return Err(PrimitiveError::ShapeMismatch {
                    operand: "inputs",
                    detail: format!("expected [src, weights] or [src, weights, bias], got {} operands", inputs.len()),
                })
            }
        };
        let [dst] = outputs else {
            return Err(PrimitiveError::ShapeMismatch {
                operand: "outputs",
                detail: format!("expected [dst], got {} operands", outputs.len()),
            });
        };
        let dst = dst.clone();

        let src_dims = src.desc().dims();
        if src_dims.len() != 4
            || src_dims[0] != desc.minibatch
            || src_dims[1] != desc.input_channels
        {
            return Err(PrimitiveError::ShapeMismatch {
                operand: "src",
                detail: format!(
                    "expected [{}, {}, h, w], got {src_dims:?}",
                    desc.minibatch, desc.input_channels
                ),
            });
        }
        let (in_h, in_w) = (src_dims[2], src_dims[3]);

        let expected_wei = [
            desc.output_channels,
            desc.input_channels,
            desc.kernel_h,
            desc.kernel_w,
        ];
        if weights.desc().dims() != expected_wei {
            return Err(PrimitiveError::ShapeMismatch {
                operand: "weights",
                detail: format!(
                    "expected {expected_wei:?}, got {:?}",
                    weights.desc().dims()
                ),
            });
        }

        if let Some(bias) = &bias {
            if bias.desc().dims() != [desc.output_channels] {
                return Err(PrimitiveError::ShapeMismatch {
                    operand: "bias",
                    detail: format!(
                        "expected [{}], got {:?}",
                        desc.output_channels,
                        bias.desc().dims()
                    ),
                });
            }
        }

        let out_h = ConvolutionDesc::out_extent(in_h, desc.kernel_h, desc.stride_h, desc.pad_h)
            .ok_or_else(|| PrimitiveError::ShapeMismatch {
                operand: "src",
                detail: format!(
                    "kernel {}x{} does not fit input {in_h}x{in_w} with padding {}x{}",
                    desc.kernel_h, desc.kernel_w, desc.pad_h, desc.pad_w
                ),
            })?;
        let out_w = ConvolutionDesc::out_extent(in_w, desc.kernel_w, desc.stride_w, desc.pad_w)
            .ok_or_else(|| PrimitiveError::ShapeMismatch {
                operand: "src",
                detail: format!(
                    "kernel {}x{} does not fit input {in_h}x{in_w} with padding {}x{}",
                    desc.kernel_h, desc.kernel_w, desc.pad_h, desc.pad_w
                ),
            })?;

        let expected_dst = [desc.minibatch, desc.output_channels, out_h, out_w];
        if dst.desc().dims() != expected_dst {
            return Err(PrimitiveError::ShapeMismatch {
                operand: "dst",
                detail: format!("expected {expected_dst:?}, got {:?}", dst.desc().dims()),
            });
        }

        Ok(Box::new(Self {
            desc,
            engine: pd.engine(),
            src,
            weights,
            bias,
            dst,
            in_h,
            in_w,
            out_h,
            out_w,
        }))
    }
}

impl Primitive for RefConvolution {
    fn name(&self) -> &'static str {
        "reference-convolution"
    }

    fn engine(&self) -> Engine {
        self.engine
    }

    fn execute_forward(&self) -> Result<(), PrimitiveError> {
        let d = &self.desc;
        let src_md = self.src.desc();
        let wei_md = self.weights.desc();
        let dst_md = self.dst.desc();

        // Each (n, oc) pair owns a disjoint destination plane, so the
        // pairs can run in parallel; writes happen afterwards under one
        // exclusive guard.
        let planes: Vec<Vec<(usize, f32)>> = {
            let src_guard = self.src.data();
            let wei_guard = self.weights.data();
            let bias_guard = self.bias.as_ref().map(|b| b.data());
            let src = src_guard.as_slice();
            let wei = wei_guard.as_slice();
            let bias = bias_guard.as_ref().map(|g| g.as_slice());
            let bias_md = self.bias.as_ref().map(|b| b.desc());

            (0..d.minibatch * d.output_channels)
                .into_par_iter()
                .map(|pair| {
                    let n = pair / d.output_channels;
                    let oc = pair % d.output_channels;
                    let mut plane = Vec::with_capacity(self.out_h * self.out_w);
                    for oh in 0..self.out_h {
                        for ow in 0..self.out_w {
                            let mut acc = match (bias, bias_md) {
                                (Some(b), Some(md)) => b[md.offset(&[oc])],
                                _ => 0.0,
                            };
                            for ic in 0..d.input_channels {
                                for kh in 0..d.kernel_h {
                                    for kw in 0..d.kernel_w {
                                        let ih = (oh * d.stride_h + kh) as isize
                                            - d.pad_h as isize;
                                        let iw = (ow * d.stride_w + kw) as isize
                                            - d.pad_w as isize;
                                        if ih < 0
                                            || ih >= self.in_h as isize
                                            || iw < 0
                                            || iw >= self.in_w as isize
                                        {
                                            continue;
                                        }
                                        acc += src[src_md
                                            .offset(&[n, ic, ih as usize, iw as usize])]
                                            * wei[wei_md.offset(&[oc, ic, kh, kw])];
                                    }
                                }
                            }
                            plane.push((dst_md.offset(&[n, oc, oh, ow]), acc));
                        }
                    }
                    plane
                })
                .collect()
        };

        let mut dst_guard = self.dst.data_mut();
        let out = dst_guard.as_mut_slice();
        for plane in planes {
            for (off, value) in plane {
                out[off] = value;
            }
        }
        Ok(())
    }
}
