// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference inner product.

use crate::registry::ImplEntry;
use crate::{Engine, EngineKind, InnerProductDesc, OpFamily, OperationDesc, Primitive, PrimitiveDesc, PrimitiveError};
use rayon::prelude::*;
use tensor_layout::Memory;

/// Layout-agnostic forward inner product.
///
/// Computes `dst[n, oc] = bias[oc] + sum over (ic, kh, kw) of
/// src[n, ic, kh, kw] * weights[oc, ic, kh, kw]` — a convolution whose
/// kernel covers the full spatial extent of the source, collapsing the
/// spatial axes. Without spatial axes the operands are 2-D and this is a
/// plain matrix multiply plus bias. The indexing discipline is the same
/// as the reference convolution: every access goes through the operand's
/// own layout mapper.
pub struct RefInnerProduct {
    desc: InnerProductDesc,
    engine: Engine,
    src: Memory,
    weights: Memory,
    bias: Option<Memory>,
    dst: Memory,
}

impl RefInnerProduct {
    /// Registry entry for this implementation.
    pub(crate) fn entry() -> ImplEntry {
        ImplEntry {
            name: "reference-inner-product",
            family: OpFamily::InnerProduct,
            supports: |engine| matches!(engine.kind(), EngineKind::Cpu | EngineKind::CpuLazy),
            build: Self::build,
        }
    }

    fn build(
        pd: &PrimitiveDesc,
        inputs: &[Memory],
        outputs: &[Memory],
    ) -> Result<Box<dyn Primitive>, PrimitiveError> {
        let OperationDesc::InnerProduct(desc) = *pd.op() else {
            return Err(PrimitiveError::ShapeMismatch {
                operand: "descriptor",
                detail: format!("expected inner-product, got {}", pd.op().family()),
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

        let expected_src: Vec<usize> = if desc.has_spatial() {
            vec![
                desc.minibatch,
                desc.input_channels,
                desc.kernel_h,
                desc.kernel_w,
            ]
        } else {
            vec![desc.minibatch, desc.input_channels]
        };
        if src.desc().dims() != expected_src {
            return Err(PrimitiveError::ShapeMismatch {
                operand: "src",
                detail: format!("expected {expected_src:?}, got {:?}", src.desc().dims()),
            });
        }

        let expected_wei: Vec<usize> = if desc.has_spatial() {
            vec![
                desc.output_channels,
                desc.input_channels,
                desc.kernel_h,
                desc.kernel_w,
            ]
        } else {
            vec![desc.output_channels, desc.input_channels]
        };
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

        let expected_dst = [desc.minibatch, desc.output_channels];
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
        }))
    }
}

impl Primitive for RefInnerProduct {
    fn name(&self) -> &'static str {
        "reference-inner-product"
    }

    fn engine(&self) -> Engine {
        self.engine
    }

    fn execute_forward(&self) -> Result<(), PrimitiveError> {
        let d = &self.desc;
        let src_md = self.src.desc();
        let wei_md = self.weights.desc();
        let dst_md = self.dst.desc();
        let spatial = d.has_spatial();

        // Each (n, oc) pair owns one disjoint destination offset.
        let results: Vec<(usize, f32)> = {
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
                    let mut acc = match (bias, bias_md) {
                        (Some(b), Some(md)) => b[md.offset(&[oc])],
                        _ => 0.0,
                    };
                    for ic in 0..d.input_channels {
                        if spatial {
                            for kh in 0..d.kernel_h {
                                for kw in 0..d.kernel_w {
                                    acc += src[src_md.offset(&[n, ic, kh, kw])]
                                        * wei[wei_md.offset(&[oc, ic, kh, kw])];
                                }
                            }
                        } else {
                            acc += src[src_md.offset(&[n, ic])] * wei[wei_md.offset(&[oc, ic])];
                        }
                    }
                    (dst_md.offset(&[n, oc]), acc)
                })
                .collect()
        };

        let mut dst_guard = self.dst.data_mut();
        let out = dst_guard.as_mut_slice();
        for (off, value) in results {
            out[off] = value;
        }
        Ok(())
    }
}
