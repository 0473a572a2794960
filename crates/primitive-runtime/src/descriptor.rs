// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operation descriptors.
//!
//! An operation descriptor declares an operator's shape parameters
//! independent of any engine or memory layout. Descriptors are immutable
//! value objects; combining one with an [`crate::Engine`] through a
//! successful `constraint` check yields a [`crate::PrimitiveDesc`].

use crate::PrimitiveError;

/// The operator families this runtime knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OpFamily {
    /// 2-D spatial convolution.
    Convolution,
    /// Inner product (fully-connected / full spatial reduction).
    InnerProduct,
}

impl OpFamily {
    /// Returns a human-readable family name.
    pub fn as_str(self) -> &'static str {
        match self {
            OpFamily::Convolution => "convolution",
            OpFamily::InnerProduct => "inner-product",
        }
    }
}

impl std::fmt::Display for OpFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape parameters of a 2-D convolution.
///
/// The reference path uses unit strides and no padding; both knobs exist
/// and are consumed uniformly by the same index-mapped accumulation loop.
/// Input spatial extents are not part of the descriptor — they come from
/// the bound source memory at primitive construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConvolutionDesc {
    pub minibatch: usize,
    pub input_channels: usize,
    pub output_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub stride_h: usize,
    pub stride_w: usize,
    pub pad_h: usize,
    pub pad_w: usize,
}

impl ConvolutionDesc {
    /// Creates a stride-1, no-padding convolution descriptor.
    pub fn new(
        minibatch: usize,
        input_channels: usize,
        output_channels: usize,
        kernel_h: usize,
        kernel_w: usize,
    ) -> Self {
        Self {
            minibatch,
            input_channels,
            output_channels,
            kernel_h,
            kernel_w,
            stride_h: 1,
            stride_w: 1,
            pad_h: 0,
            pad_w: 0,
        }
    }

    /// Sets the spatial strides.
    pub fn with_strides(mut self, stride_h: usize, stride_w: usize) -> Self {
        self.stride_h = stride_h;
        self.stride_w = stride_w;
        self
    }

    /// Sets the spatial padding.
    pub fn with_padding(mut self, pad_h: usize, pad_w: usize) -> Self {
        self.pad_h = pad_h;
        self.pad_w = pad_w;
        self
    }

    /// Computes the destination extent for one spatial axis, or `None`
    /// if the padded input cannot fit a single kernel application.
    pub fn out_extent(input: usize, kernel: usize, stride: usize, pad: usize) -> Option<usize> {
        let padded = input + 2 * pad;
        if padded < kernel || stride == 0 {
            return None;
        }
        Some((padded - kernel) / stride + 1)
    }

    pub(crate) fn validate(&self) -> Result<(), PrimitiveError> {
        if self.minibatch == 0 {
            return Err(PrimitiveError::InvalidOperationShape(
                "minibatch must be non-zero".into(),
            ));
        }
        if self.input_channels == 0 || self.output_channels == 0 {
            return Err(PrimitiveError::InvalidOperationShape(format!(
                "channel counts must be non-zero (ic={}, oc={})",
                self.input_channels, self.output_channels
            )));
        }
        if self.kernel_h == 0 || self.kernel_w == 0 {
            return Err(PrimitiveError::InvalidOperationShape(format!(
                "kernel extents must be non-zero ({}x{})",
                self.kernel_h, self.kernel_w
            )));
        }
        if self.stride_h == 0 || self.stride_w == 0 {
            return Err(PrimitiveError::InvalidOperationShape(format!(
                "strides must be non-zero ({}x{})",
                self.stride_h, self.stride_w
            )));
        }
        Ok(())
    }
}

/// Shape parameters of an inner product.
///
/// The kernel extents equal the spatial extents of the source tensor, so
/// the spatial axes reduce completely and the destination is always
/// `[minibatch, output_channels]`. A 1x1 kernel means the operands carry
/// no spatial axes at all and the operation is a plain matrix multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InnerProductDesc {
    pub minibatch: usize,
    pub input_channels: usize,
    pub output_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
}

impl InnerProductDesc {
    /// Creates a spatial-free (1x1) inner-product descriptor.
    pub fn new(minibatch: usize, input_channels: usize, output_channels: usize) -> Self {
        Self {
            minibatch,
            input_channels,
            output_channels,
            kernel_h: 1,
            kernel_w: 1,
        }
    }

    /// Creates an inner-product descriptor whose kernel covers the full
    /// spatial extent of a 4-D source.
    pub fn with_spatial(
        minibatch: usize,
        input_channels: usize,
        output_channels: usize,
        kernel_h: usize,
        kernel_w: usize,
    ) -> Self {
        Self {
            minibatch,
            input_channels,
            output_channels,
            kernel_h,
            kernel_w,
        }
    }

    /// Returns `true` when the operands carry spatial axes.
    pub fn has_spatial(&self) -> bool {
        self.kernel_h > 1 && self.kernel_w > 1
    }

    pub(crate) fn validate(&self) -> Result<(), PrimitiveError> {
        if self.minibatch == 0 {
            return Err(PrimitiveError::InvalidOperationShape(
                "minibatch must be non-zero".into(),
            ));
        }
        if self.input_channels == 0 || self.output_channels == 0 {
            return Err(PrimitiveError::InvalidOperationShape(format!(
                "channel counts must be non-zero (ic={}, oc={})",
                self.input_channels, self.output_channels
            )));
        }
        if self.kernel_h == 0 || self.kernel_w == 0 {
            return Err(PrimitiveError::InvalidOperationShape(format!(
                "kernel extents must be non-zero ({}x{})",
                self.kernel_h, self.kernel_w
            )));
        }
        Ok(())
    }
}

/// Closed variant type over the supported operation descriptors.
///
/// Kernels and the registry dispatch on this once, at primitive-descriptor
/// construction, never per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OperationDesc {
    Convolution(ConvolutionDesc),
    InnerProduct(InnerProductDesc),
}

impl OperationDesc {
    /// Returns the operator family this descriptor belongs to.
    pub fn family(&self) -> OpFamily {
        match self {
            OperationDesc::Convolution(_) => OpFamily::Convolution,
            OperationDesc::InnerProduct(_) => OpFamily::InnerProduct,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), PrimitiveError> {
        match self {
            OperationDesc::Convolution(d) => d.validate(),
            OperationDesc::InnerProduct(d) => d.validate(),
        }
    }
}

impl From<ConvolutionDesc> for OperationDesc {
    fn from(d: ConvolutionDesc) -> Self {
        OperationDesc::Convolution(d)
    }
}

impl From<InnerProductDesc> for OperationDesc {
    fn from(d: InnerProductDesc) -> Self {
        OperationDesc::InnerProduct(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conv_defaults() {
        let d = ConvolutionDesc::new(2, 4, 8, 3, 3);
        assert_eq!(d.stride_h, 1);
        assert_eq!(d.stride_w, 1);
        assert_eq!(d.pad_h, 0);
        assert_eq!(d.pad_w, 0);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_conv_builders() {
        let d = ConvolutionDesc::new(1, 1, 1, 3, 3)
            .with_strides(2, 2)
            .with_padding(1, 1);
        assert_eq!(d.stride_h, 2);
        assert_eq!(d.pad_w, 1);
    }

    #[test]
    fn test_conv_rejects_zero_fields() {
        assert!(ConvolutionDesc::new(0, 4, 8, 3, 3).validate().is_err());
        assert!(ConvolutionDesc::new(2, 0, 8, 3, 3).validate().is_err());
        assert!(ConvolutionDesc::new(2, 4, 0, 3, 3).validate().is_err());
        assert!(ConvolutionDesc::new(2, 4, 8, 0, 3).validate().is_err());
        assert!(ConvolutionDesc::new(2, 4, 8, 3, 3)
            .with_strides(0, 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_out_extent() {
        // 6x6 input, 3x3 kernel, stride 1, no padding -> 4.
        assert_eq!(ConvolutionDesc::out_extent(6, 3, 1, 0), Some(4));
        // Stride 2 with padding 1: (6 + 2 - 3)/2 + 1 = 3.
        assert_eq!(ConvolutionDesc::out_extent(6, 3, 2, 1), Some(3));
        // Kernel larger than padded input.
        assert_eq!(ConvolutionDesc::out_extent(2, 5, 1, 0), None);
        assert_eq!(ConvolutionDesc::out_extent(6, 3, 0, 0), None);
    }

    #[test]
    fn test_inner_product_spatial() {
        assert!(!InnerProductDesc::new(2, 4, 8).has_spatial());
        assert!(InnerProductDesc::with_spatial(2, 32, 48, 6, 6).has_spatial());
    }

    #[test]
    fn test_inner_product_rejects_zero_channels() {
        assert!(InnerProductDesc::new(2, 0, 8).validate().is_err());
        assert!(InnerProductDesc::new(2, 4, 0).validate().is_err());
        assert!(InnerProductDesc::new(0, 4, 8).validate().is_err());
    }

    #[test]
    fn test_family() {
        let c: OperationDesc = ConvolutionDesc::new(1, 1, 1, 1, 1).into();
        let ip: OperationDesc = InnerProductDesc::new(1, 1, 1).into();
        assert_eq!(c.family(), OpFamily::Convolution);
        assert_eq!(ip.family(), OpFamily::InnerProduct);
    }
}
