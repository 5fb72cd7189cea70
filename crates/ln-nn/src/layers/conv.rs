// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::layers::validate_positive;
use crate::module::{Layer, Parameter};
use crate::{PureResult, Tensor, TensorError, Volume};

/// Valid 2D convolution (no padding, stride 1) over channel-last volumes.
///
/// The filter bank is stored as a single `(num_filters, k·k·in_channels)`
/// tensor whose rows follow the same `(kh, kw, ch)` order as a volume
/// window, so forward correlation reduces to a dot product between a
/// window and a filter row.
#[derive(Debug)]
pub struct Conv2d {
    filters: Parameter,
    num_filters: usize,
    filter_size: usize,
    in_channels: usize,
}

impl Conv2d {
    /// Creates a new convolution layer with `num_filters` square filters of
    /// spatial size `filter_size` over `in_channels` input channels.
    ///
    /// Filters start as small-scale normal noise (σ = 0.1) so early outputs
    /// stay away from activation saturation; pass a `seed` for reproducible
    /// initialisation.
    pub fn new(
        name: impl Into<String>,
        num_filters: usize,
        filter_size: usize,
        in_channels: usize,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        validate_positive(num_filters, "num_filters")?;
        validate_positive(filter_size, "filter_size")?;
        validate_positive(in_channels, "in_channels")?;
        let name = name.into();
        let span = filter_size * filter_size * in_channels;
        let filters = Tensor::random_normal(num_filters, span, 0.0, 0.1, seed)?;
        Ok(Self {
            filters: Parameter::new(format!("{name}::filters"), filters),
            num_filters,
            filter_size,
            in_channels,
        })
    }

    /// Returns the filter bank parameter.
    pub fn filters(&self) -> &Parameter {
        &self.filters
    }

    /// Number of filters in the bank.
    pub fn num_filters(&self) -> usize {
        self.num_filters
    }

    /// Spatial size of every filter.
    pub fn filter_size(&self) -> usize {
        self.filter_size
    }

    fn filter_span(&self) -> usize {
        self.filter_size * self.filter_size * self.in_channels
    }

    fn check_channels(&self, input: &Volume) -> PureResult<()> {
        let (rows, cols, channels) = input.shape();
        if channels != self.in_channels {
            return Err(TensorError::VolumeShapeMismatch {
                left: (rows, cols, channels),
                right: (rows, cols, self.in_channels),
            });
        }
        Ok(())
    }

    fn output_hw(&self, rows: usize, cols: usize) -> PureResult<(usize, usize)> {
        if rows < self.filter_size || cols < self.filter_size {
            return Err(TensorError::InvalidDimensions {
                rows: rows.min(cols),
                cols: self.filter_size,
            });
        }
        Ok((rows - self.filter_size + 1, cols - self.filter_size + 1))
    }
}

impl Layer for Conv2d {
    type Input = Volume;
    type Output = Volume;

    fn forward(&self, input: &Volume) -> PureResult<Volume> {
        self.check_channels(input)?;
        let (rows, cols, _) = input.shape();
        let (out_rows, out_cols) = self.output_hw(rows, cols)?;
        let span = self.filter_span();
        let k = self.filter_size;
        let mut out = Volume::zeros(out_rows, out_cols, self.num_filters)?;
        let filters = self.filters.value();
        let filter_data = filters.data();
        {
            let out_data = out.data_mut();
            for i in 0..out_rows {
                for j in 0..out_cols {
                    for f in 0..self.num_filters {
                        let filter_row = &filter_data[f * span..(f + 1) * span];
                        let mut acc = 0.0f32;
                        let mut idx = 0;
                        for kh in 0..k {
                            for kw in 0..k {
                                for ch in 0..self.in_channels {
                                    acc += input.at(i + kh, j + kw, ch) * filter_row[idx];
                                    idx += 1;
                                }
                            }
                        }
                        out_data[(i * out_cols + j) * self.num_filters + f] = acc;
                    }
                }
            }
        }
        Ok(out)
    }

    fn backward(
        &mut self,
        input: &Volume,
        grad_output: &Volume,
        learning_rate: f32,
    ) -> PureResult<Volume> {
        self.check_channels(input)?;
        let (rows, cols, channels) = input.shape();
        let (out_rows, out_cols) = self.output_hw(rows, cols)?;
        if grad_output.shape() != (out_rows, out_cols, self.num_filters) {
            return Err(TensorError::VolumeShapeMismatch {
                left: grad_output.shape(),
                right: (out_rows, out_cols, self.num_filters),
            });
        }
        let span = self.filter_span();
        let k = self.filter_size;
        let mut grad_filters = Tensor::zeros(self.num_filters, span)?;
        let mut grad_input = Volume::zeros(rows, cols, channels)?;
        {
            let filters = self.filters.value();
            let filter_data = filters.data();
            let grad_filter_data = grad_filters.data_mut();
            for i in 0..out_rows {
                for j in 0..out_cols {
                    for f in 0..self.num_filters {
                        let go = grad_output.at(i, j, f);
                        if go == 0.0 {
                            continue;
                        }
                        let filter_row = &filter_data[f * span..(f + 1) * span];
                        let mut idx = 0;
                        for kh in 0..k {
                            for kw in 0..k {
                                for ch in 0..self.in_channels {
                                    grad_filter_data[f * span + idx] +=
                                        go * input.at(i + kh, j + kw, ch);
                                    *grad_input.at_mut(i + kh, j + kw, ch) +=
                                        go * filter_row[idx];
                                    idx += 1;
                                }
                            }
                        }
                    }
                }
            }
        }
        self.filters.apply_gradient(&grad_filters, learning_rate)?;
        Ok(grad_input)
    }

    fn visit_parameters(
        &self,
        visitor: &mut dyn FnMut(&Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&self.filters)
    }

    fn visit_parameters_mut(
        &mut self,
        visitor: &mut dyn FnMut(&mut Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&mut self.filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_conv(num_filters: usize, filter_size: usize, in_channels: usize, w: f32) -> Conv2d {
        let mut conv = Conv2d::new("conv", num_filters, filter_size, in_channels, Some(1)).unwrap();
        for value in conv.filters.value_mut().data_mut() {
            *value = w;
        }
        conv
    }

    #[test]
    fn forward_output_shape_shrinks_by_filter_size() {
        let conv = Conv2d::new("conv", 8, 3, 3, Some(42)).unwrap();
        let input = Volume::zeros(28, 28, 3).unwrap();
        let out = conv.forward(&input).unwrap();
        assert_eq!(out.shape(), (26, 26, 8));
    }

    #[test]
    fn forward_constant_input_and_filter_matches_closed_form() {
        // Every output element is v * w * k * k * C.
        let conv = constant_conv(2, 3, 3, 0.5);
        let input = Volume::from_fn(5, 5, 3, |_, _, _| 2.0).unwrap();
        let out = conv.forward(&input).unwrap();
        assert_eq!(out.shape(), (3, 3, 2));
        let expected = 2.0 * 0.5 * 3.0 * 3.0 * 3.0;
        for &value in out.data() {
            assert!((value - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn forward_rejects_channel_mismatch() {
        let conv = Conv2d::new("conv", 2, 3, 3, Some(0)).unwrap();
        let input = Volume::zeros(5, 5, 4).unwrap();
        assert!(matches!(
            conv.forward(&input),
            Err(TensorError::VolumeShapeMismatch { .. })
        ));
    }

    #[test]
    fn forward_rejects_oversized_filter() {
        let conv = Conv2d::new("conv", 2, 6, 1, Some(0)).unwrap();
        let input = Volume::zeros(5, 5, 1).unwrap();
        assert!(matches!(
            conv.forward(&input),
            Err(TensorError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn new_rejects_zero_configuration() {
        assert!(Conv2d::new("conv", 0, 3, 3, None).is_err());
        assert!(Conv2d::new("conv", 2, 0, 3, None).is_err());
        assert!(Conv2d::new("conv", 2, 3, 0, None).is_err());
    }

    #[test]
    fn backward_filter_gradient_matches_manual() {
        // Single 1x1 filter over a single channel: dL/dw = sum(go * input).
        let mut conv = constant_conv(1, 1, 1, 0.0);
        let input = Volume::from_vec(2, 2, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let grad_output = Volume::from_vec(2, 2, 1, vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        conv.backward(&input, &grad_output, 0.1).unwrap();
        // filter was 0, gradient is 10, update is -0.1 * 10.
        assert!((conv.filters.value().data()[0] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn backward_routes_input_gradient_through_filters() {
        let mut conv = constant_conv(1, 2, 1, 1.0);
        let input = Volume::from_vec(3, 3, 1, vec![0.0; 9]).unwrap();
        let mut grad_output = Volume::zeros(2, 2, 1).unwrap();
        *grad_output.at_mut(0, 0, 0) = 1.0;
        let grad_input = conv.backward(&input, &grad_output, 0.0).unwrap();
        // The single upstream unit spreads over its 2x2 window, nowhere else.
        assert_eq!(grad_input.shape(), (3, 3, 1));
        assert_eq!(
            grad_input.data(),
            &[1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn backward_rejects_gradient_shape_mismatch() {
        let mut conv = Conv2d::new("conv", 2, 3, 1, Some(3)).unwrap();
        let input = Volume::zeros(5, 5, 1).unwrap();
        let bad_grad = Volume::zeros(3, 3, 1).unwrap();
        assert!(matches!(
            conv.backward(&input, &bad_grad, 0.1),
            Err(TensorError::VolumeShapeMismatch { .. })
        ));
    }

    #[test]
    fn zero_upstream_gradient_leaves_filters_unchanged() {
        let mut conv = Conv2d::new("conv", 3, 3, 3, Some(9)).unwrap();
        let before = conv.filters.value().clone();
        let input = Volume::from_fn(6, 6, 3, |r, c, ch| (r + 2 * c + ch) as f32).unwrap();
        let zero_grad = Volume::zeros(4, 4, 3).unwrap();
        conv.backward(&input, &zero_grad, 0.5).unwrap();
        assert_eq!(conv.filters.value(), &before);
    }

    #[test]
    fn seeded_construction_is_reproducible() {
        let a = Conv2d::new("conv", 4, 3, 3, Some(11)).unwrap();
        let b = Conv2d::new("conv", 4, 3, 3, Some(11)).unwrap();
        assert_eq!(a.filters.value(), b.filters.value());
    }
}
