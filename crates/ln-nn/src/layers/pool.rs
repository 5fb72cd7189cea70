// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::layers::validate_positive;
use crate::module::{Layer, Parameter};
use crate::{PureResult, TensorError, Volume};

/// Max pooling over non-overlapping square windows, per channel.
///
/// Spatial dimensions that do not divide evenly by the pool size are
/// silently truncated: output size is `input ⌊/⌋ pool_size` and the
/// trailing rows/columns outside the covered region are dropped, not
/// zero-padded. That truncation is defined behaviour, not an error, and
/// the backward pass leaves the dropped region at gradient zero.
#[derive(Debug)]
pub struct MaxPool2d {
    pool_size: usize,
}

impl MaxPool2d {
    /// Creates a pooling layer with the given window size.
    pub fn new(pool_size: usize) -> PureResult<Self> {
        validate_positive(pool_size, "pool_size")?;
        Ok(Self { pool_size })
    }

    /// Window size of the layer.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn output_hw(&self, rows: usize, cols: usize) -> PureResult<(usize, usize)> {
        if rows < self.pool_size || cols < self.pool_size {
            return Err(TensorError::InvalidDimensions {
                rows: rows.min(cols),
                cols: self.pool_size,
            });
        }
        Ok((rows / self.pool_size, cols / self.pool_size))
    }

    fn window_max(&self, input: &Volume, i: usize, j: usize, channel: usize) -> f32 {
        let p = self.pool_size;
        let mut best = f32::MIN;
        for x in 0..p {
            for y in 0..p {
                let value = input.at(i * p + x, j * p + y, channel);
                if value > best {
                    best = value;
                }
            }
        }
        best
    }
}

impl Layer for MaxPool2d {
    type Input = Volume;
    type Output = Volume;

    fn forward(&self, input: &Volume) -> PureResult<Volume> {
        let (rows, cols, channels) = input.shape();
        let (out_rows, out_cols) = self.output_hw(rows, cols)?;
        let mut out = Volume::zeros(out_rows, out_cols, channels)?;
        for i in 0..out_rows {
            for j in 0..out_cols {
                for ch in 0..channels {
                    *out.at_mut(i, j, ch) = self.window_max(input, i, j, ch);
                }
            }
        }
        Ok(out)
    }

    fn backward(
        &mut self,
        input: &Volume,
        grad_output: &Volume,
        _learning_rate: f32,
    ) -> PureResult<Volume> {
        let (rows, cols, channels) = input.shape();
        let (out_rows, out_cols) = self.output_hw(rows, cols)?;
        if grad_output.shape() != (out_rows, out_cols, channels) {
            return Err(TensorError::VolumeShapeMismatch {
                left: grad_output.shape(),
                right: (out_rows, out_cols, channels),
            });
        }
        let p = self.pool_size;
        let mut grad_input = Volume::zeros(rows, cols, channels)?;
        for i in 0..out_rows {
            for j in 0..out_cols {
                for ch in 0..channels {
                    let max_value = self.window_max(input, i, j, ch);
                    let go = grad_output.at(i, j, ch);
                    // Every cell that achieved the maximum receives the full
                    // upstream gradient. Ties are NOT split and not routed
                    // first-match-only, so the routed mass can exceed the
                    // upstream mass when a window holds duplicates.
                    for x in 0..p {
                        for y in 0..p {
                            if input.at(i * p + x, j * p + y, ch) == max_value {
                                *grad_input.at_mut(i * p + x, j * p + y, ch) += go;
                            }
                        }
                    }
                }
            }
        }
        Ok(grad_input)
    }

    fn visit_parameters(
        &self,
        _visitor: &mut dyn FnMut(&Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        Ok(())
    }

    fn visit_parameters_mut(
        &mut self,
        _visitor: &mut dyn FnMut(&mut Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        Ok(())
    }
}
