// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::error::{PureResult, TensorError};
use crate::matrix::Tensor;

/// Dense channel-last volume of `f32` values, indexed `(row, col, channel)`.
///
/// This is the feature-map currency of the convolution and pooling layers.
/// The channel axis is innermost, so the memory layout of an H×W×C volume
/// matches a row-major H×W image with interleaved channels and a k×k×C
/// window aligns element-for-element with a filter row stored in
/// `(kh, kw, ch)` order.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    rows: usize,
    cols: usize,
    channels: usize,
    data: Vec<f32>,
}

impl Volume {
    /// Create a volume filled with zeros.
    pub fn zeros(rows: usize, cols: usize, channels: usize) -> PureResult<Self> {
        if rows == 0 || cols == 0 || channels == 0 {
            return Err(TensorError::InvalidVolumeDimensions {
                rows,
                cols,
                channels,
            });
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data: vec![0.0; rows * cols * channels],
        })
    }

    /// Create a volume from raw channel-last data. The provided vector must
    /// match `rows * cols * channels` elements.
    pub fn from_vec(
        rows: usize,
        cols: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> PureResult<Self> {
        if rows == 0 || cols == 0 || channels == 0 {
            return Err(TensorError::InvalidVolumeDimensions {
                rows,
                cols,
                channels,
            });
        }
        let expected = rows * cols * channels;
        if expected != data.len() {
            return Err(TensorError::DataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data,
        })
    }

    /// Construct a volume by applying a generator function to each coordinate.
    pub fn from_fn<F>(rows: usize, cols: usize, channels: usize, mut f: F) -> PureResult<Self>
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        if rows == 0 || cols == 0 || channels == 0 {
            return Err(TensorError::InvalidVolumeDimensions {
                rows,
                cols,
                channels,
            });
        }
        let mut data = Vec::with_capacity(rows * cols * channels);
        for r in 0..rows {
            for c in 0..cols {
                for ch in 0..channels {
                    data.push(f(r, c, ch));
                }
            }
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data,
        })
    }

    /// Returns the `(rows, cols, channels)` triple of the volume.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rows, self.cols, self.channels)
    }

    /// Total number of elements stored in the volume.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the volume stores no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat offset of the `(row, col, channel)` coordinate.
    #[inline]
    pub fn offset(&self, row: usize, col: usize, channel: usize) -> usize {
        debug_assert!(row < self.rows && col < self.cols && channel < self.channels);
        (row * self.cols + col) * self.channels + channel
    }

    /// Value stored at the `(row, col, channel)` coordinate.
    #[inline]
    pub fn at(&self, row: usize, col: usize, channel: usize) -> f32 {
        self.data[self.offset(row, col, channel)]
    }

    /// Mutable reference to the `(row, col, channel)` coordinate.
    #[inline]
    pub fn at_mut(&mut self, row: usize, col: usize, channel: usize) -> &mut f32 {
        let index = self.offset(row, col, channel);
        &mut self.data[index]
    }

    /// Immutable view over the channel-last backing buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view over the channel-last backing buffer.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Applies an elementwise function and returns the transformed volume.
    pub fn map<F>(&self, f: F) -> Volume
    where
        F: Fn(f32) -> f32,
    {
        Volume {
            rows: self.rows,
            cols: self.cols,
            channels: self.channels,
            data: self.data.iter().map(|&value| f(value)).collect(),
        }
    }

    /// Elementwise product with another volume of the same shape, used by
    /// training drivers to mask gradients with activation derivatives.
    pub fn hadamard(&self, other: &Volume) -> PureResult<Volume> {
        if self.shape() != other.shape() {
            return Err(TensorError::VolumeShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| a * b)
            .collect();
        Ok(Volume {
            rows: self.rows,
            cols: self.cols,
            channels: self.channels,
            data,
        })
    }

    /// Reinterprets the volume as a single row vector, row-major with the
    /// channel axis innermost.
    pub fn flatten(&self) -> PureResult<Tensor> {
        Tensor::from_vec(1, self.data.len(), self.data.clone())
    }

    /// Rebuilds a volume of the given shape from a flattened row vector, the
    /// inverse of [`Volume::flatten`].
    pub fn from_flat(shape: (usize, usize, usize), flat: &Tensor) -> PureResult<Self> {
        let (rows, cols, channels) = shape;
        Volume::from_vec(rows, cols, channels, flat.data().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_rejects_empty_axes() {
        assert!(matches!(
            Volume::zeros(2, 2, 0),
            Err(TensorError::InvalidVolumeDimensions {
                rows: 2,
                cols: 2,
                channels: 0
            })
        ));
    }

    #[test]
    fn offset_is_channel_last() {
        let volume = Volume::from_fn(2, 3, 2, |r, c, ch| (r * 100 + c * 10 + ch) as f32).unwrap();
        assert_eq!(volume.at(0, 0, 0), 0.0);
        assert_eq!(volume.at(0, 0, 1), 1.0);
        assert_eq!(volume.at(0, 1, 0), 10.0);
        assert_eq!(volume.at(1, 2, 1), 121.0);
        assert_eq!(volume.offset(1, 0, 0), 6);
    }

    #[test]
    fn flatten_round_trips() {
        let volume = Volume::from_fn(2, 2, 3, |r, c, ch| (r + c + ch) as f32).unwrap();
        let flat = volume.flatten().unwrap();
        assert_eq!(flat.shape(), (1, 12));
        let rebuilt = Volume::from_flat(volume.shape(), &flat).unwrap();
        assert_eq!(rebuilt, volume);
    }

    #[test]
    fn from_flat_checks_length() {
        let flat = Tensor::zeros(1, 5).unwrap();
        let err = Volume::from_flat((2, 2, 2), &flat).unwrap_err();
        assert_eq!(
            err,
            TensorError::DataLength {
                expected: 8,
                got: 5
            }
        );
    }

    #[test]
    fn map_applies_elementwise() {
        let volume = Volume::from_vec(1, 2, 1, vec![-1.0, 2.0]).unwrap();
        let doubled = volume.map(|value| value * 2.0);
        assert_eq!(doubled.data(), &[-2.0, 4.0]);
    }
}
