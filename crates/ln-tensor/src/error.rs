// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use thiserror::Error;

/// Result alias used throughout the Limnet crates.
pub type PureResult<T> = Result<T, TensorError>;

/// Errors emitted by tensor constructors, operators, and the layer engine.
///
/// Every shape contract fails fast here before any numeric work happens;
/// none of these conditions is recoverable by retrying.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TensorError {
    /// A matrix constructor or configuration received a zero or oversized axis.
    #[error("invalid tensor dimensions ({rows} x {cols}); both axes must be non-zero and windows must fit the input")]
    InvalidDimensions { rows: usize, cols: usize },
    /// A volume constructor received a zero axis.
    #[error("invalid volume dimensions ({rows} x {cols} x {channels}); all axes must be non-zero")]
    InvalidVolumeDimensions {
        rows: usize,
        cols: usize,
        channels: usize,
    },
    /// Data provided to a constructor does not match the declared shape.
    #[error("data length mismatch: expected {expected}, got {got}")]
    DataLength { expected: usize, got: usize },
    /// An operator was asked to combine matrices of incompatible shapes.
    #[error("shape mismatch: left={left:?}, right={right:?} cannot be combined")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    /// An operator was asked to combine volumes of incompatible shapes.
    #[error("volume shape mismatch: left={left:?}, right={right:?} cannot be combined")]
    VolumeShapeMismatch {
        left: (usize, usize, usize),
        right: (usize, usize, usize),
    },
    /// Generic configuration violation for scalar arguments.
    #[error("invalid value: {label}")]
    InvalidValue { label: &'static str },
    /// Attempted to load a parameter that was missing from the state dict.
    #[error("missing parameter '{name}' while loading layer state")]
    MissingParameter { name: String },
    /// Wrapper around I/O failures when persisting or restoring tensors.
    #[error("i/o error while handling tensor data: {message}")]
    Io { message: String },
    /// Wrapper around serde failures when persisting or restoring tensors.
    #[error("serialization error while handling tensor data: {message}")]
    Serialization { message: String },
}
