// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Stateless elementwise activations and their hand-written derivatives.
//!
//! The training driver applies these between layers via
//! [`Volume::map`](ln_tensor::Volume::map) or
//! [`Tensor::map`](ln_tensor::Tensor::map), e.g.
//! `conv_out.map(activation::relu)`.

/// `max(0, x)`.
#[inline]
pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// Derivative of [`relu`]; defined as 0 at exactly 0.
#[inline]
pub fn relu_derivative(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// `1 / (1 + e^-x)`.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of [`sigmoid`], `sigmoid(x) * (1 - sigmoid(x))`.
#[inline]
pub fn sigmoid_derivative(x: f32) -> f32 {
    let s = sigmoid(x);
    s * (1.0 - s)
}
