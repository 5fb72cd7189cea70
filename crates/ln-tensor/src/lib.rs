// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Pure Rust storage primitives for the Limnet layer engine.
//!
//! The goal of this crate is to offer exactly the dense containers the
//! hand-rolled layers need — a row-major matrix for fully-connected weights
//! and a channel-last volume for feature maps — **without relying on NumPy,
//! PyTorch, or any other native bindings**. Everything here is safe Rust so
//! the stack stays auditable down to the last index computation.

mod error;
mod matrix;
mod volume;

pub use error::{PureResult, TensorError};
pub use matrix::Tensor;
pub use volume::Volume;
