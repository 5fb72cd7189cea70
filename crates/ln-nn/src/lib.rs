// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Hand-rolled layer engine for the Limnet CNN.
//!
//! Every gradient here is derived and coded by hand: the chain rule through
//! a sliding-window convolution, through the arg-max selection of a pooling
//! window, and through a matrix product. There is no autodiff tape — each
//! layer exposes a `forward` evaluation and a matching `backward` pass that
//! applies plain gradient descent in place and returns the gradient with
//! respect to its input. Sequencing layers, computing losses, and looping
//! over samples and epochs belongs to the training driver, not to this
//! crate.

pub mod activation;
pub mod io;
pub mod layers;
pub mod module;

pub use io::{load_bincode, load_json, save_bincode, save_json};
pub use layers::conv::Conv2d;
pub use layers::dense::Dense;
pub use layers::pool::MaxPool2d;
pub use module::{Layer, Parameter};

pub use ln_tensor::{PureResult, Tensor, TensorError, Volume};
