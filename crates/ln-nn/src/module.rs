// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::{PureResult, Tensor, TensorError};
use std::collections::HashMap;

/// Trainable parameter: a named tensor mutated in place by gradient steps.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    value: Tensor,
}

impl Parameter {
    /// Creates a new parameter with the provided tensor value.
    pub fn new(name: impl Into<String>, value: Tensor) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Returns the identifier assigned to the parameter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provides an immutable view into the underlying tensor value.
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// Provides a mutable view into the underlying tensor value.
    pub fn value_mut(&mut self) -> &mut Tensor {
        &mut self.value
    }

    fn assert_shape(&self, tensor: &Tensor) -> PureResult<()> {
        if self.value.shape() != tensor.shape() {
            return Err(TensorError::ShapeMismatch {
                left: self.value.shape(),
                right: tensor.shape(),
            });
        }
        Ok(())
    }

    /// Applies one plain gradient-descent step, `value -= learning_rate * gradient`.
    pub fn apply_gradient(&mut self, gradient: &Tensor, learning_rate: f32) -> PureResult<()> {
        self.assert_shape(gradient)?;
        self.value.add_scaled(gradient, -learning_rate)
    }

    /// Replaces the parameter value with the provided tensor.
    pub fn load_value(&mut self, value: &Tensor) -> PureResult<()> {
        self.assert_shape(value)?;
        self.value = value.clone();
        Ok(())
    }
}

/// Stateful layer with a forward evaluation and a hand-derived backward pass.
///
/// `backward` receives the exact input that was passed to the matching
/// `forward` call. Threading the input explicitly instead of caching it
/// inside the layer keeps forward `&self` and removes any
/// one-backward-per-forward bookkeeping hazard. Implementations update
/// their parameters in place with plain gradient descent and return the
/// gradient with respect to `input`; stateless layers ignore
/// `learning_rate`.
pub trait Layer {
    type Input;
    type Output;

    /// Runs a forward pass.
    fn forward(&self, input: &Self::Input) -> PureResult<Self::Output>;

    /// Propagates a gradient backwards, stepping every parameter by
    /// `learning_rate` along its negative gradient before returning the
    /// gradient with respect to `input`.
    fn backward(
        &mut self,
        input: &Self::Input,
        grad_output: &Self::Output,
        learning_rate: f32,
    ) -> PureResult<Self::Input>;

    /// Visits immutable parameters.
    fn visit_parameters(
        &self,
        visitor: &mut dyn FnMut(&Parameter) -> PureResult<()>,
    ) -> PureResult<()>;

    /// Visits mutable parameters.
    fn visit_parameters_mut(
        &mut self,
        visitor: &mut dyn FnMut(&mut Parameter) -> PureResult<()>,
    ) -> PureResult<()>;

    /// Captures a copy of every parameter tensor keyed by its canonical name.
    fn state_dict(&self) -> PureResult<HashMap<String, Tensor>> {
        let mut state = HashMap::new();
        self.visit_parameters(&mut |param| {
            state.insert(param.name().to_string(), param.value().clone());
            Ok(())
        })?;
        Ok(state)
    }

    /// Restores parameters from a state dictionary produced by [`Layer::state_dict`].
    fn load_state_dict(&mut self, state: &HashMap<String, Tensor>) -> PureResult<()> {
        self.visit_parameters_mut(&mut |param| {
            let Some(value) = state.get(param.name()) else {
                return Err(TensorError::MissingParameter {
                    name: param.name().to_string(),
                });
            };
            param.load_value(value)
        })
    }
}
