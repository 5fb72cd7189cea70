// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of Limnet — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use crate::module::{Layer, Parameter};
use crate::{PureResult, Tensor, TensorError, Volume};

/// Fully-connected layer: flattens its input volume and applies an affine
/// transform, `flatten(input) · W + b`.
#[derive(Debug)]
pub struct Dense {
    weight: Parameter,
    bias: Parameter,
}

impl Dense {
    /// Creates a new dense layer mapping `input_dim` flattened elements to
    /// `output_dim` outputs. Weights start as small-scale normal noise
    /// (σ = 0.1), the bias starts at zero; pass a `seed` for reproducible
    /// initialisation.
    pub fn new(
        name: impl Into<String>,
        input_dim: usize,
        output_dim: usize,
        seed: Option<u64>,
    ) -> PureResult<Self> {
        if input_dim == 0 || output_dim == 0 {
            return Err(TensorError::InvalidDimensions {
                rows: input_dim,
                cols: output_dim,
            });
        }
        let name = name.into();
        let weight = Tensor::random_normal(input_dim, output_dim, 0.0, 0.1, seed)?;
        let bias = Tensor::zeros(1, output_dim)?;
        Ok(Self {
            weight: Parameter::new(format!("{name}::weight"), weight),
            bias: Parameter::new(format!("{name}::bias"), bias),
        })
    }

    /// Returns the weight parameter.
    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    /// Returns the bias parameter.
    pub fn bias(&self) -> &Parameter {
        &self.bias
    }

    fn flatten_checked(&self, input: &Volume) -> PureResult<Tensor> {
        let flat = input.flatten()?;
        if flat.shape().1 != self.weight.value().shape().0 {
            return Err(TensorError::ShapeMismatch {
                left: flat.shape(),
                right: self.weight.value().shape(),
            });
        }
        Ok(flat)
    }
}

impl Layer for Dense {
    type Input = Volume;
    type Output = Tensor;

    fn forward(&self, input: &Volume) -> PureResult<Tensor> {
        let flat = self.flatten_checked(input)?;
        let mut out = flat.matmul(self.weight.value())?;
        out.add_row_inplace(self.bias.value().data())?;
        Ok(out)
    }

    fn backward(
        &mut self,
        input: &Volume,
        grad_output: &Tensor,
        learning_rate: f32,
    ) -> PureResult<Volume> {
        let flat = self.flatten_checked(input)?;
        if grad_output.shape() != (1, self.weight.value().shape().1) {
            return Err(TensorError::ShapeMismatch {
                left: grad_output.shape(),
                right: (1, self.weight.value().shape().1),
            });
        }
        let grad_weight = flat.transpose().matmul(grad_output)?;
        let grad_bias = grad_output.clone();
        // Input gradient uses the pre-update weights.
        let grad_flat = grad_output.matmul(&self.weight.value().transpose())?;
        self.weight.apply_gradient(&grad_weight, learning_rate)?;
        self.bias.apply_gradient(&grad_bias, learning_rate)?;
        Volume::from_flat(input.shape(), &grad_flat)
    }

    fn visit_parameters(
        &self,
        visitor: &mut dyn FnMut(&Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&self.weight)?;
        visitor(&self.bias)?;
        Ok(())
    }

    fn visit_parameters_mut(
        &mut self,
        visitor: &mut dyn FnMut(&mut Parameter) -> PureResult<()>,
    ) -> PureResult<()> {
        visitor(&mut self.weight)?;
        visitor(&mut self.bias)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_dense(dim: usize) -> Dense {
        let mut dense = Dense::new("fc", dim, dim, Some(0)).unwrap();
        let eye = Tensor::from_fn(dim, dim, |r, c| if r == c { 1.0 } else { 0.0 }).unwrap();
        dense.weight.load_value(&eye).unwrap();
        dense
    }

    #[test]
    fn forward_identity_weights_pass_input_through() {
        let dense = identity_dense(2);
        let input = Volume::from_vec(1, 2, 1, vec![1.0, 2.0]).unwrap();
        let out = dense.forward(&input).unwrap();
        assert_eq!(out.shape(), (1, 2));
        assert_eq!(out.data(), &[1.0, 2.0]);
    }

    #[test]
    fn forward_applies_bias_row() {
        let mut dense = identity_dense(2);
        dense
            .bias
            .load_value(&Tensor::from_vec(1, 2, vec![10.0, -10.0]).unwrap())
            .unwrap();
        let input = Volume::from_vec(2, 1, 1, vec![1.0, 2.0]).unwrap();
        let out = dense.forward(&input).unwrap();
        assert_eq!(out.data(), &[11.0, -8.0]);
    }

    #[test]
    fn forward_rejects_flatten_length_mismatch() {
        let dense = Dense::new("fc", 4, 2, Some(0)).unwrap();
        let input = Volume::zeros(3, 1, 1).unwrap();
        assert!(matches!(
            dense.forward(&input),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn backward_updates_weights_exactly() {
        let mut dense = identity_dense(2);
        let old = dense.weight.value().clone();
        let input = Volume::from_vec(1, 2, 1, vec![1.0, 2.0]).unwrap();
        let grad_output = Tensor::from_vec(1, 2, vec![0.5, -1.0]).unwrap();
        let learning_rate = 0.1;
        dense.backward(&input, &grad_output, learning_rate).unwrap();
        // new = old - lr * (flat^T · dL_dout)
        let flat = input.flatten().unwrap();
        let expected_step = flat.transpose().matmul(&grad_output).unwrap();
        let mut expected = old;
        expected
            .add_scaled(&expected_step, -learning_rate)
            .unwrap();
        assert_eq!(dense.weight.value(), &expected);
        assert_eq!(dense.bias.value().data(), &[-0.05, 0.1]);
    }

    #[test]
    fn backward_returns_input_gradient_in_input_shape() {
        let mut dense = identity_dense(4);
        let input = Volume::from_fn(2, 2, 1, |r, c, _| (r * 2 + c) as f32).unwrap();
        let grad_output = Tensor::from_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let grad_input = dense.backward(&input, &grad_output, 0.0).unwrap();
        // Identity weights: dInput = dL_dout, reshaped row-major.
        assert_eq!(grad_input.shape(), (2, 2, 1));
        assert_eq!(grad_input.data(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn backward_input_gradient_uses_pre_update_weights() {
        let mut dense = identity_dense(1);
        let input = Volume::from_vec(1, 1, 1, vec![2.0]).unwrap();
        let grad_output = Tensor::from_vec(1, 1, vec![1.0]).unwrap();
        let grad_input = dense.backward(&input, &grad_output, 0.5).unwrap();
        // dInput = go * w_old = 1.0, while w becomes 1 - 0.5 * 2 = 0.
        assert_eq!(grad_input.data(), &[1.0]);
        assert_eq!(dense.weight.value().data(), &[0.0]);
    }

    #[test]
    fn zero_upstream_gradient_leaves_parameters_unchanged() {
        let mut dense = Dense::new("fc", 6, 3, Some(21)).unwrap();
        let weight_before = dense.weight.value().clone();
        let bias_before = dense.bias.value().clone();
        let input = Volume::from_fn(2, 3, 1, |r, c, _| (r + c) as f32).unwrap();
        let zero_grad = Tensor::zeros(1, 3).unwrap();
        dense.backward(&input, &zero_grad, 0.7).unwrap();
        assert_eq!(dense.weight.value(), &weight_before);
        assert_eq!(dense.bias.value(), &bias_before);
    }

    #[test]
    fn seeded_construction_is_reproducible() {
        let a = Dense::new("fc", 8, 2, Some(5)).unwrap();
        let b = Dense::new("fc", 8, 2, Some(5)).unwrap();
        assert_eq!(a.weight.value(), b.weight.value());
    }
}
