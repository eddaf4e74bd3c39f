use burn::prelude::*;
use burn::tensor::activation::{sigmoid, tanh};

// beta * sigmoid(x), outputs in (0, beta)
#[derive(Module, Clone, Debug)]
pub struct ScaledSigmoid {
    pub beta: f64,
}

impl ScaledSigmoid {
    /// Create the module.
    pub fn new(beta: f64) -> Self {
        Self { beta }
    }
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        sigmoid(input) * self.beta
    }
}

// beta * tanh(x), outputs in (-beta, beta)
#[derive(Module, Clone, Debug)]
pub struct ScaledTanh {
    pub beta: f64,
}

impl ScaledTanh {
    /// Create the module.
    pub fn new(beta: f64) -> Self {
        Self { beta }
    }
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        tanh(input) * self.beta
    }
}
