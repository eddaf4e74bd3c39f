use burn::module::Module;
use burn::tensor::{DType, Element, Tensor, backend::Backend};

// smallest divisor that keeps f16 divisions away from inf
const F16_DIV_EPS: f32 = 7.121e-4;

/// Mean squared error between a prediction and its target, averaged over every element.
#[derive(Module, Clone, Debug)]
pub struct SquaredErrorLoss;

impl Default for SquaredErrorLoss {
    fn default() -> Self {
        Self::new()
    }
}

impl SquaredErrorLoss {
    /// Create the criterion.
    pub fn new() -> Self {
        Self
    }

    /// Compute the criterion on the prediction tensor.
    ///
    /// # Shapes
    ///
    /// - prediction: `[batch_size, ...]`
    /// - target: `[batch_size, ...]`
    /// - output: `[1]`
    pub fn forward<const D: usize, B: Backend>(
        &self,
        prediction: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        assert_eq!(prediction.dims(), target.dims());
        if matches!(<B::FloatElem as Element>::dtype(), DType::F16) {
            rescaled_mean_square(prediction, target)
        } else {
            self.forward_no_reduction(prediction, target).mean()
        }
    }

    /// Compute the criterion on the prediction tensor without reducing.
    pub fn forward_no_reduction<const D: usize, B: Backend>(
        &self,
        prediction: Tensor<B, D>,
        target: Tensor<B, D>,
    ) -> Tensor<B, D> {
        prediction.sub(target).square()
    }
}

/// Mean of the squared difference, computed without squaring anything larger than the
/// difference itself.
///
/// Raw pixel differences reach 255, whose square overflows f16.
pub fn rescaled_mean_square<const D: usize, B: Backend>(
    prediction: Tensor<B, D>,
    target: Tensor<B, D>,
) -> Tensor<B, 1> {
    let sub = prediction.sub(target);
    let max = sub.clone().no_grad().detach().abs().max();
    let sub_ = sub.clone() / (max.clone().expand(sub.shape()) + F16_DIV_EPS * 2.);
    // sub² = sub * sub_ * max, with |sub_| <= 1
    (sub * sub_).mean() * max
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn averages_over_every_element() {
        let device = Default::default();
        let prediction = Tensor::<TestBackend, 2>::from_floats([[1., 2.], [3., 4.]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[1., 0.], [0., 4.]], &device);

        let loss = SquaredErrorLoss::new()
            .forward(prediction, target)
            .into_scalar();
        // (0 + 4 + 9 + 0) / 4
        assert!((loss - 3.25).abs() < 1e-6);
    }

    #[test]
    fn zero_for_identical_tensors() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::ones([2, 3, 3, 3], &device);
        let loss = SquaredErrorLoss::new().forward(x.clone(), x).into_scalar();
        assert_eq!(loss, 0.);
    }

    #[test]
    fn rescaled_form_matches_the_plain_mean() {
        let device = Default::default();
        let prediction =
            Tensor::<TestBackend, 2>::from_floats([[255., 0., 12.], [3., 200., 0.]], &device);
        let target = Tensor::<TestBackend, 2>::from_floats([[0., 0., 2.], [3., 0., 255.]], &device);
        let loss = SquaredErrorLoss::new();

        let plain = loss
            .forward_no_reduction(prediction.clone(), target.clone())
            .mean()
            .into_scalar();
        let rescaled = rescaled_mean_square(prediction, target).into_scalar();
        // the f16 epsilon shifts the result by about eps / max
        assert!((rescaled - plain).abs() / plain < 1e-4, "{rescaled} vs {plain}");
    }
}
