//! Takes a grayscale image. Learns to guess for each pixel the ratio of the
//! brightness of each color channel to the luminosity of the grayscale pixel.

use crate::activation::ScaledSigmoid;
use crate::color;
use crate::error::Result;
use crate::nets::{ColorNet, ColorNetConfig, LayerShape, zero_bias};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, PaddingConfig2d};
use burn::prelude::*;
use burn::tensor::activation::relu;

#[derive(Config, Debug)]
pub struct LuminosityRatioNetConfig {
    pub height: usize,
    pub width: usize,

    /// Kernels of the first, feature discovery, convolution.
    #[config(default = 12)]
    pub conv1_channels: usize,
    #[config(default = 5)]
    pub conv2_channels: usize,

    /// Upper bound of the predicted ratios.
    ///
    /// Typical luminosity scaling factors lie between 0 and 3.
    #[config(default = 3.0)]
    pub max_ratio: f64,
}

/// Stack of same-padded convolutions, so the output keeps the input size.
#[derive(Module, Debug)]
pub struct LuminosityRatioNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub conv2: Conv2d<B>,
    /// Collapses back to one kernel per color channel.
    pub conv3: Conv2d<B>,
    pub output_activation: ScaledSigmoid,
}

fn conv<B: Backend>(channels: [usize; 2], kernel_size: usize, device: &B::Device) -> Conv2d<B> {
    let mut conv = Conv2dConfig::new(channels, [kernel_size, kernel_size])
        .with_padding(PaddingConfig2d::Same)
        .with_initializer(Initializer::XavierUniform { gain: 1. })
        .init(device);
    conv.bias = zero_bias(conv.bias);
    conv
}

impl<B: Backend> ColorNetConfig<B, 4> for LuminosityRatioNetConfig {
    type Net = LuminosityRatioNet<B>;

    fn init(&self, device: &B::Device) -> Result<Self::Net> {
        tracing::info!(
            "building luminosity-ratio net for {}x{} inputs",
            self.height,
            self.width
        );
        Ok(LuminosityRatioNet {
            conv1: conv([1, self.conv1_channels], 5, device),
            conv2: conv([self.conv1_channels, self.conv2_channels], 3, device),
            conv3: conv([self.conv2_channels, 3], 3, device),
            output_activation: ScaledSigmoid::new(self.max_ratio),
        })
    }

    fn layer_shapes(&self) -> Vec<LayerShape> {
        let (h, w) = (self.height, self.width);
        let (c1, c2) = (self.conv1_channels, self.conv2_channels);
        vec![
            LayerShape::new("Input", None, vec![h, w]),
            LayerShape::new("Unsqueeze", Some(vec![h, w]), vec![1, h, w]),
            LayerShape::new("Conv2d", Some(vec![1, h, w]), vec![c1, h, w]),
            LayerShape::new("Conv2d", Some(vec![c1, h, w]), vec![c2, h, w]),
            LayerShape::new("Conv2d", Some(vec![c2, h, w]), vec![3, h, w]),
            LayerShape::new("Permute", Some(vec![3, h, w]), vec![h, w, 3]),
        ]
    }
}

impl<B: Backend> LuminosityRatioNet<B> {
    /// # Shapes
    ///   - Input [batch, height, width]
    ///   - Output [batch, height, width, 3]
    pub fn forward(&self, gray: Tensor<B, 3>) -> Tensor<B, 4> {
        let [batch, height, width] = gray.dims();

        // single-channel images
        let x = gray.unsqueeze_dim::<4>(1);

        let x = relu(self.conv1.forward(x));
        let x = relu(self.conv2.forward(x));
        let x = self.output_activation.forward(self.conv3.forward(x));
        debug_assert_eq!([batch, 3, height, width], x.dims());

        // channel-last, as the color images
        x.permute([0, 2, 3, 1])
    }
}

impl<B: Backend> ColorNet<B, 4> for LuminosityRatioNet<B> {
    fn target(images: Tensor<B, 4>) -> Tensor<B, 4> {
        color::luminosity_ratios(images)
    }

    fn predict(&self, gray: Tensor<B, 3>) -> Tensor<B, 4> {
        self.forward(gray)
    }
}
