//! Takes a grayscale image. Learns to reconstruct the mean and standard
//! deviation of the color histogram for each color channel in the original
//! source image.

use crate::activation::ScaledTanh;
use crate::color::{self, COLOR_STATS_LEN};
use crate::error::{Error, Result};
use crate::nets::{ColorNet, ColorNetConfig, LayerShape, zero_bias};
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::leaky_relu;

/// Smallest height and width for which both pools still leave one pixel.
pub const MIN_INPUT_SIZE: usize = 12;

const CONV1_KERNEL: usize = 5;
const CONV2_KERNEL: usize = 3;
const POOL: usize = 2;

#[derive(Config, Debug)]
pub struct ColorStatsNetConfig {
    pub height: usize,
    pub width: usize,

    #[config(default = 12)]
    pub conv1_channels: usize,
    #[config(default = 5)]
    pub conv2_channels: usize,
    #[config(default = 100)]
    pub hidden_size: usize,

    #[config(default = 0.01)]
    pub negative_slope: f64,

    /// Upper bound of the absolute predicted (normalized) stats.
    #[config(default = 3.0)]
    pub max_stat: f64,
}

/// Valid convolutions and max pooling, followed by a fully connected hidden layer.
#[derive(Module, Debug)]
pub struct ColorStatsNet<B: Backend> {
    pub conv1: Conv2d<B>,
    pub pool1: MaxPool2d,
    pub conv2: Conv2d<B>,
    pub pool2: MaxPool2d,
    pub hidden: Linear<B>,
    /// One value per color stat.
    pub output: Linear<B>,
    pub output_activation: ScaledTanh,
    pub negative_slope: f64,
}

// spatial size after conv1 -> pool1 -> conv2 -> pool2, per stage
fn stage_sizes(size: usize) -> Option<[usize; 4]> {
    let conv1 = size.checked_sub(CONV1_KERNEL - 1)?;
    let pool1 = conv1 / POOL;
    let conv2 = pool1.checked_sub(CONV2_KERNEL - 1)?;
    let pool2 = conv2 / POOL;
    (pool2 > 0).then_some([conv1, pool1, conv2, pool2])
}

impl ColorStatsNetConfig {
    fn stages(&self) -> Result<([usize; 4], [usize; 4])> {
        match (stage_sizes(self.height), stage_sizes(self.width)) {
            (Some(h), Some(w)) => Ok((h, w)),
            _ => Err(Error::InputTooSmall {
                height: self.height,
                width: self.width,
                min: MIN_INPUT_SIZE,
            }),
        }
    }
}

fn xavier() -> Initializer {
    Initializer::XavierUniform { gain: 1. }
}

fn conv<B: Backend>(channels: [usize; 2], kernel_size: usize, device: &B::Device) -> Conv2d<B> {
    let mut conv = Conv2dConfig::new(channels, [kernel_size, kernel_size])
        .with_initializer(xavier())
        .init(device);
    conv.bias = zero_bias(conv.bias);
    conv
}

fn linear<B: Backend>(d_input: usize, d_output: usize, device: &B::Device) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output)
        .with_initializer(xavier())
        .init(device);
    linear.bias = zero_bias(linear.bias);
    linear
}

fn pool() -> MaxPool2dConfig {
    MaxPool2dConfig::new([POOL, POOL]).with_strides([POOL, POOL])
}

impl<B: Backend> ColorNetConfig<B, 2> for ColorStatsNetConfig {
    type Net = ColorStatsNet<B>;

    fn init(&self, device: &B::Device) -> Result<Self::Net> {
        let ([.., h], [.., w]) = self.stages()?;
        let flat_size = self.conv2_channels * h * w;
        tracing::info!(
            "building color-stats net for {}x{} inputs ({flat_size} hidden inputs)",
            self.height,
            self.width
        );

        Ok(ColorStatsNet {
            conv1: conv([1, self.conv1_channels], CONV1_KERNEL, device),
            pool1: pool().init(),
            conv2: conv([self.conv1_channels, self.conv2_channels], CONV2_KERNEL, device),
            pool2: pool().init(),
            hidden: linear(flat_size, self.hidden_size, device),
            output: linear(self.hidden_size, COLOR_STATS_LEN, device),
            output_activation: ScaledTanh::new(self.max_stat),
            negative_slope: self.negative_slope,
        })
    }

    fn layer_shapes(&self) -> Vec<LayerShape> {
        let (height, width) = (self.height, self.width);
        let (c1, c2) = (self.conv1_channels, self.conv2_channels);
        let mut shapes = vec![
            LayerShape::new("Input", None, vec![height, width]),
            LayerShape::new("Unsqueeze", Some(vec![height, width]), vec![1, height, width]),
        ];
        // too small inputs stop at the layer that cannot be built
        let Ok((h, w)) = self.stages() else {
            return shapes;
        };
        let pooled = vec![c2, h[3], w[3]];
        shapes.extend([
            LayerShape::new("Conv2d", Some(vec![1, height, width]), vec![c1, h[0], w[0]]),
            LayerShape::new("MaxPool2d", Some(vec![c1, h[0], w[0]]), vec![c1, h[1], w[1]]),
            LayerShape::new("Conv2d", Some(vec![c1, h[1], w[1]]), vec![c2, h[2], w[2]]),
            LayerShape::new("MaxPool2d", Some(vec![c2, h[2], w[2]]), pooled.clone()),
            LayerShape::new("Linear", Some(pooled), vec![self.hidden_size]),
            LayerShape::new("Linear", Some(vec![self.hidden_size]), vec![COLOR_STATS_LEN]),
        ]);
        shapes
    }
}

impl<B: Backend> ColorStatsNet<B> {
    /// # Shapes
    ///   - Input [batch, height, width]
    ///   - Output [batch, 6]
    pub fn forward(&self, gray: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch, _height, _width] = gray.dims();
        let slope = self.negative_slope;

        let x = gray.unsqueeze_dim::<4>(1);

        let x = leaky_relu(self.conv1.forward(x), slope);
        let x = self.pool1.forward(x);
        let x = leaky_relu(self.conv2.forward(x), slope);
        let x = self.pool2.forward(x);

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = leaky_relu(self.hidden.forward(x), slope);
        let x = self.output_activation.forward(self.output.forward(x));
        debug_assert_eq!([batch, COLOR_STATS_LEN], x.dims());
        x
    }
}

impl<B: Backend> ColorNet<B, 2> for ColorStatsNet<B> {
    fn target(images: Tensor<B, 4>) -> Tensor<B, 2> {
        color::color_stats(images)
    }

    fn predict(&self, gray: Tensor<B, 3>) -> Tensor<B, 2> {
        self.forward(gray)
    }
}
