//! Transforms between raw RGB image batches, the grayscale network inputs and
//! the per-net training targets.
//!
//! Every function takes a channel-last batch of raw pixel values in `[0, 255]`,
//! with shape `[batch, height, width, 3]`, RGB order.

use burn::prelude::*;

/// Mean luminosity of a pixel over the training images.
pub const PX_LUM_MEAN: f32 = 138.17;
/// Standard deviation of the luminosity of a pixel over the training images.
pub const PX_LUM_STD: f32 = 66.55;

/// ITU-R 601 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

// per-image color statistics, RGB order
pub const IM_MEAN_COLOR_MEANS: [f32; 3] = [133.07, 139.37, 153.86];
pub const IM_MEAN_COLOR_STDS: [f32; 3] = [39.012, 37.22, 43.59];
pub const IM_STD_COLOR_MEANS: [f32; 3] = [55.46, 54.28, 55.18];
pub const IM_STD_COLOR_STDS: [f32; 3] = [16.85, 16.22, 18.63];

/// Length of the [`color_stats`] vector: three channel means then three channel stds.
pub const COLOR_STATS_LEN: usize = 6;

const MAX_BRIGHTNESS: f32 = 255.;

/// Normalized grayscale version of the images.
///
/// # Shapes
///   - Input [batch, height, width, 3]
///   - Output [batch, height, width]
pub fn grayscale<B: Backend>(images: Tensor<B, 4>) -> Tensor<B, 3> {
    let [batch, height, width, channels] = images.dims();
    assert_eq!(channels, 3);
    let device = images.device();

    let weights = Tensor::<B, 1>::from_floats(LUMA_WEIGHTS, &device).reshape([1, 1, 1, 3]);
    let luma = (images * weights).sum_dim(3).reshape([batch, height, width]);

    (luma - PX_LUM_MEAN) / PX_LUM_STD
}

/// Ratio of each channel to the mean brightness of its pixel.
///
/// The `+ 1` keeps black pixels finite.
///
/// # Shapes
///   - Input [batch, height, width, 3]
///   - Output [batch, height, width, 3]
pub fn luminosity_ratios<B: Backend>(images: Tensor<B, 4>) -> Tensor<B, 4> {
    let pixel_mean = images.clone().mean_dim(3);
    images / (pixel_mean + 1.)
}

/// Normalized mean and standard deviation of the color histogram of each channel.
///
/// # Shapes
///   - Input [batch, height, width, 3]
///   - Output [batch, 6]
pub fn color_stats<B: Backend>(images: Tensor<B, 4>) -> Tensor<B, 2> {
    let [batch, height, width, channels] = images.dims();
    assert_eq!(channels, 3);
    let device = images.device();

    // reduced in [0, 1], pixel sums of raw brightnesses overflow f16
    let pixels = images.reshape([batch, height * width, 3]) / MAX_BRIGHTNESS;
    // population std, as the stats constants were measured
    let (var, mean) = pixels.var_mean_bias(1);
    let std = var.sqrt() * MAX_BRIGHTNESS;
    let mean = mean * MAX_BRIGHTNESS;

    let mean = normalize(
        mean.reshape([batch, 3]),
        IM_MEAN_COLOR_MEANS,
        IM_MEAN_COLOR_STDS,
        &device,
    );
    let std = normalize(
        std.reshape([batch, 3]),
        IM_STD_COLOR_MEANS,
        IM_STD_COLOR_STDS,
        &device,
    );

    Tensor::cat(vec![mean, std], 1)
}

fn normalize<B: Backend>(
    x: Tensor<B, 2>,
    means: [f32; 3],
    stds: [f32; 3],
    device: &B::Device,
) -> Tensor<B, 2> {
    let means = Tensor::<B, 1>::from_floats(means, device).reshape([1, 3]);
    let stds = Tensor::<B, 1>::from_floats(stds, device).reshape([1, 3]);
    (x - means) / stds
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Tolerance;

    type TestBackend = NdArray<f32>;

    fn uniform(
        batch: usize,
        height: usize,
        width: usize,
        rgb: [f32; 3],
    ) -> Tensor<TestBackend, 4> {
        let device = Default::default();
        let pixel = Tensor::<TestBackend, 1>::from_floats(rgb, &device).reshape([1, 1, 1, 3]);
        pixel.repeat(&[batch, height, width, 1])
    }

    #[test]
    fn grayscale_of_gray_pixels() {
        let gray = grayscale(uniform(2, 3, 4, [100., 100., 100.]));
        assert_eq!(gray.dims(), [2, 3, 4]);

        // luma weights sum to one
        let expected = (100. - PX_LUM_MEAN) / PX_LUM_STD;
        let values = gray.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (v - expected).abs() < 1e-4));
    }

    #[test]
    fn grayscale_weights_channels() {
        let gray = grayscale(uniform(1, 1, 1, [255., 0., 0.]));
        let expected = (255. * 0.299 - PX_LUM_MEAN) / PX_LUM_STD;
        let value = gray.into_data().to_vec::<f32>().unwrap()[0];
        assert!((value - expected).abs() < 1e-4);
    }

    #[test]
    fn luminosity_ratios_of_uniform_image() {
        let ratios = luminosity_ratios(uniform(1, 2, 2, [10., 20., 30.]));
        assert_eq!(ratios.dims(), [1, 2, 2, 3]);

        let pixel: [f32; 3] = [10. / 21., 20. / 21., 30. / 21.];
        let expected = TensorData::from([[[pixel; 2]; 2]]);
        ratios
            .into_data()
            .assert_approx_eq::<f32>(&expected, Tolerance::absolute(1e-4));
    }

    #[test]
    fn luminosity_ratios_of_black_image_are_zero() {
        let ratios = luminosity_ratios(uniform(1, 2, 2, [0., 0., 0.]));
        let values = ratios.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| *v == 0.));
    }

    #[test]
    fn color_stats_of_uniform_image() {
        let stats = color_stats(uniform(2, 4, 4, [133.07, 0., 255.]));
        assert_eq!(stats.dims(), [2, COLOR_STATS_LEN]);

        let row: [f32; 6] = [
            0.,
            (0. - 139.37) / 37.22,
            (255. - 153.86) / 43.59,
            -55.46 / 16.85,
            -54.28 / 16.22,
            -55.18 / 18.63,
        ];
        let expected = TensorData::from([row, row]);
        stats
            .into_data()
            .assert_approx_eq::<f32>(&expected, Tolerance::absolute(1e-4));
    }

    #[test]
    fn color_stats_uses_population_std() {
        // two pixels, red channel 0 and 100, population std 50
        let device = Default::default();
        let images = Tensor::<TestBackend, 4>::from_floats(
            [[[[0., 0., 0.], [100., 0., 0.]]]],
            &device,
        );
        let stats = color_stats(images).into_data().to_vec::<f32>().unwrap();

        let red_mean = (50. - IM_MEAN_COLOR_MEANS[0]) / IM_MEAN_COLOR_STDS[0];
        let red_std = (50. - IM_STD_COLOR_MEANS[0]) / IM_STD_COLOR_STDS[0];
        assert!((stats[0] - red_mean).abs() < 1e-4);
        assert!((stats[3] - red_std).abs() < 1e-4);
    }

    #[test]
    fn color_stats_of_large_bright_image() {
        // 40 * 40 * 255 is past the largest f16
        let stats = color_stats(uniform(1, 40, 40, [255., 255., 255.]));
        let stats = stats.into_data().to_vec::<f32>().unwrap();
        assert!(stats.iter().all(|v| v.is_finite()));

        for c in 0..3 {
            let mean = (255. - IM_MEAN_COLOR_MEANS[c]) / IM_MEAN_COLOR_STDS[c];
            let std = -IM_STD_COLOR_MEANS[c] / IM_STD_COLOR_STDS[c];
            assert!((stats[c] - mean).abs() < 1e-3);
            assert!((stats[3 + c] - std).abs() < 1e-3);
        }
    }
}
