//! The two color-inference networks.
//!
//! Both read a normalized grayscale batch (see [`crate::color::grayscale`]) and
//! learn a target that is derived from the original color batch.

use crate::error::{Error, Result};
use burn::module::Param;
use burn::prelude::*;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

pub mod color_stats;
pub mod luminosity_ratio;

pub use color_stats::{ColorStatsNet, ColorStatsNetConfig};
pub use luminosity_ratio::{LuminosityRatioNet, LuminosityRatioNetConfig};

/// A network together with the target it learns.
///
/// `D` is the rank of the prediction (and of the target).
pub trait ColorNet<B: Backend, const D: usize>: Module<B> {
    /// Training target for a raw color batch.
    ///
    /// # Shapes
    ///   - Input [batch, height, width, 3]
    fn target(images: Tensor<B, 4>) -> Tensor<B, D>;

    /// # Shapes
    ///   - Input [batch, height, width]
    fn predict(&self, gray: Tensor<B, 3>) -> Tensor<B, D>;
}

pub trait ColorNetConfig<B: Backend, const D: usize>: Config {
    type Net: ColorNet<B, D>;

    /// Returns the initialized network.
    fn init(&self, device: &B::Device) -> Result<Self::Net>;

    /// Shapes of every layer, from input to output.
    fn layer_shapes(&self) -> Vec<LayerShape>;
}

/// Selects one of the networks by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NetKind {
    /// Learns, for each pixel, the ratio of each color channel to the pixel luminosity.
    LuminosityRatio,
    /// Learns the normalized mean and std of the color histogram of each channel.
    ColorStats,
}

impl NetKind {
    pub const NAMES: &'static [&'static str] = &[
        "LUMINOSITY_RATIO_NET",
        "luminosity-ratio",
        "COLOR_STATS_NET",
        "color-stats",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NetKind::LuminosityRatio => "luminosity-ratio",
            NetKind::ColorStats => "color-stats",
        }
    }
}

impl FromStr for NetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "luminosity-ratio-net" | "luminosity-ratio" => Ok(NetKind::LuminosityRatio),
            "color-stats-net" | "color-stats" => Ok(NetKind::ColorStats),
            _ => Err(Error::UnknownNet {
                name: s.to_string(),
                expected: Self::NAMES,
            }),
        }
    }
}

impl fmt::Display for NetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input and output shape of a single layer, without the batch axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerShape {
    pub layer: &'static str,
    /// `None` for the input layer.
    pub input: Option<Vec<usize>>,
    pub output: Vec<usize>,
}

impl LayerShape {
    pub fn new(layer: &'static str, input: Option<Vec<usize>>, output: Vec<usize>) -> Self {
        Self {
            layer,
            input,
            output,
        }
    }
}

fn write_shape(f: &mut fmt::Formatter<'_>, dims: &[usize]) -> fmt::Result {
    write!(f, "[_")?;
    for dim in dims {
        write!(f, ", {dim}")?;
    }
    write!(f, "]")
}

impl fmt::Display for LayerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.layer)?;
        if let Some(input) = &self.input {
            write_shape(f, input)?;
        }
        write!(f, " => ")?;
        write_shape(f, &self.output)
    }
}

/// Writes one line per layer, walking back from the output layer to the input layer.
pub fn write_network_shape<W: Write>(out: &mut W, shapes: &[LayerShape]) -> io::Result<()> {
    for shape in shapes.iter().rev() {
        writeln!(out, "{shape}")?;
    }
    Ok(())
}

pub fn print_network_shape(shapes: &[LayerShape]) -> io::Result<()> {
    write_network_shape(&mut io::stdout().lock(), shapes)
}

/// Biases start at zero, only the weights take the configured initializer.
pub(crate) fn zero_bias<B: Backend>(
    bias: Option<Param<Tensor<B, 1>>>,
) -> Option<Param<Tensor<B, 1>>> {
    bias.map(|bias| Param::from_tensor(bias.val().zeros_like()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_net_names() {
        for (name, kind) in [
            ("LUMINOSITY_RATIO_NET", NetKind::LuminosityRatio),
            ("luminosity-ratio", NetKind::LuminosityRatio),
            ("COLOR_STATS_NET", NetKind::ColorStats),
            ("Color_Stats", NetKind::ColorStats),
        ] {
            assert_eq!(name.parse::<NetKind>().unwrap(), kind, "{name}");
        }
    }

    #[test]
    fn rejects_unknown_net() {
        let err = "BuildLuminosityRatioNet".parse::<NetKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownNet { ref name, .. } if name == "BuildLuminosityRatioNet"));
        assert!(err.to_string().contains("COLOR_STATS_NET"));
    }

    #[test]
    fn display_round_trips() {
        for kind in [NetKind::LuminosityRatio, NetKind::ColorStats] {
            assert_eq!(kind.to_string().parse::<NetKind>().unwrap(), kind);
        }
    }

    #[test]
    fn formats_layer_shapes() {
        let input = LayerShape::new("Input", None, vec![32, 32]);
        assert_eq!(input.to_string(), "Input  => [_, 32, 32]");

        let conv = LayerShape::new("Conv2d", Some(vec![1, 32, 32]), vec![12, 32, 32]);
        assert_eq!(conv.to_string(), "Conv2d [_, 1, 32, 32] => [_, 12, 32, 32]");
    }

    #[test]
    fn writes_from_output_to_input() {
        let shapes = [
            LayerShape::new("Input", None, vec![4, 4]),
            LayerShape::new("Unsqueeze", Some(vec![4, 4]), vec![1, 4, 4]),
            LayerShape::new("Permute", Some(vec![1, 4, 4]), vec![4, 4, 1]),
        ];
        let mut out = Vec::new();
        write_network_shape(&mut out, &shapes).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Permute [_, 1, 4, 4] => [_, 4, 4, 1]",
                "Unsqueeze [_, 4, 4] => [_, 1, 4, 4]",
                "Input  => [_, 4, 4]",
            ]
        );
    }
}
