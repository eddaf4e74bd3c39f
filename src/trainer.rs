use crate::color;
use crate::error::Result;
use crate::loss::SquaredErrorLoss;
use crate::nets::{
    ColorNet, ColorNetConfig, ColorStatsNet, ColorStatsNetConfig, LayerShape, LuminosityRatioNet,
    LuminosityRatioNetConfig, NetKind,
};
use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer, Sgd, SgdConfig, adaptor::OptimizerAdaptor};
use burn::optim::momentum::MomentumConfig;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

#[derive(Config, Debug)]
pub struct TrainerConfig {
    pub net: NetKind,
    pub height: usize,
    pub width: usize,
    #[config(default = 0.01)]
    pub learning_rate: f64,
    /// Nesterov momentum.
    #[config(default = 0.9)]
    pub momentum: f64,
    #[config(default = 0)]
    pub seed: u64,
}

impl TrainerConfig {
    pub fn optimizer(&self) -> SgdConfig {
        SgdConfig::new().with_momentum(Some(
            MomentumConfig::new()
                .with_momentum(self.momentum)
                .with_dampening(0.)
                .with_nesterov(true),
        ))
    }
}

/// Something that trains on a raw color batch and returns the batch loss.
pub trait TrainFn<B: Backend> {
    /// # Shapes
    ///   - images [batch, height, width, 3]
    fn train_batch(&mut self, images: Tensor<B, 4>) -> f32;
}

/// Result of the evaluate function.
#[derive(Debug)]
pub struct Evaluation<B: Backend, const D: usize> {
    pub prediction: Tensor<B, D>,
    pub loss: f32,
}

/// Grayscale inputs and targets are both derived from the raw color batch.
fn forward_loss<B, M, const D: usize>(
    model: &M,
    images: Tensor<B, 4>,
) -> (Tensor<B, D>, Tensor<B, 1>)
where
    B: Backend,
    M: ColorNet<B, D>,
{
    let target = M::target(images.clone());
    let prediction = model.predict(color::grayscale(images));
    let loss = SquaredErrorLoss::new().forward(prediction.clone(), target);
    (prediction, loss)
}

/// A network and its optimizer state, providing the train and evaluate functions.
pub struct Trainer<B, M, const D: usize>
where
    B: AutodiffBackend,
    M: ColorNet<B, D> + AutodiffModule<B>,
{
    model: M,
    optim: OptimizerAdaptor<Sgd<B::InnerBackend>, M, B>,
    learning_rate: f64,
    layer_shapes: Vec<LayerShape>,
}

impl<B, M, const D: usize> Trainer<B, M, D>
where
    B: AutodiffBackend,
    M: ColorNet<B, D> + AutodiffModule<B>,
    M::InnerModule: ColorNet<B::InnerBackend, D>,
{
    pub fn new<C>(net_config: &C, config: &TrainerConfig, device: &B::Device) -> Result<Self>
    where
        C: ColorNetConfig<B, D, Net = M>,
    {
        B::seed(device, config.seed);
        let model = net_config.init(device)?;
        let optim = config.optimizer().init::<B, M>();
        Ok(Self {
            model,
            optim,
            learning_rate: config.learning_rate,
            layer_shapes: net_config.layer_shapes(),
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn layer_shapes(&self) -> &[LayerShape] {
        &self.layer_shapes
    }

    /// One forward, backward and Nesterov update step. Returns the loss before the update.
    pub fn train_step(&mut self, images: Tensor<B, 4>) -> f32 {
        let (_prediction, loss) = forward_loss::<B, M, D>(&self.model, images);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optim
            .step(self.learning_rate, self.model.clone(), grads);

        let loss = loss.into_scalar().elem::<f32>();
        tracing::debug!("train step loss {loss:.5}");
        loss
    }

    /// Prediction and loss of the inference copy of the model, without any update.
    pub fn evaluate(&self, images: Tensor<B::InnerBackend, 4>) -> Evaluation<B::InnerBackend, D> {
        let model = self.model.valid();
        let (prediction, loss) = forward_loss::<_, M::InnerModule, D>(&model, images);
        Evaluation {
            prediction,
            loss: loss.into_scalar().elem::<f32>(),
        }
    }
}

impl<B, M, const D: usize> TrainFn<B> for Trainer<B, M, D>
where
    B: AutodiffBackend,
    M: ColorNet<B, D> + AutodiffModule<B>,
    M::InnerModule: ColorNet<B::InnerBackend, D>,
{
    fn train_batch(&mut self, images: Tensor<B, 4>) -> f32 {
        self.train_step(images)
    }
}

/// Trainer for a network picked at runtime.
pub enum AnyTrainer<B: AutodiffBackend> {
    LuminosityRatio(Trainer<B, LuminosityRatioNet<B>, 4>),
    ColorStats(Trainer<B, ColorStatsNet<B>, 2>),
}

impl<B: AutodiffBackend> AnyTrainer<B> {
    /// Builds the network with its default layer sizes.
    pub fn new(config: &TrainerConfig, device: &B::Device) -> Result<Self> {
        let trainer = match config.net {
            NetKind::LuminosityRatio => {
                let net_config = LuminosityRatioNetConfig::new(config.height, config.width);
                AnyTrainer::LuminosityRatio(Trainer::new(&net_config, config, device)?)
            }
            NetKind::ColorStats => {
                let net_config = ColorStatsNetConfig::new(config.height, config.width);
                AnyTrainer::ColorStats(Trainer::new(&net_config, config, device)?)
            }
        };
        Ok(trainer)
    }

    pub fn kind(&self) -> NetKind {
        match self {
            AnyTrainer::LuminosityRatio(_) => NetKind::LuminosityRatio,
            AnyTrainer::ColorStats(_) => NetKind::ColorStats,
        }
    }

    pub fn layer_shapes(&self) -> &[LayerShape] {
        match self {
            AnyTrainer::LuminosityRatio(trainer) => trainer.layer_shapes(),
            AnyTrainer::ColorStats(trainer) => trainer.layer_shapes(),
        }
    }

    pub fn train_step(&mut self, images: Tensor<B, 4>) -> f32 {
        match self {
            AnyTrainer::LuminosityRatio(trainer) => trainer.train_step(images),
            AnyTrainer::ColorStats(trainer) => trainer.train_step(images),
        }
    }

    pub fn evaluate_loss(&self, images: Tensor<B::InnerBackend, 4>) -> f32 {
        match self {
            AnyTrainer::LuminosityRatio(trainer) => trainer.evaluate(images).loss,
            AnyTrainer::ColorStats(trainer) => trainer.evaluate(images).loss,
        }
    }
}

impl<B: AutodiffBackend> TrainFn<B> for AnyTrainer<B> {
    fn train_batch(&mut self, images: Tensor<B, 4>) -> f32 {
        self.train_step(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn images<B: Backend>(batch: usize, size: usize) -> Tensor<B, 4> {
        let device = Default::default();
        Tensor::random(
            [batch, size, size, 3],
            Distribution::Uniform(0., 255.),
            &device,
        )
    }

    #[test]
    fn config_defaults() {
        let config = TrainerConfig::new(NetKind::LuminosityRatio, 8, 8);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.momentum, 0.9);
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn train_steps_reduce_the_loss() {
        let device = Default::default();
        let config = TrainerConfig::new(NetKind::LuminosityRatio, 8, 8);
        let mut trainer = AnyTrainer::<TestAutodiffBackend>::new(&config, &device).unwrap();
        assert_eq!(trainer.kind(), NetKind::LuminosityRatio);

        let batch = images::<TestAutodiffBackend>(4, 8);
        let first = trainer.train_step(batch.clone());
        assert!(first.is_finite());

        let mut last = first;
        for _ in 0..30 {
            last = trainer.train_step(batch.clone());
        }
        assert!(last < first, "{last} >= {first}");
    }

    #[test]
    fn color_stats_train_step_is_finite() {
        let device = Default::default();
        let config = TrainerConfig::new(NetKind::ColorStats, 16, 16);
        let mut trainer = AnyTrainer::<TestAutodiffBackend>::new(&config, &device).unwrap();
        assert_eq!(trainer.layer_shapes().last().unwrap().output, vec![6]);

        let loss = trainer.train_batch(images(2, 16));
        assert!(loss.is_finite());
    }

    #[test]
    fn evaluate_does_not_update() {
        let device = Default::default();
        let config = TrainerConfig::new(NetKind::ColorStats, 12, 12);
        let net_config = ColorStatsNetConfig::new(12, 12);
        let trainer =
            Trainer::<TestAutodiffBackend, _, 2>::new(&net_config, &config, &device).unwrap();

        let batch = images::<TestBackend>(3, 12);
        let first = trainer.evaluate(batch.clone());
        let second = trainer.evaluate(batch);
        assert_eq!(first.prediction.dims(), [3, 6]);
        assert_eq!(first.loss, second.loss);
        first
            .prediction
            .into_data()
            .assert_eq(&second.prediction.into_data(), true);
    }

    #[test]
    fn too_small_input_is_rejected() {
        let device = Default::default();
        let config = TrainerConfig::new(NetKind::ColorStats, 8, 8);
        assert!(AnyTrainer::<TestAutodiffBackend>::new(&config, &device).is_err());
    }
}
