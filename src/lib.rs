pub mod activation;
pub mod benchmark;
pub mod color;
pub mod data;
pub mod error;
pub mod loss;
pub mod nets;
pub mod trainer;

pub mod prelude {
    pub use crate::benchmark::{BatchSweep, RunStat};
    pub use crate::error::{Error, Result};
    pub use crate::nets::{
        ColorNet, ColorNetConfig, ColorStatsNet, ColorStatsNetConfig, LayerShape,
        LuminosityRatioNet, LuminosityRatioNetConfig, NetKind,
    };
    pub use crate::trainer::{AnyTrainer, TrainFn, Trainer, TrainerConfig};
}
