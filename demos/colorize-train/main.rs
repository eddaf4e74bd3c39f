use burn::tensor::backend::AutodiffBackend;
use burn_colornet::data::{self, ImageSet};
use burn_colornet::nets;
use burn_colornet::prelude::*;
use std::error::Error;

#[path = "../common/mod.rs"]
pub mod common;

use common::backend::{self, DemoAutoBackend};
use common::cli::TrainArgs;

/// Mean loss of the evaluate function over the whole set.
fn evaluate<AutoB: AutodiffBackend>(
    trainer: &AnyTrainer<AutoB>,
    images: &ImageSet,
    batch_size: usize,
    device: &AutoB::Device,
) -> Result<f32, Box<dyn Error>> {
    let mut total = 0.;
    for batch in images.batches(batch_size)? {
        let len = batch.len();
        let loss = trainer.evaluate_loss(batch.to_tensor::<AutoB::InnerBackend>(device));
        total += loss * len as f32;
    }
    Ok(total / images.len().max(1) as f32)
}

pub fn train<AutoB: AutodiffBackend>(
    args: &TrainArgs,
    device: &AutoB::Device,
) -> Result<(), Box<dyn Error>> {
    let handles = data::image_handles(&args.common.image_dir)?;
    println!("Found {} image handles", handles.len());
    let split = data::train_valid_test_split(
        &handles,
        args.num_train,
        args.num_valid,
        args.size,
        args.size,
        args.common.seed,
    )?;

    let config = TrainerConfig::new(args.net, args.size, args.size)
        .with_learning_rate(args.common.learning_rate)
        .with_seed(args.common.seed);
    let mut trainer = AnyTrainer::<AutoB>::new(&config, device)?;
    nets::print_network_shape(trainer.layer_shapes())?;

    let num_batches = split.train.num_batches(args.batch_size)?;
    println!("Starting training...");
    for epoch in 1..args.epochs + 1 {
        let mut total = 0.;
        for (mut b, batch) in split.train.batches(args.batch_size)?.enumerate() {
            b += 1;
            let len = batch.len();
            let loss = trainer.train_step(batch.to_tensor::<AutoB>(device));
            total += loss * len as f32;
            println!(
                "Epoch {epoch}/{}, Batch {b:0>4}/{num_batches}, Loss {loss:.4}",
                args.epochs
            );
        }
        let valid_loss = evaluate(&trainer, &split.valid, args.batch_size, device)?;
        println!(
            "Epoch {epoch}/{}, Avg Loss {:.4}, Avg Valid Loss {valid_loss:.4}",
            args.epochs,
            total / split.train.len().max(1) as f32,
        );
    }
    println!("Training finished.");

    let test_loss = evaluate(&trainer, &split.test, args.batch_size, device)?;
    println!("Avg Test Loss {test_loss:.4}");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    common::logging::init();
    let args = TrainArgs::parse()?;
    tracing::debug!("{args:?}");
    train::<DemoAutoBackend>(&args, &backend::device())?;
    Ok(())
}
