use burn::tensor::backend::AutodiffBackend;
use burn_colornet::prelude::*;
use burn_colornet::{benchmark, data, nets};
use std::error::Error;
use std::time::Instant;

#[path = "../common/mod.rs"]
pub mod common;

use common::backend::{self, DemoAutoBackend};
use common::cli::BenchArgs;

pub fn launch<AutoB: AutodiffBackend>(
    args: &BenchArgs,
    device: &AutoB::Device,
) -> Result<Vec<RunStat>, Box<dyn Error>> {
    let sweep = BatchSweep::new(args.starting_batch_size, args.runs).with_reps(args.reps);
    sweep.validate()?;

    let handles = data::image_handles(&args.common.image_dir)?;
    println!("Found {} image handles", handles.len());

    println!("Loading Images...");
    let num_images = sweep.num_images();
    let mark = Instant::now();
    let split = data::train_valid_test_split(
        &handles,
        num_images,
        0,
        args.size,
        args.size,
        args.common.seed,
    )?;
    let load_time = mark.elapsed().as_secs_f64();
    println!(
        "Loaded {num_images} images in {load_time:.3} seconds: {:.1} / sec",
        num_images as f64 / load_time
    );

    println!("Building network...");
    let config = TrainerConfig::new(args.net, args.size, args.size)
        .with_learning_rate(args.common.learning_rate)
        .with_seed(args.common.seed);
    let mut trainer = AnyTrainer::<AutoB>::new(&config, device)?;
    nets::print_network_shape(trainer.layer_shapes())?;

    let images = split.train.to_tensor::<AutoB>(device);
    let run_stats = benchmark::sweep(&images, &mut trainer, &sweep, |stat| println!("{stat}"))?;
    Ok(run_stats)
}

fn main() -> Result<(), Box<dyn Error>> {
    common::logging::init();
    let args = BenchArgs::parse()?;
    tracing::debug!("{args:?}");
    launch::<DemoAutoBackend>(&args, &backend::device())?;
    Ok(())
}
