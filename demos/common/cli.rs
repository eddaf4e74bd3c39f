use burn_colornet::nets::NetKind;
use std::path::PathBuf;

pub const BENCH_HELP: &str = "\
Batch Size Optimizer

Times the training function of a color network over increasing batch sizes
and prints the throughput of every run.

USAGE:
    batchsize-optimizer [OPTIONS] <NET_NAME> <SIZE> <STARTING_BATCH_SIZE> <RUNS> <REPS>

ARGS:
    <NET_NAME>              LUMINOSITY_RATIO_NET or COLOR_STATS_NET (also luminosity-ratio, color-stats)
    <SIZE>                  Images are resized to SIZE x SIZE pixels
    <STARTING_BATCH_SIZE>   First batch size, also the batch size increment
    <RUNS>                  Number of batch sizes; STARTING_BATCH_SIZE * RUNS images are loaded
    <REPS>                  Timed runs per batch size
";

pub const TRAIN_HELP: &str = "\
Colorize Train

Trains a color network on a train split and reports the loss of the evaluate
function on a validation split after every epoch, and on a test split at the end.

USAGE:
    colorize-train [OPTIONS] <NET_NAME> <SIZE> <NUM_TRAIN> <NUM_VALID> <EPOCHS> <BATCH_SIZE>

ARGS:
    <NET_NAME>      LUMINOSITY_RATIO_NET or COLOR_STATS_NET (also luminosity-ratio, color-stats)
    <SIZE>          Images are resized to SIZE x SIZE pixels
    <NUM_TRAIN>     Training images
    <NUM_VALID>     Validation images, and as many test images
    <EPOCHS>        Passes over the training images
    <BATCH_SIZE>    Images per training step
";

pub const OPTIONS_HELP: &str = "
FLAGS:
    -h, --help                  Show this help message and exit

OPTIONS:
    -d, --image-dir <PATH>      Directory holding the images (bmp, jpg, jpeg, png) [default: images/raw]
    -l, --learning-rate <LR>    Learning rate of the Nesterov momentum updates [default: 0.01]
    -s, --seed <SEED>           Seed of the image shuffling and weight initialization [default: 0]

The log level is read from RUST_LOG [default: info].
";

pub const DEFAULT_IMAGE_DIR: &str = "images/raw";
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Options shared by every program.
#[derive(Debug)]
pub struct CommonArgs {
    pub image_dir: PathBuf,
    pub learning_rate: f64,
    pub seed: u64,
}

#[derive(Debug)]
pub struct BenchArgs {
    pub net: NetKind,
    pub size: usize,
    pub starting_batch_size: usize,
    pub runs: usize,
    pub reps: usize,
    pub common: CommonArgs,
}

#[derive(Debug)]
pub struct TrainArgs {
    pub net: NetKind,
    pub size: usize,
    pub num_train: usize,
    pub num_valid: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub common: CommonArgs,
}

impl BenchArgs {
    pub fn parse() -> Result<Self, pico_args::Error> {
        let mut pargs = arguments(BENCH_HELP);
        // options must be parsed before the free arguments
        let common = CommonArgs::parse(&mut pargs)?;
        let args = BenchArgs {
            net: pargs.free_from_str()?,
            size: pargs.free_from_str()?,
            starting_batch_size: pargs.free_from_str()?,
            runs: pargs.free_from_str()?,
            reps: pargs.free_from_str()?,
            common,
        };
        finish(pargs)?;
        Ok(args)
    }
}

impl TrainArgs {
    pub fn parse() -> Result<Self, pico_args::Error> {
        let mut pargs = arguments(TRAIN_HELP);
        let common = CommonArgs::parse(&mut pargs)?;
        let args = TrainArgs {
            net: pargs.free_from_str()?,
            size: pargs.free_from_str()?,
            num_train: pargs.free_from_str()?,
            num_valid: pargs.free_from_str()?,
            epochs: pargs.free_from_str()?,
            batch_size: pargs.free_from_str()?,
            common,
        };
        finish(pargs)?;
        Ok(args)
    }
}

impl CommonArgs {
    fn parse(pargs: &mut pico_args::Arguments) -> Result<Self, pico_args::Error> {
        Ok(CommonArgs {
            image_dir: pargs
                .opt_value_from_os_str(["-d", "--image-dir"], parse_path)?
                .unwrap_or_else(|| DEFAULT_IMAGE_DIR.into()),
            learning_rate: pargs
                .opt_value_from_str(["-l", "--learning-rate"])?
                .unwrap_or(DEFAULT_LEARNING_RATE),
            seed: pargs.opt_value_from_str(["-s", "--seed"])?.unwrap_or(0),
        })
    }
}

fn arguments(help: &str) -> pico_args::Arguments {
    let mut pargs = pico_args::Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        println!("{help}{OPTIONS_HELP}");
        std::process::exit(0);
    }
    pargs
}

fn finish(pargs: pico_args::Arguments) -> Result<(), pico_args::Error> {
    let remaining = pargs.finish();
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(pico_args::Error::ArgumentParsingFailed {
            cause: format!("unused arguments: {remaining:?}"),
        })
    }
}

fn parse_path(s: &std::ffi::OsStr) -> Result<std::path::PathBuf, &'static str> {
    Ok(s.into())
}
