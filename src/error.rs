use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {path:?}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("requested {requested} images but only {available} image handles were found")]
    NotEnoughImages { requested: usize, available: usize },

    #[error(
        "input of {height}x{width} is too small for this network (needs at least {min}x{min})"
    )]
    InputTooSmall {
        height: usize,
        width: usize,
        min: usize,
    },

    #[error("unknown network {name:?}, expected one of {expected:?}")]
    UnknownNet {
        name: String,
        expected: &'static [&'static str],
    },

    #[error("expected an image of {expected} values, got {actual}")]
    ImageSize { expected: usize, actual: usize },

    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("invalid batch sweep: {0}")]
    InvalidSweep(String),
}
