use crate::error::{Error, Result};
use burn::prelude::*;
use image::imageops::FilterType;
use num_traits::AsPrimitive;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::path::{Path, PathBuf};

pub const SUPPORTED_FILES: [&str; 4] = ["bmp", "jpg", "jpeg", "png"];

/// Decoded RGB images of a single size, kept on the host.
///
/// Pixel values are raw brightnesses, in between 0.0 and 255.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSet {
    /// # Shape
    /// [len * height * width * 3]
    pixels: Vec<f32>,
    height: usize,
    width: usize,
}

impl ImageSet {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            pixels: Vec::new(),
            height,
            width,
        }
    }

    fn image_len(&self) -> usize {
        self.height * self.width * 3
    }

    /// Appends one channel-last RGB image of the set's size.
    pub fn push(&mut self, image: &[f32]) -> Result<()> {
        let expected = self.image_len();
        if image.len() != expected {
            return Err(Error::ImageSize {
                expected,
                actual: image.len(),
            });
        }
        self.pixels.extend_from_slice(image);
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self.image_len() {
            0 => 0,
            image_len => self.pixels.len() / image_len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// [len, height, width, 3]
    pub fn dims(&self) -> [usize; 4] {
        [self.len(), self.height, self.width, 3]
    }

    /// The images from `start` (inclusive) to `end` (exclusive).
    pub fn slice(&self, start: usize, end: usize) -> ImageSet {
        let end = end.min(self.len());
        let start = start.min(end);
        let image_len = self.image_len();
        Self {
            pixels: self.pixels[start * image_len..end * image_len].to_vec(),
            height: self.height,
            width: self.width,
        }
    }

    /// Number of chunks yielded by [`ImageSet::batches`].
    pub fn num_batches(&self, batch_size: usize) -> Result<usize> {
        if batch_size == 0 {
            return Err(Error::ZeroBatchSize);
        }
        Ok(self.len().div_ceil(batch_size))
    }

    /// Consecutive chunks of at most `batch_size` images.
    pub fn batches(&self, batch_size: usize) -> Result<impl Iterator<Item = ImageSet> + '_> {
        if batch_size == 0 {
            return Err(Error::ZeroBatchSize);
        }
        Ok((0..self.len())
            .step_by(batch_size)
            .map(move |start| self.slice(start, start + batch_size)))
    }

    /// # Shapes
    ///   - Output [len, height, width, 3]
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 4> {
        let data = TensorData::new(self.pixels.clone(), self.dims());
        Tensor::from_data(data, device)
    }
}

/// Every supported image file directly inside `dir`, sorted by path.
pub fn image_handles(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut handles = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SUPPORTED_FILES.contains(&ext.to_ascii_lowercase().as_str()));
        if supported && path.is_file() {
            handles.push(path);
        }
    }
    handles.sort();
    Ok(handles)
}

/// Decodes an image and resizes it to exactly `height` x `width`.
///
/// Returns the channel-last RGB brightnesses.
pub fn load_image(path: &Path, height: usize, width: usize) -> Result<Vec<f32>> {
    let image = image::open(path).map_err(|source| Error::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = image
        .resize_exact(width as u32, height as u32, FilterType::Triangle)
        .into_rgb8();
    tracing::debug!("loaded {path:?}");
    Ok(rgb
        .into_raw()
        .into_iter()
        .map(|brightness| {
            let element: f32 = brightness.as_();
            element
        })
        .collect())
}

pub fn load_images(handles: &[PathBuf], height: usize, width: usize) -> Result<ImageSet> {
    let mut images = ImageSet::new(height, width);
    for handle in handles {
        images.push(&load_image(handle, height, width)?)?;
    }
    Ok(images)
}

#[derive(Debug, Clone)]
pub struct Split {
    pub train: ImageSet,
    pub valid: ImageSet,
    pub test: ImageSet,
}

/// Shuffles the handles and loads `num_train` training images, then
/// `num_valid` validation images and `num_valid` test images.
pub fn train_valid_test_split(
    handles: &[PathBuf],
    num_train: usize,
    num_valid: usize,
    height: usize,
    width: usize,
    seed: u64,
) -> Result<Split> {
    let requested = num_train + 2 * num_valid;
    if handles.len() < requested {
        return Err(Error::NotEnoughImages {
            requested,
            available: handles.len(),
        });
    }

    let mut handles = handles.to_vec();
    handles.shuffle(&mut StdRng::seed_from_u64(seed));

    let (train, rest) = handles.split_at(num_train);
    let (valid, rest) = rest.split_at(num_valid);
    let test = &rest[..num_valid];
    tracing::info!(
        "loading {} train, {} valid and {} test images at {height}x{width}",
        train.len(),
        valid.len(),
        test.len()
    );

    Ok(Split {
        train: load_images(train, height, width)?,
        valid: load_images(valid, height, width)?,
        test: load_images(test, height, width)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn numbered(len: usize) -> ImageSet {
        let mut set = ImageSet::new(2, 1);
        for i in 0..len {
            set.push(&[i as f32; 6]).unwrap();
        }
        set
    }

    #[test]
    fn slices_whole_images() {
        let set = numbered(5);
        assert_eq!(set.len(), 5);
        assert_eq!(set.dims(), [5, 2, 1, 3]);

        let first = set.slice(0, 2);
        assert_eq!(first.len(), 2);
        assert_eq!(first, numbered(2));

        // clamped to the set
        assert_eq!(set.slice(3, 10).len(), 2);
        assert!(set.slice(7, 10).is_empty());
    }

    #[test]
    fn push_rejects_images_of_another_size() {
        let mut set = numbered(1);
        let err = set.push(&[0.; 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::ImageSize {
                expected: 6,
                actual: 5
            }
        ));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn batches_cover_every_image() {
        let set = numbered(7);
        let lens: Vec<_> = set.batches(3).unwrap().map(|b| b.len()).collect();
        assert_eq!(lens, vec![3, 3, 1]);
        assert_eq!(set.num_batches(3).unwrap(), 3);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let set = numbered(2);
        assert!(matches!(set.batches(0), Err(Error::ZeroBatchSize)));
        assert!(matches!(set.num_batches(0), Err(Error::ZeroBatchSize)));
    }

    #[test]
    fn converts_to_channel_last_tensor() {
        let device = Default::default();
        let tensor = numbered(3).to_tensor::<TestBackend>(&device);
        assert_eq!(tensor.dims(), [3, 2, 1, 3]);

        let last = tensor.narrow(0, 2, 1).into_data().to_vec::<f32>().unwrap();
        assert_eq!(last, vec![2.; 6]);
    }

    #[test]
    fn split_rejects_too_few_handles() {
        let handles = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
        let err = train_valid_test_split(&handles, 1, 1, 8, 8, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::NotEnoughImages {
                requested: 3,
                available: 2
            }
        ));
    }
}
