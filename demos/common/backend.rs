//! Backend picked through the `dev-*` cargo features.

use burn::prelude::*;

#[cfg(feature = "dev-f16")]
pub type Float = burn::tensor::f16;
#[cfg(not(feature = "dev-f16"))]
pub type Float = f32;

#[cfg(feature = "dev-ndarray")]
mod selected {
    pub const NAME: &str = "ndarray";
    pub type Inner = burn::backend::NdArray<super::Float, i32>;
    pub fn device() -> burn::backend::ndarray::NdArrayDevice {
        Default::default()
    }
}

#[cfg(any(feature = "dev-tch-cpu", feature = "dev-tch-gpu"))]
mod selected {
    use burn::backend::libtorch::{LibTorch, LibTorchDevice};

    pub const NAME: &str = "libtorch";
    pub type Inner = LibTorch<super::Float>;
    #[cfg(feature = "dev-tch-cpu")]
    pub fn device() -> LibTorchDevice {
        LibTorchDevice::Cpu
    }
    #[cfg(all(feature = "dev-tch-gpu", not(target_os = "macos")))]
    pub fn device() -> LibTorchDevice {
        LibTorchDevice::Cuda(0)
    }
    #[cfg(all(feature = "dev-tch-gpu", target_os = "macos"))]
    pub fn device() -> LibTorchDevice {
        LibTorchDevice::Mps
    }
}

#[cfg(feature = "dev-wgpu")]
mod selected {
    pub const NAME: &str = "wgpu";
    pub type Inner = burn::backend::wgpu::Wgpu<super::Float, i32>;
    pub fn device() -> burn::backend::wgpu::WgpuDevice {
        Default::default()
    }
}

#[cfg(feature = "dev-cuda")]
mod selected {
    pub const NAME: &str = "cuda";
    pub type Inner = burn::backend::Cuda<super::Float, i32>;
    pub fn device() -> burn::backend::cuda::CudaDevice {
        Default::default()
    }
}

#[cfg(not(feature = "_dev-has-backend"))]
mod selected {
    std::compile_error!("no demo backend, enable one of the dev-* features of burn-colornet");

    // keeps the rest of the demo type-checking against something
    pub const NAME: &str = "none";
    pub type Inner = burn::backend::NdArray<super::Float, i32>;
    pub fn device() -> burn::backend::ndarray::NdArrayDevice {
        Default::default()
    }
}

pub use selected::NAME;

/// Inference backend, used by the evaluate function.
pub type DemoBackend = selected::Inner;
/// Training backend.
pub type DemoAutoBackend = burn::backend::Autodiff<DemoBackend>;

/// The device the demos run on.
pub fn device() -> <DemoBackend as Backend>::Device {
    tracing::info!("using the {NAME} backend ({})", core::any::type_name::<Float>());
    selected::device()
}
