//! CPU reference backend for `halo-bloom`.
//!
//! [`SoftRecorder`] records instructions, [`SoftDevice`] executes them on
//! submit against linear `f32` RGBA images. Slow, but exact enough to check
//! the bloom pipeline end to end without a GPU.

pub mod device;
pub mod image;
pub mod kernels;
pub mod noise;
pub mod program;
pub mod recorder;

pub use device::SoftDevice;
pub use image::{AddressMode, Image};
pub use kernels::{Kernel, PassInputs};
pub use noise::white_noise;
pub use program::{SoftPipeline, SoftPrograms};
pub use recorder::{Command, SoftRecorder};
