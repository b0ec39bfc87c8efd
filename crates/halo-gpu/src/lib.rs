//! wgpu backend for halo bloom: texture pooling, WGSL pass pipelines, and a
//! queue-backed frame context.

pub mod context;
pub mod format;
pub mod pipeline;
pub mod recorder;
pub mod shader;

pub use context::{GpuContext, GpuContextError};
pub use format::{pixel_format, texture_format};
pub use pipeline::{GpuPipeline, PassUniform, WgslPrograms};
pub use recorder::GpuRecorder;
pub use shader::{BLOOM_SHADER_SOURCE, FRAGMENT_ENTRIES, VERTEX_ENTRY};
