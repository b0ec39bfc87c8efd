//! Program set and compiled pipeline state for the wgpu backend.

use std::borrow::Cow;
use std::cell::RefCell;

use bytemuck::{Pod, Zeroable};
use halo_bloom::{BloomError, BloomPass, FilterMode, PassParams, ShaderProgramSet};
use rustc_hash::FxHashMap;

use crate::format::filter_mode;
use crate::shader::{BLOOM_SHADER_SOURCE, FRAGMENT_ENTRIES, VERTEX_ENTRY, missing_entry_points};

/// GPU uniform carrying one blit's [`PassParams`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PassUniform {
    pub curve: [f32; 4],
    pub texel_size: [f32; 2],
    pub intensity: f32,
    pub _pad: f32,
    pub noise: [f32; 4],
}

impl PassUniform {
    pub fn from_params(params: &PassParams) -> Self {
        let mut uniform = Self::default();
        match *params {
            PassParams::Prefilter { curve } => {
                uniform.curve = [
                    curve.threshold,
                    curve.knee_start,
                    curve.knee_width,
                    curve.knee_scale,
                ];
            }
            PassParams::Downsample { texel_size } | PassParams::Upsample { texel_size } => {
                uniform.texel_size = texel_size.to_array();
            }
            PassParams::Final {
                intensity,
                texel_size,
            } => {
                uniform.intensity = intensity;
                uniform.texel_size = texel_size.to_array();
            }
            PassParams::Combine { noise, .. } => {
                if let Some(noise) = noise {
                    uniform.noise = [noise.scale.x, noise.scale.y, 1.0, 0.0];
                }
            }
        }
        uniform
    }
}

/// A WGSL module plus the entry points implementing each bloom pass.
pub struct WgslPrograms {
    device: wgpu::Device,
    source: Cow<'static, str>,
    vertex_entry: String,
    fragment_entries: [String; BloomPass::COUNT],
}

impl WgslPrograms {
    pub fn new(
        device: &wgpu::Device,
        source: impl Into<Cow<'static, str>>,
        vertex_entry: &str,
        fragment_entries: [&str; BloomPass::COUNT],
    ) -> Self {
        Self {
            device: device.clone(),
            source: source.into(),
            vertex_entry: vertex_entry.to_owned(),
            fragment_entries: fragment_entries.map(str::to_owned),
        }
    }

    /// The built-in bloom shader.
    pub fn builtin(device: &wgpu::Device) -> Self {
        Self::new(device, BLOOM_SHADER_SOURCE, VERTEX_ENTRY, FRAGMENT_ENTRIES)
    }
}

impl ShaderProgramSet for WgslPrograms {
    type Pipeline = GpuPipeline;

    fn compile(self) -> Result<GpuPipeline, BloomError> {
        let mut entries: Vec<&str> = self.fragment_entries.iter().map(String::as_str).collect();
        entries.push(&self.vertex_entry);
        let missing = missing_entry_points(&self.source, &entries);
        if !missing.is_empty() {
            return Err(BloomError::Compile {
                message: format!("missing entry points: {}", missing.join(", ")),
            });
        }
        Ok(GpuPipeline::new(self))
    }
}

/// Shader module, bind group layout, and samplers shared by every bloom
/// pass. Render pipelines are built on first use per (pass, target format).
#[derive(Debug)]
pub struct GpuPipeline {
    device: wgpu::Device,
    module: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entries: [String; BloomPass::COUNT],
    bind_group_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    noise_sampler: wgpu::Sampler,
    placeholder: wgpu::TextureView,
    cache: RefCell<FxHashMap<(BloomPass, wgpu::TextureFormat), wgpu::RenderPipeline>>,
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_sampler(
    device: &wgpu::Device,
    label: &str,
    filter: wgpu::FilterMode,
    address: wgpu::AddressMode,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address,
        address_mode_v: address,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    })
}

impl GpuPipeline {
    fn new(programs: WgslPrograms) -> Self {
        let WgslPrograms {
            device,
            source,
            vertex_entry,
            fragment_entries,
        } = programs;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom-shader"),
            source: wgpu::ShaderSource::Wgsl(source),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom-pass-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<PassUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                texture_entry(1),
                sampler_entry(2),
                texture_entry(3),
                texture_entry(4),
                sampler_entry(5),
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom-pass-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let linear_sampler = create_sampler(
            &device,
            "bloom-linear-sampler",
            filter_mode(FilterMode::Bilinear),
            wgpu::AddressMode::ClampToEdge,
        );
        let nearest_sampler = create_sampler(
            &device,
            "bloom-nearest-sampler",
            filter_mode(FilterMode::Point),
            wgpu::AddressMode::ClampToEdge,
        );
        let noise_sampler = create_sampler(
            &device,
            "bloom-noise-sampler",
            wgpu::FilterMode::Nearest,
            wgpu::AddressMode::Repeat,
        );

        let placeholder = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("bloom-placeholder"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("Bloom shader module created");

        Self {
            device,
            module,
            vertex_entry,
            fragment_entries,
            bind_group_layout,
            layout,
            linear_sampler,
            nearest_sampler,
            noise_sampler,
            placeholder,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Number of render pipelines built so far.
    pub fn cached_pipelines(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Render pipeline for `pass` writing `format`, built on first request.
    pub fn render_pipeline(
        &self,
        pass: BloomPass,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        self.cache
            .borrow_mut()
            .entry((pass, format))
            .or_insert_with(|| self.create_render_pipeline(pass, format))
            .clone()
    }

    fn create_render_pipeline(
        &self,
        pass: BloomPass,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        // Upsampling accumulates onto the level below.
        let blend = (pass == BloomPass::Upsample).then_some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        });
        log::debug!("Creating {} pipeline for {format:?}", pass.label());

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(pass.label()),
                layout: Some(&self.layout),
                vertex: wgpu::VertexState {
                    module: &self.module,
                    entry_point: Some(self.vertex_entry.as_str()),
                    buffers: &[],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &self.module,
                    entry_point: Some(self.fragment_entries[pass.index()].as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
    }

    /// Bind group for one blit. Unused scene and noise slots get a 1x1 placeholder.
    pub(crate) fn bind_group(
        &self,
        uniform: &wgpu::Buffer,
        source: &wgpu::TextureView,
        filter: FilterMode,
        scene: Option<&wgpu::TextureView>,
        noise: Option<&wgpu::TextureView>,
    ) -> wgpu::BindGroup {
        let sampler = match filter {
            FilterMode::Point => &self.nearest_sampler,
            FilterMode::Bilinear => &self.linear_sampler,
        };
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("bloom-pass-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(
                        scene.unwrap_or(&self.placeholder),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(
                        noise.unwrap_or(&self.placeholder),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.noise_sampler),
                },
            ],
        })
    }
}
