//! [`CommandRecorder`] over a `wgpu::CommandEncoder`.
//!
//! Allocation and release act on the target store immediately; copies and
//! blits are encoded and run when the encoder is submitted. Released
//! textures go to a free list keyed by size and format and are handed out
//! again by later allocations with the same layout.

use halo_bloom::{
    BloomPass, CommandRecorder, FilterMode, PassParams, PixelFormat, RecorderError, RenderTarget,
    TargetDesc,
};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use crate::format::{extent, pixel_format, texture_descriptor, texture_format};
use crate::pipeline::{GpuPipeline, PassUniform};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct PoolKey {
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl PoolKey {
    fn from_desc(desc: &TargetDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
        }
    }
}

#[derive(Debug)]
struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: TargetDesc,
    /// Owned by the caller; never recycled.
    imported: bool,
}

#[derive(Debug)]
pub struct GpuRecorder {
    device: wgpu::Device,
    encoder: Option<wgpu::CommandEncoder>,
    targets: FxHashMap<RenderTarget, GpuTarget>,
    free: FxHashMap<PoolKey, Vec<wgpu::Texture>>,
    textures_created: usize,
}

impl GpuRecorder {
    pub fn new(device: wgpu::Device) -> Self {
        Self {
            device,
            encoder: None,
            targets: FxHashMap::default(),
            free: FxHashMap::default(),
            textures_created: 0,
        }
    }

    /// Bind a caller-owned texture, such as the camera color, to `target`.
    pub fn import(
        &mut self,
        target: RenderTarget,
        texture: wgpu::Texture,
    ) -> Result<(), RecorderError> {
        let format = pixel_format(texture.format()).ok_or_else(|| {
            RecorderError::Backend(format!(
                "cannot import {target:?}: unsupported format {:?}",
                texture.format()
            ))
        })?;
        let desc = TargetDesc::color(texture.width(), texture.height(), format);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.targets.insert(
            target,
            GpuTarget {
                texture,
                view,
                desc,
                imported: true,
            },
        );
        Ok(())
    }

    pub fn texture(&self, target: RenderTarget) -> Option<&wgpu::Texture> {
        self.targets.get(&target).map(|t| &t.texture)
    }

    pub fn desc(&self, target: RenderTarget) -> Option<&TargetDesc> {
        self.targets.get(&target).map(|t| &t.desc)
    }

    /// Textures created since this recorder was made; pool hits do not count.
    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    pub fn pooled_textures(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Finish encoding. `None` if nothing was encoded since the last call.
    pub fn finish(&mut self) -> Option<wgpu::CommandBuffer> {
        self.encoder.take().map(wgpu::CommandEncoder::finish)
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("bloom-encoder"),
            })
        })
    }

    fn take_texture(&mut self, desc: &TargetDesc) -> wgpu::Texture {
        if let Some(texture) = self
            .free
            .get_mut(&PoolKey::from_desc(desc))
            .and_then(Vec::pop)
        {
            return texture;
        }
        self.textures_created += 1;
        log::trace!(
            "Creating bloom texture {}x{} {:?}",
            desc.width,
            desc.height,
            desc.format
        );
        self.device
            .create_texture(&texture_descriptor("bloom-target", desc))
    }

    fn recycle(&mut self, desc: &TargetDesc, texture: wgpu::Texture) {
        self.free
            .entry(PoolKey::from_desc(desc))
            .or_default()
            .push(texture);
    }

    /// View to sample `target` from while `dst` is the render attachment.
    ///
    /// A target cannot be read and written by the same pass, so reading the
    /// destination goes through a pooled copy pushed onto `snapshots`.
    fn read_view(
        &mut self,
        target: RenderTarget,
        dst: RenderTarget,
        snapshots: &mut Vec<(TargetDesc, wgpu::Texture)>,
    ) -> Result<(wgpu::TextureView, FilterMode), RecorderError> {
        let current = self
            .targets
            .get(&target)
            .ok_or(RecorderError::MissingTarget(target))?;
        if target != dst {
            return Ok((current.view.clone(), current.desc.filter));
        }

        let desc = current.desc;
        let texture = current.texture.clone();
        let copy = self.take_texture(&desc);
        self.encoder().copy_texture_to_texture(
            texture.as_image_copy(),
            copy.as_image_copy(),
            extent(&desc),
        );
        let view = copy.create_view(&wgpu::TextureViewDescriptor::default());
        snapshots.push((desc, copy));
        Ok((view, desc.filter))
    }
}

impl CommandRecorder for GpuRecorder {
    type Pipeline = GpuPipeline;

    fn allocate(&mut self, target: RenderTarget, desc: &TargetDesc) -> Result<(), RecorderError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(RecorderError::InvalidSize {
                target,
                width: desc.width,
                height: desc.height,
            });
        }
        self.release(target);

        let texture = self.take_texture(desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.targets.insert(
            target,
            GpuTarget {
                texture,
                view,
                desc: *desc,
                imported: false,
            },
        );
        Ok(())
    }

    fn release(&mut self, target: RenderTarget) {
        if let Some(released) = self.targets.remove(&target)
            && !released.imported
        {
            self.recycle(&released.desc, released.texture);
        }
    }

    fn set_filter_mode(&mut self, target: RenderTarget, filter: FilterMode) {
        match self.targets.get_mut(&target) {
            Some(t) => t.desc.filter = filter,
            None => log::debug!("Filter change for unallocated {target:?} ignored"),
        }
    }

    fn copy(&mut self, src: RenderTarget, dst: RenderTarget) -> Result<(), RecorderError> {
        let from = self
            .targets
            .get(&src)
            .ok_or(RecorderError::MissingTarget(src))?;
        let to = self
            .targets
            .get(&dst)
            .ok_or(RecorderError::MissingTarget(dst))?;
        if from.desc.size() != to.desc.size() || from.desc.format != to.desc.format {
            return Err(RecorderError::FormatMismatch {
                src,
                src_format: from.desc.format,
                dst,
                dst_format: to.desc.format,
            });
        }
        let (from, to, size) = (from.texture.clone(), to.texture.clone(), extent(&to.desc));
        self.encoder()
            .copy_texture_to_texture(from.as_image_copy(), to.as_image_copy(), size);
        Ok(())
    }

    fn blit(
        &mut self,
        src: RenderTarget,
        dst: RenderTarget,
        pipeline: &GpuPipeline,
        params: &PassParams,
    ) -> Result<(), RecorderError> {
        let (dst_view, dst_format) = {
            let t = self
                .targets
                .get(&dst)
                .ok_or(RecorderError::MissingTarget(dst))?;
            (t.view.clone(), t.desc.format)
        };

        let mut snapshots = Vec::new();
        let (source_view, filter) = self.read_view(src, dst, &mut snapshots)?;
        let (scene, noise) = match *params {
            PassParams::Combine { source, noise } => (
                Some(self.read_view(source, dst, &mut snapshots)?.0),
                match noise {
                    Some(n) => Some(self.read_view(n.texture, dst, &mut snapshots)?.0),
                    None => None,
                },
            ),
            _ => (None, None),
        };

        let uniform = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("bloom-pass-uniform"),
                contents: bytemuck::bytes_of(&PassUniform::from_params(params)),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = pipeline.bind_group(
            &uniform,
            &source_view,
            filter,
            scene.as_ref(),
            noise.as_ref(),
        );
        let pass = params.pass();
        let render_pipeline = pipeline.render_pipeline(pass, texture_format(dst_format));
        let load = if pass == BloomPass::Upsample {
            wgpu::LoadOp::Load
        } else {
            wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT)
        };

        {
            let mut render_pass = self.encoder().begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            render_pass.set_pipeline(&render_pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        for (desc, texture) in snapshots {
            self.recycle(&desc, texture);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.encoder = None;
    }
}
