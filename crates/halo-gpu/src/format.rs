//! Mapping between bloom target descriptions and wgpu types.

use halo_bloom::{FilterMode, PixelFormat, TargetDesc};

pub fn texture_format(format: PixelFormat) -> wgpu::TextureFormat {
    match format {
        PixelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        PixelFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        PixelFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        PixelFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        PixelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        PixelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
    }
}

/// Inverse of [`texture_format`]; `None` for formats bloom cannot render to.
pub fn pixel_format(format: wgpu::TextureFormat) -> Option<PixelFormat> {
    Some(match format {
        wgpu::TextureFormat::Rgba8Unorm => PixelFormat::Rgba8Unorm,
        wgpu::TextureFormat::Rgba8UnormSrgb => PixelFormat::Rgba8UnormSrgb,
        wgpu::TextureFormat::Bgra8Unorm => PixelFormat::Bgra8Unorm,
        wgpu::TextureFormat::Bgra8UnormSrgb => PixelFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba16Float => PixelFormat::Rgba16Float,
        wgpu::TextureFormat::Rgba32Float => PixelFormat::Rgba32Float,
        _ => return None,
    })
}

pub fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Point => wgpu::FilterMode::Nearest,
        FilterMode::Bilinear => wgpu::FilterMode::Linear,
    }
}

/// Usages every bloom-owned texture is created with.
pub const TARGET_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

pub fn texture_descriptor<'a>(label: &'a str, desc: &TargetDesc) -> wgpu::TextureDescriptor<'a> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(desc),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: texture_format(desc.format),
        usage: TARGET_USAGE,
        view_formats: &[],
    }
}

pub fn extent(desc: &TargetDesc) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: desc.width,
        height: desc.height,
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgba8Unorm,
        PixelFormat::Rgba8UnormSrgb,
        PixelFormat::Bgra8Unorm,
        PixelFormat::Bgra8UnormSrgb,
        PixelFormat::Rgba16Float,
        PixelFormat::Rgba32Float,
    ];

    #[test]
    fn test_format_mapping_round_trips() {
        for format in ALL {
            assert_eq!(pixel_format(texture_format(format)), Some(format));
        }
    }

    #[test]
    fn test_hdr_formats_map_to_float_textures() {
        assert_eq!(
            texture_format(PixelFormat::Rgba16Float),
            wgpu::TextureFormat::Rgba16Float
        );
        assert!(texture_format(PixelFormat::Bgra8UnormSrgb).is_srgb());
    }

    #[test]
    fn test_depth_formats_are_rejected() {
        assert_eq!(pixel_format(wgpu::TextureFormat::Depth32Float), None);
    }

    #[test]
    fn test_descriptor_uses_single_mip() {
        let desc = TargetDesc {
            mip_count: 7,
            ..TargetDesc::color(640, 360, PixelFormat::Rgba16Float)
        };
        let tex = texture_descriptor("bloom-mip", &desc);
        assert_eq!(tex.mip_level_count, 1);
        assert_eq!(tex.size.width, 640);
        assert!(tex.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
    }
}
