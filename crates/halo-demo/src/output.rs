//! Tonemapping and PNG output.

use std::path::{Path, PathBuf};

use glam::{Vec3, Vec4Swizzles};
use halo_soft::Image;
use image::{Rgba, RgbaImage};

use crate::error::DemoError;

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Reinhard-tonemap `hdr` at `exposure` into 8-bit sRGB.
pub fn tonemap(hdr: &Image, exposure: f32) -> RgbaImage {
    RgbaImage::from_fn(hdr.width(), hdr.height(), |x, y| {
        let p = hdr.pixel(x, y);
        let c = (p.xyz() * exposure).max(Vec3::ZERO);
        let mapped = c / (Vec3::ONE + c);
        let to_u8 = |v: f32| (linear_to_srgb(v).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([
            to_u8(mapped.x),
            to_u8(mapped.y),
            to_u8(mapped.z),
            (p.w.clamp(0.0, 1.0) * 255.0).round() as u8,
        ])
    })
}

/// Tonemap and write `hdr` as PNG, creating parent directories.
pub fn write_png(hdr: &Image, exposure: f32, path: &Path) -> Result<(), DemoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DemoError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    tonemap(hdr, exposure)
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| DemoError::Image {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// `bloom.png` -> `bloom-reference.png`.
pub fn reference_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    path.with_file_name(format!("{stem}-reference.png"))
}

#[cfg(test)]
mod tests {
    use glam::Vec4;
    use halo_bloom::PixelFormat;

    use super::*;

    #[test]
    fn test_tonemap_range() {
        let hdr = Image::from_fn(3, 1, PixelFormat::Rgba32Float, |x, _| match x {
            0 => Vec4::new(0.0, 0.0, 0.0, 1.0),
            1 => Vec4::new(1.0, 1.0, 1.0, 1.0),
            _ => Vec4::new(1000.0, 1000.0, 1000.0, 0.5),
        });
        let ldr = tonemap(&hdr, 1.0);
        assert_eq!(ldr.get_pixel(0, 0).0, [0, 0, 0, 255]);
        // 0.5 linear in sRGB.
        assert_eq!(ldr.get_pixel(1, 0).0[0], 188);
        assert_eq!(ldr.get_pixel(2, 0).0, [255, 255, 255, 128]);
    }

    #[test]
    fn test_reference_path() {
        assert_eq!(
            reference_path(Path::new("out/bloom.png")),
            PathBuf::from("out/bloom-reference.png")
        );
    }

    #[test]
    fn test_write_png_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames").join("glow.png");
        let hdr = Image::filled(8, 4, PixelFormat::Rgba16Float, Vec4::new(2.0, 0.5, 0.1, 1.0));
        write_png(&hdr, 1.0, &path).unwrap();

        let read = image::open(&path).unwrap().to_rgba8();
        assert_eq!(read.dimensions(), (8, 4));
    }
}
