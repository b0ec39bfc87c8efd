use glam::Vec4;
use halo_bloom::PixelFormat;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::image::Image;

/// Seeded white noise in `[0, 1)`, one value per texel broadcast to RGB.
///
/// Point sampled, so neighbouring screen pixels never blend noise texels.
pub fn white_noise(width: u32, height: u32, seed: u64) -> Image {
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
    let mut image = Image::from_fn(width, height, PixelFormat::Rgba32Float, |_, _| {
        let v: f32 = rng.gen_range(0.0..1.0);
        Vec4::new(v, v, v, 1.0)
    });
    image.set_filter(halo_bloom::FilterMode::Point);
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_seeded() {
        assert_eq!(white_noise(8, 8, 3), white_noise(8, 8, 3));
        assert_ne!(white_noise(8, 8, 3), white_noise(8, 8, 4));
    }

    #[test]
    fn test_noise_is_centered() {
        let noise = white_noise(64, 64, 1);
        let mean = noise.pixels().iter().map(|p| p.x).sum::<f32>() / 4096.0;
        assert!((mean - 0.5).abs() < 0.05, "mean {mean}");
        assert!(noise.pixels().iter().all(|p| (0.0..1.0).contains(&p.x)));
    }
}
