//! Seeded synthetic HDR scenes.

use glam::{Vec2, Vec3, Vec4Swizzles};
use halo_bloom::PixelFormat;
use halo_config::SceneConfig;
use halo_soft::Image;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// A round light with a gaussian falloff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub center: Vec2,
    pub radius: f32,
    pub color: Vec3,
}

impl Light {
    fn radiance(&self, p: Vec2) -> Vec3 {
        let d2 = p.distance_squared(self.center);
        self.color * (-d2 / (self.radius * self.radius)).exp()
    }
}

/// Scatter `config.lights` lights over the viewport.
pub fn scatter_lights(config: &SceneConfig) -> Vec<Light> {
    let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed);
    let w = config.width.max(1) as f32;
    let h = config.height.max(1) as f32;
    (0..config.lights)
        .map(|_| {
            let tint = Vec3::new(
                rng.gen_range(0.6..=1.0),
                rng.gen_range(0.6..=1.0),
                rng.gen_range(0.6..=1.0),
            );
            Light {
                center: Vec2::new(rng.gen_range(0.0..w), rng.gen_range(0.0..h)),
                radius: rng.gen_range(1.5..6.0),
                color: tint * config.light_intensity * rng.gen_range(0.5..=1.0),
            }
        })
        .collect()
}

/// Render the scene as linear HDR color with opaque alpha.
pub fn render(config: &SceneConfig, format: PixelFormat) -> Image {
    let lights = scatter_lights(config);
    let height = config.height.max(1) as f32;
    Image::from_fn(config.width, config.height, format, |x, y| {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        // Dim vertical gradient, brighter toward the top.
        let sky = config.background * (1.5 - p.y / height);
        let color = lights
            .iter()
            .fold(Vec3::splat(sky), |acc, light| acc + light.radiance(p));
        color.extend(1.0)
    })
}

/// Brightest channel over the whole image.
pub fn peak(image: &Image) -> f32 {
    image
        .pixels()
        .iter()
        .map(|p| p.xyz().max_element())
        .fold(0.0, f32::max)
}
