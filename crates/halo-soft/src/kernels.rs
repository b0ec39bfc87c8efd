//! CPU versions of the five bloom kernels.
//!
//! Each kernel shades every pixel of the destination by sampling its inputs
//! at the destination pixel's texture coordinate.

use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use halo_bloom::{BloomPass, PassParams};

use crate::image::{AddressMode, Image};

/// Everything a kernel may read.
pub struct PassInputs<'a> {
    /// Blit source.
    pub src: &'a Image,
    pub params: &'a PassParams,
    /// Scene color for the combine pass.
    pub scene: Option<&'a Image>,
    pub noise: Option<&'a Image>,
}

pub type Kernel = fn(&PassInputs<'_>, &mut Image);

/// Kernel implementing `pass`.
pub fn kernel_for(pass: BloomPass) -> Kernel {
    match pass {
        BloomPass::Prefilter => prefilter,
        BloomPass::Downsample => downsample,
        BloomPass::Upsample => upsample,
        BloomPass::Final => final_pass,
        BloomPass::Combine => combine,
    }
}

fn shade(dst: &mut Image, mut f: impl FnMut(Vec2, Vec4) -> Vec4) {
    for y in 0..dst.height() {
        for x in 0..dst.width() {
            let uv = dst.uv(x, y);
            let current = dst.pixel(x, y);
            dst.store(x, y, f(uv, current));
        }
    }
}

fn box4(src: &Image, uv: Vec2, texel: Vec2) -> Vec3 {
    let taps = [
        Vec2::new(-1.0, -1.0),
        Vec2::new(1.0, -1.0),
        Vec2::new(-1.0, 1.0),
        Vec2::new(1.0, 1.0),
    ];
    taps.iter()
        .map(|&o| src.sample(uv + o * texel, AddressMode::Clamp).xyz())
        .sum::<Vec3>()
        * 0.25
}

fn tent9(src: &Image, uv: Vec2, texel: Vec2) -> Vec3 {
    let mut acc = Vec3::ZERO;
    for dy in -1..=1 {
        for dx in -1..=1 {
            let weight = ((2 - dx * dx) * (2 - dy * dy)) as f32;
            let offset = Vec2::new(dx as f32, dy as f32) * texel;
            acc += src.sample(uv + offset, AddressMode::Clamp).xyz() * weight;
        }
    }
    acc / 16.0
}

fn prefilter(inputs: &PassInputs<'_>, dst: &mut Image) {
    let PassParams::Prefilter { curve } = *inputs.params else {
        return;
    };
    shade(dst, |uv, _| {
        let color = inputs.src.sample(uv, AddressMode::Clamp).xyz();
        let response = curve.response(color.max_element());
        (color * response).extend(1.0)
    });
}

fn downsample(inputs: &PassInputs<'_>, dst: &mut Image) {
    let PassParams::Downsample { texel_size } = *inputs.params else {
        return;
    };
    shade(dst, |uv, _| box4(inputs.src, uv, texel_size).extend(1.0));
}

fn upsample(inputs: &PassInputs<'_>, dst: &mut Image) {
    let PassParams::Upsample { texel_size } = *inputs.params else {
        return;
    };
    shade(dst, |uv, current| {
        (current.xyz() + tent9(inputs.src, uv, texel_size)).extend(1.0)
    });
}

fn final_pass(inputs: &PassInputs<'_>, dst: &mut Image) {
    let PassParams::Final {
        intensity,
        texel_size,
    } = *inputs.params
    else {
        return;
    };
    shade(dst, |uv, _| {
        (tent9(inputs.src, uv, texel_size) * intensity).extend(1.0)
    });
}

fn combine(inputs: &PassInputs<'_>, dst: &mut Image) {
    let PassParams::Combine { noise, .. } = *inputs.params else {
        return;
    };
    let scale = noise.map_or(Vec2::ONE, |n| n.scale);
    shade(dst, |uv, current| {
        let scene = inputs
            .scene
            .map_or(current, |s| s.sample(uv, AddressMode::Clamp));
        let bloom = inputs.src.sample(uv, AddressMode::Clamp).xyz();
        let dither = inputs.noise.map_or(0.0, |n| {
            (n.sample(uv * scale, AddressMode::Repeat).x - 0.5) / 255.0
        });
        (scene.xyz() + bloom + Vec3::splat(dither)).extend(scene.w)
    });
}
