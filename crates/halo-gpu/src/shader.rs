//! Built-in WGSL for the five bloom passes.

/// Entry point of the shared fullscreen-triangle vertex stage.
pub const VERTEX_ENTRY: &str = "vs_fullscreen";

/// Fragment entry points in pass-index order.
pub const FRAGMENT_ENTRIES: [&str; 5] = [
    "fs_prefilter",
    "fs_downsample",
    "fs_upsample",
    "fs_final",
    "fs_combine",
];

/// WGSL source for all bloom passes. Every pass binds the same group layout:
///
/// | binding | resource |
/// |---|---|
/// | 0 | `PassUniform` |
/// | 1, 2 | blit source texture and sampler |
/// | 3 | scene color (combine only) |
/// | 4, 5 | dither noise texture and repeating sampler (combine only) |
pub const BLOOM_SHADER_SOURCE: &str = r#"
struct PassUniform {
    // threshold, knee start, knee width, knee scale
    curve: vec4<f32>,
    texel_size: vec2<f32>,
    intensity: f32,
    _pad: f32,
    // xy: noise scale, z: 1.0 when noise is bound
    noise: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0) var<uniform> params: PassUniform;
@group(0) @binding(1) var source_tex: texture_2d<f32>;
@group(0) @binding(2) var source_sampler: sampler;
@group(0) @binding(3) var scene_tex: texture_2d<f32>;
@group(0) @binding(4) var noise_tex: texture_2d<f32>;
@group(0) @binding(5) var noise_sampler: sampler;

@vertex
fn vs_fullscreen(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

fn sample_source(uv: vec2<f32>) -> vec3<f32> {
    return textureSampleLevel(source_tex, source_sampler, uv, 0.0).rgb;
}

fn box4(uv: vec2<f32>, texel: vec2<f32>) -> vec3<f32> {
    let a = sample_source(uv + vec2(-texel.x, -texel.y));
    let b = sample_source(uv + vec2( texel.x, -texel.y));
    let c = sample_source(uv + vec2(-texel.x,  texel.y));
    let d = sample_source(uv + vec2( texel.x,  texel.y));
    return (a + b + c + d) * 0.25;
}

fn tent9(uv: vec2<f32>, texel: vec2<f32>) -> vec3<f32> {
    var acc = sample_source(uv) * 4.0;
    acc += sample_source(uv + vec2(-texel.x, 0.0)) * 2.0;
    acc += sample_source(uv + vec2( texel.x, 0.0)) * 2.0;
    acc += sample_source(uv + vec2(0.0, -texel.y)) * 2.0;
    acc += sample_source(uv + vec2(0.0,  texel.y)) * 2.0;
    acc += sample_source(uv + vec2(-texel.x, -texel.y));
    acc += sample_source(uv + vec2( texel.x, -texel.y));
    acc += sample_source(uv + vec2(-texel.x,  texel.y));
    acc += sample_source(uv + vec2( texel.x,  texel.y));
    return acc / 16.0;
}

@fragment
fn fs_prefilter(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = sample_source(in.uv);
    let brightness = max(color.r, max(color.g, color.b));
    var rq = clamp(brightness - params.curve.y, 0.0, params.curve.z);
    rq = params.curve.w * rq * rq;
    let factor = max(rq, brightness - params.curve.x) / max(brightness, 1e-5);
    return vec4<f32>(color * factor, 1.0);
}

@fragment
fn fs_downsample(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(box4(in.uv, params.texel_size), 1.0);
}

@fragment
fn fs_upsample(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(tent9(in.uv, params.texel_size), 1.0);
}

@fragment
fn fs_final(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(tent9(in.uv, params.texel_size) * params.intensity, 1.0);
}

@fragment
fn fs_combine(in: VertexOutput) -> @location(0) vec4<f32> {
    let scene = textureSampleLevel(scene_tex, source_sampler, in.uv, 0.0);
    let bloom = sample_source(in.uv);
    let n = textureSampleLevel(noise_tex, noise_sampler, in.uv * params.noise.xy, 0.0).r;
    let dither = select(0.0, (n - 0.5) / 255.0, params.noise.z > 0.5);
    return vec4<f32>(scene.rgb + bloom + vec3<f32>(dither), scene.a);
}
"#;

/// Entry points from `entries` that `source` does not define.
pub fn missing_entry_points<'a>(source: &str, entries: &[&'a str]) -> Vec<&'a str> {
    entries
        .iter()
        .copied()
        .filter(|entry| entry.is_empty() || !source.contains(&format!("fn {entry}(")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_source_defines_every_entry() {
        let mut entries = FRAGMENT_ENTRIES.to_vec();
        entries.push(VERTEX_ENTRY);
        assert!(missing_entry_points(BLOOM_SHADER_SOURCE, &entries).is_empty());
    }

    #[test]
    fn test_missing_entries_are_reported() {
        let missing = missing_entry_points("fn fs_a(x: f32) {}", &["fs_a", "fs_b", ""]);
        assert_eq!(missing, vec!["fs_b", ""]);
    }

    #[test]
    fn test_uniform_struct_is_declared_once() {
        assert_eq!(BLOOM_SHADER_SOURCE.matches("struct PassUniform").count(), 1);
    }
}
