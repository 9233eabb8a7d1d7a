//! GPU side of the colormaps: a uniform block and the WGSL sampler.

use std::fmt::Write;

use bytemuck::{Pod, Zeroable};

use crate::kind::{ColormapKind, COOL_WARM, MAGMA, RAINBOW_HUE_SPAN, VIRIDIS};
use crate::scale::ColorScale;

/// Uniform block consumed by the WGSL sampler.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuColormapParams {
    /// [`ColormapKind::index`] of the active map.
    pub kind: u32,
    /// Padding for alignment.
    pub _pad: u32,
    /// Value mapped to `t = 0`.
    pub min: f32,
    /// Value mapped to `t = 1`.
    pub max: f32,
}

impl GpuColormapParams {
    /// Pack a scale for upload.
    pub fn from_scale(scale: &ColorScale) -> Self {
        Self {
            kind: scale.kind.index(),
            _pad: 0,
            min: scale.min,
            max: scale.max,
        }
    }

    /// Raw bytes for a uniform buffer write.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

fn vec3(c: &[f32; 3]) -> String {
    format!("vec3<f32>({:?}, {:?}, {:?})", c[0], c[1], c[2])
}

fn table(out: &mut String, name: &str, anchors: &[[f32; 3]]) {
    let n = anchors.len();
    let entries: Vec<String> = anchors.iter().map(vec3).collect();
    let _ = writeln!(
        out,
        "var<private> {name}: array<vec3<f32>, {n}> = array<vec3<f32>, {n}>(\n    {}\n);",
        entries.join(",\n    ")
    );
}

const SAMPLER_BODY: &str = r#"
fn colormap_lerp(a: vec3<f32>, b: vec3<f32>, f: f32) -> vec3<f32> {
    return a + (b - a) * f;
}

fn colormap_viridis(t: f32) -> vec3<f32> {
    let pos = t * 6.0;
    let i = min(u32(floor(pos)), 5u);
    return colormap_lerp(COLORMAP_VIRIDIS[i], COLORMAP_VIRIDIS[i + 1u], pos - f32(i));
}

fn colormap_magma(t: f32) -> vec3<f32> {
    let pos = t * 4.0;
    let i = min(u32(floor(pos)), 3u);
    return colormap_lerp(COLORMAP_MAGMA[i], COLORMAP_MAGMA[i + 1u], pos - f32(i));
}

fn colormap_cool_warm(t: f32) -> vec3<f32> {
    if (t < 0.5) {
        return colormap_lerp(COLORMAP_COOL_WARM[0], COLORMAP_COOL_WARM[1], t * 2.0);
    }
    return colormap_lerp(COLORMAP_COOL_WARM[1], COLORMAP_COOL_WARM[2], t * 2.0 - 1.0);
}

fn colormap_blue_green_red(t: f32) -> vec3<f32> {
    if (t < 0.5) {
        let s = t * 2.0;
        return vec3<f32>(0.0, s, 1.0 - s);
    }
    let s = t * 2.0 - 1.0;
    return vec3<f32>(s, 1.0 - s, 0.0);
}

fn colormap_rainbow(t: f32) -> vec3<f32> {
    let h = (1.0 - t) * COLORMAP_HUE_SPAN * 6.0;
    let sector = floor(h);
    let f = h - sector;
    let q = 1.0 - f;
    switch u32(sector) {
        case 0u: { return vec3<f32>(1.0, f, 0.0); }
        case 1u: { return vec3<f32>(q, 1.0, 0.0); }
        case 2u: { return vec3<f32>(0.0, 1.0, f); }
        case 3u: { return vec3<f32>(0.0, q, 1.0); }
        case 4u: { return vec3<f32>(f, 0.0, 1.0); }
        default: { return vec3<f32>(1.0, 0.0, q); }
    }
}

// kind follows ColormapKind::index on the CPU.
fn colormap_sample(kind: u32, t_in: f32) -> vec3<f32> {
    var t = t_in;
    // NaN test on the bit pattern
    if ((bitcast<u32>(t) & 0x7fffffffu) > 0x7f800000u) {
        t = 0.0;
    }
    t = clamp(t, 0.0, 1.0);
    switch kind {
        case 0u: { return colormap_blue_green_red(t); }
        case 1u: { return colormap_rainbow(t); }
        case 2u: { return colormap_cool_warm(t); }
        case 3u: { return colormap_viridis(t); }
        case 4u: { return colormap_magma(t); }
        default: { return vec3<f32>(t, t, t); }
    }
}

fn colormap_value(params: ColormapParams, value: f32) -> vec3<f32> {
    let span = params.max - params.min;
    var t = 0.5;
    if (span > 0.0) {
        t = (value - params.min) / span;
    }
    return colormap_sample(params.kind, t);
}
"#;

/// WGSL source for `colormap_sample(kind, t)` and
/// `colormap_value(params, value)`.
///
/// The anchor tables are emitted from the same constants the CPU sampler
/// reads, so both sides interpolate identical data.
pub fn wgsl_source() -> String {
    let mut out = String::from("// Generated by tessera-kernel-colormap.\n\n");
    out.push_str(
        "struct ColormapParams {\n    kind: u32,\n    _pad: u32,\n    min: f32,\n    max: f32,\n};\n\n",
    );
    let _ = writeln!(out, "const COLORMAP_HUE_SPAN: f32 = {:?};\n", RAINBOW_HUE_SPAN);
    table(&mut out, "COLORMAP_VIRIDIS", &VIRIDIS);
    table(&mut out, "COLORMAP_MAGMA", &MAGMA);
    table(&mut out, "COLORMAP_COOL_WARM", &COOL_WARM);
    out.push_str(SAMPLER_BODY);
    out
}

/// Number of maps the WGSL sampler understands.
pub const GPU_COLORMAP_COUNT: usize = ColormapKind::ALL.len();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_layout() {
        assert_eq!(std::mem::size_of::<GpuColormapParams>(), 16);
        let scale = ColorScale::new(ColormapKind::Magma, -1.0, 3.0).unwrap();
        let params = GpuColormapParams::from_scale(&scale);
        assert_eq!(params.kind, 4);
        let bytes = params.as_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[8..12], &(-1.0f32).to_ne_bytes());
    }

    #[test]
    fn test_wgsl_carries_cpu_tables() {
        let src = wgsl_source();
        for anchor in VIRIDIS.iter().chain(&MAGMA).chain(&COOL_WARM) {
            assert!(src.contains(&vec3(anchor)), "missing {anchor:?}");
        }
        assert!(src.contains("array<vec3<f32>, 7>"));
        assert!(src.contains("array<vec3<f32>, 5>"));
        assert!(src.contains("fn colormap_sample(kind: u32, t_in: f32)"));
        assert!(src.contains("(bitcast<u32>(t) & 0x7fffffffu) > 0x7f800000u"));
        assert!(!src.contains("t != t"));
        // One switch arm per non-default map
        for kind in &ColormapKind::ALL[..GPU_COLORMAP_COUNT - 1] {
            assert!(src.contains(&format!("case {}u:", kind.index())));
        }
    }

    #[test]
    fn test_nan_mask_matches_f32_bits() {
        let is_nan = |t: f32| (t.to_bits() & 0x7fff_ffff) > 0x7f80_0000;
        assert!(is_nan(f32::NAN));
        assert!(is_nan(-f32::NAN));
        assert!(!is_nan(f32::INFINITY));
        assert!(!is_nan(f32::NEG_INFINITY));
        assert!(!is_nan(0.5));
        assert_eq!(ColormapKind::Viridis.sample(f32::NAN), ColormapKind::Viridis.sample(0.0));
    }

    #[test]
    fn test_float_literals_have_decimal_point() {
        assert_eq!(vec3(&[1.0, 0.0, 0.5]), "vec3<f32>(1.0, 0.0, 0.5)");
    }
}
