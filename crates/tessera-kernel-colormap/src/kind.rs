//! Named colormaps and their CPU sampler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColormapError;

/// Viridis anchors, evenly spaced over `[0, 1]`.
pub(crate) const VIRIDIS: [[f32; 3]; 7] = [
    [0.267004, 0.004874, 0.329415],
    [0.266667, 0.227451, 0.513725],
    [0.192157, 0.407843, 0.556863],
    [0.129412, 0.568627, 0.549020],
    [0.207843, 0.717647, 0.474510],
    [0.564706, 0.843137, 0.262745],
    [0.992157, 0.905882, 0.145098],
];

/// Magma anchors, evenly spaced over `[0, 1]`.
pub(crate) const MAGMA: [[f32; 3]; 5] = [
    [0.0, 0.0, 0.015686],
    [0.317647, 0.070588, 0.486275],
    [0.717647, 0.215686, 0.474510],
    [0.988235, 0.537255, 0.380392],
    [0.988235, 0.992157, 0.749020],
];

/// Cool blue, light gray, warm red.
pub(crate) const COOL_WARM: [[f32; 3]; 3] = [
    [0.230, 0.299, 0.754],
    [0.865, 0.865, 0.865],
    [0.706, 0.016, 0.150],
];

/// Hue span of the rainbow map, in turns.
pub(crate) const RAINBOW_HUE_SPAN: f32 = 0.8;

/// A continuous mapping from `[0, 1]` to RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColormapKind {
    /// Blue through green to red, linear in two halves.
    BlueGreenRed,
    /// HSV hue sweep from violet to red.
    Rainbow,
    /// Diverging blue to gray to red.
    CoolWarm,
    /// Perceptually uniform blue-green-yellow.
    #[default]
    Viridis,
    /// Perceptually uniform black-purple-cream.
    Magma,
    /// Black to white.
    Grayscale,
}

impl ColormapKind {
    /// Every colormap, in GPU index order.
    pub const ALL: [ColormapKind; 6] = [
        ColormapKind::BlueGreenRed,
        ColormapKind::Rainbow,
        ColormapKind::CoolWarm,
        ColormapKind::Viridis,
        ColormapKind::Magma,
        ColormapKind::Grayscale,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            ColormapKind::BlueGreenRed => "Blue-Green-Red",
            ColormapKind::Rainbow => "Rainbow",
            ColormapKind::CoolWarm => "Cool-Warm",
            ColormapKind::Viridis => "Viridis",
            ColormapKind::Magma => "Magma",
            ColormapKind::Grayscale => "Grayscale",
        }
    }

    /// Index used by the GPU sampler.
    pub fn index(self) -> u32 {
        match self {
            ColormapKind::BlueGreenRed => 0,
            ColormapKind::Rainbow => 1,
            ColormapKind::CoolWarm => 2,
            ColormapKind::Viridis => 3,
            ColormapKind::Magma => 4,
            ColormapKind::Grayscale => 5,
        }
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Color at `t`, clamped to `[0, 1]`. NaN samples as 0.
    pub fn sample(self, t: f32) -> [f32; 3] {
        sample(self, t)
    }
}

impl fmt::Display for ColormapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColormapKind {
    type Err = ColormapError;

    /// Case-insensitive; separators (`-`, `_`, space) are ignored, so
    /// `"cool_warm"`, `"CoolWarm"` and `"Cool-Warm"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "bluegreenred" | "bgr" => Ok(ColormapKind::BlueGreenRed),
            "rainbow" | "jet" => Ok(ColormapKind::Rainbow),
            "coolwarm" => Ok(ColormapKind::CoolWarm),
            "viridis" => Ok(ColormapKind::Viridis),
            "magma" => Ok(ColormapKind::Magma),
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(ColormapKind::Grayscale),
            _ => Err(ColormapError::UnknownColormap(s.to_string())),
        }
    }
}

/// Sample `kind` at `t`.
///
/// `t` is clamped to `[0, 1]`; NaN is treated as 0. The arithmetic is done
/// in `f32` in the same order as the WGSL sampler from
/// [`wgsl_source`](crate::wgsl_source).
pub fn sample(kind: ColormapKind, t: f32) -> [f32; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    match kind {
        ColormapKind::BlueGreenRed => blue_green_red(t),
        ColormapKind::Rainbow => rainbow(t),
        ColormapKind::CoolWarm => {
            if t < 0.5 {
                lerp(COOL_WARM[0], COOL_WARM[1], t * 2.0)
            } else {
                lerp(COOL_WARM[1], COOL_WARM[2], t * 2.0 - 1.0)
            }
        }
        ColormapKind::Viridis => anchors(&VIRIDIS, t),
        ColormapKind::Magma => anchors(&MAGMA, t),
        ColormapKind::Grayscale => [t, t, t],
    }
}

/// [`sample`] quantized to 8-bit channels.
pub fn sample_u8(kind: ColormapKind, t: f32) -> [u8; 3] {
    sample(kind, t).map(|c| (c * 255.0).round() as u8)
}

fn lerp(a: [f32; 3], b: [f32; 3], f: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * f,
        a[1] + (b[1] - a[1]) * f,
        a[2] + (b[2] - a[2]) * f,
    ]
}

/// Linear interpolation between evenly spaced anchors.
fn anchors(table: &[[f32; 3]], t: f32) -> [f32; 3] {
    let last = table.len() - 1;
    let pos = t * last as f32;
    let i = (pos.floor() as usize).min(last - 1);
    lerp(table[i], table[i + 1], pos - i as f32)
}

fn blue_green_red(t: f32) -> [f32; 3] {
    if t < 0.5 {
        let s = t * 2.0;
        [0.0, s, 1.0 - s]
    } else {
        let s = t * 2.0 - 1.0;
        [s, 1.0 - s, 0.0]
    }
}

/// HSV with full saturation and value; hue runs from violet down to red.
fn rainbow(t: f32) -> [f32; 3] {
    let h = (1.0 - t) * RAINBOW_HUE_SPAN * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let q = 1.0 - f;
    match sector as u32 {
        0 => [1.0, f, 0.0],
        1 => [q, 1.0, 0.0],
        2 => [0.0, 1.0, f],
        3 => [0.0, q, 1.0],
        4 => [f, 0.0, 1.0],
        _ => [1.0, 0.0, q],
    }
}
