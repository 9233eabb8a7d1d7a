#![warn(missing_docs)]

//! Continuous colormaps for the tessera kernel.
//!
//! Deviation fields and curvature values are shown by sampling a
//! [`ColormapKind`] at a normalized position. [`sample`] is the CPU
//! reference; [`wgsl_source`] emits the same tables and arithmetic for the
//! GPU so both paths agree up to rounding.
//!
//! ```
//! use tessera_kernel_colormap::{sample, ColorScale, ColormapKind};
//!
//! assert_eq!(sample(ColormapKind::Grayscale, 0.25), [0.25, 0.25, 0.25]);
//! let scale = ColorScale::symmetric(ColormapKind::CoolWarm, 0.2).unwrap();
//! assert_eq!(scale.normalize(0.0), 0.5);
//! ```

mod error;
mod gpu;
mod kind;
mod scale;

pub use error::{ColormapError, Result};
pub use gpu::{wgsl_source, GpuColormapParams, GPU_COLORMAP_COUNT};
pub use kind::{sample, sample_u8, ColormapKind};
pub use scale::{colorize, ColorScale};
