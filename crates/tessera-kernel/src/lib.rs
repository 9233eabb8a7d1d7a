#![warn(missing_docs)]

//! Geometry kernel facade for the tessera CAD app.
//!
//! Re-exports the kernel crates and adds the glue between them: lifting
//! section polylines onto a sketch plane, coloring deviation fields, and a
//! single [`KernelConfig`] that carries every subsystem's settings.
//!
//! # Example
//!
//! ```
//! use tessera_kernel::{sketch_from_section, tessera_kernel_mesh, tessera_kernel_section};
//! use tessera_kernel_section::{section_mesh, SectionOptions, SectionPlane};
//!
//! let cube = tessera_kernel_mesh::unit_cube();
//! let section = section_mesh(&cube, &SectionPlane::xy(0.5), &SectionOptions::default());
//! let sketch = sketch_from_section("mid", &section).unwrap();
//! assert_eq!(sketch.find_closed_loops().len(), 1);
//! ```

pub use tessera_kernel_colormap;
pub use tessera_kernel_constraints;
pub use tessera_kernel_deviation;
pub use tessera_kernel_math;
pub use tessera_kernel_mesh;
pub use tessera_kernel_section;
pub use tessera_kernel_sketch;
pub use tessera_kernel_spatial;

mod config;
mod error;

pub use config::KernelConfig;
pub use error::ConfigError;

use tessera_kernel_colormap::{colorize, ColorScale, ColormapKind};
use tessera_kernel_deviation::DeviationResult;
use tessera_kernel_math::Tolerance;
use tessera_kernel_section::{Polyline, SectionResult};
use tessera_kernel_sketch::{Line, Sketch, SketchError, SketchPlane};
use tracing::debug;

/// Build a sketch from 3-D polylines by projecting them onto `plane`.
///
/// Every polyline becomes a chain of line entities, closed ones including
/// the closing segment. Segments shorter than the default linear tolerance
/// after projection are dropped.
pub fn sketch_from_polylines(
    name: impl Into<String>,
    plane: SketchPlane,
    polylines: &[Polyline],
) -> Sketch {
    let mut sketch = Sketch::new(name, plane);
    let tol = Tolerance::DEFAULT.linear;
    let mut skipped = 0usize;
    for polyline in polylines {
        for (a, b) in polyline.segments() {
            let (a, b) = (plane.to_local(&a), plane.to_local(&b));
            if (b - a).norm() <= tol {
                skipped += 1;
                continue;
            }
            sketch.add(Line::new(a, b));
        }
    }
    debug!(
        polylines = polylines.len(),
        entities = sketch.len(),
        skipped,
        "sketch seeded from polylines"
    );
    sketch
}

/// Sketch on the section plane holding the section's polylines.
pub fn sketch_from_section(
    name: impl Into<String>,
    section: &SectionResult,
) -> Result<Sketch, SketchError> {
    let plane = SketchPlane::from_normal(section.plane.origin, section.plane.normal.into_inner())?;
    Ok(sketch_from_polylines(name, plane, &section.polylines))
}

/// Color scale suited to a deviation field.
///
/// Signed fields get a scale symmetric about zero; unsigned ones run from
/// zero to the largest distance.
pub fn deviation_scale(result: &DeviationResult, kind: ColormapKind) -> ColorScale {
    let max = result.max_abs();
    let scale = if result.signed {
        ColorScale::symmetric(kind, max)
    } else {
        ColorScale::new(kind, 0.0, max)
    };
    scale.unwrap_or(ColorScale {
        kind,
        ..ColorScale::default()
    })
}

/// One color per source vertex of a deviation field.
pub fn deviation_colors(result: &DeviationResult, kind: ColormapKind) -> Vec<[f32; 3]> {
    colorize(&result.distances, &deviation_scale(result, kind))
}
