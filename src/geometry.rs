//! Geometry mapper.
//! Translates the calibrated reference layout onto the actual capture resolution.
//! Two policies are supported (see `GeometryPolicy`); they agree on 16:9 captures and
//! diverge on ultrawide or portrait ones.

use crate::config::{GeometryPolicy, ScanConfig};
use crate::error::ScanError;
use serde::Serialize;

/// Layout of the board grid in capture pixels, derived once per scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Geometry {
    /// Center of cell (0,0)
    pub origin_x: f64,
    pub origin_y: f64,
    /// Center of cell (9,8)
    pub extent_x: f64,
    pub extent_y: f64,
    pub cell_size: f64,
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Capture dimensions the layout was mapped onto
    pub image_width: u32,
    pub image_height: u32,
}

impl Geometry {
    /// Maps the reference layout in `config` onto a `width` x `height` capture.
    pub fn map(width: u32, height: u32, config: &ScanConfig) -> Result<Self, ScanError> {
        if width == 0 || height == 0 {
            return Err(ScanError::DegenerateImage { width, height });
        }
        config.validate()?;

        let (w, h) = (f64::from(width), f64::from(height));
        let (wr, hr) = (f64::from(config.reference_width), f64::from(config.reference_height));
        let (sx, sy) = (w / wr, h / hr);

        let (scale, offset_x, offset_y) = match config.geometry {
            GeometryPolicy::UniformAverage => ((sx + sy) / 2.0, 0.0, 0.0),
            GeometryPolicy::AspectFit => {
                if sx > sy {
                    // Wider than the reference: height binds, pad left/right.
                    (sy, (w - wr * sy) / 2.0, 0.0)
                } else {
                    (sx, 0.0, (h - hr * sx) / 2.0)
                }
            }
        };
        if !(scale > 0.0) {
            return Err(ScanError::DegenerateImage { width, height });
        }

        let l = &config.layout;
        Ok(Self {
            origin_x: l.start_x * scale + offset_x,
            origin_y: l.start_y * scale + offset_y,
            extent_x: l.end_x * scale + offset_x,
            extent_y: l.end_y * scale + offset_y,
            cell_size: l.cell_size * scale,
            scale,
            offset_x,
            offset_y,
            image_width: width,
            image_height: height,
        })
    }

    pub fn board_width(&self) -> f64 {
        self.extent_x - self.origin_x
    }

    pub fn board_height(&self) -> f64 {
        self.extent_y - self.origin_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(policy: GeometryPolicy) -> ScanConfig {
        ScanConfig { geometry: policy, ..ScanConfig::default() }
    }

    #[test]
    fn test_reference_resolution_is_identity() {
        for policy in [GeometryPolicy::UniformAverage, GeometryPolicy::AspectFit] {
            let g = Geometry::map(1920, 1080, &config(policy)).unwrap();
            assert_eq!(g.scale, 1.0);
            assert_eq!((g.offset_x, g.offset_y), (0.0, 0.0));
            assert_eq!((g.origin_x, g.origin_y), (177.0, 103.0));
            assert_eq!((g.extent_x, g.extent_y), (920.0, 930.0));
            assert_eq!(g.cell_size, 55.0);
        }
    }

    #[test]
    fn test_double_resolution_scales_by_two() {
        let g = Geometry::map(3840, 2160, &config(GeometryPolicy::UniformAverage)).unwrap();
        assert_eq!(g.scale, 2.0);
        assert_eq!((g.offset_x, g.offset_y), (0.0, 0.0));
        assert_eq!((g.origin_x, g.origin_y), (354.0, 206.0));
        assert_eq!((g.extent_x, g.extent_y), (1840.0, 1860.0));
        assert_eq!(g.cell_size, 110.0);
    }

    #[test]
    fn test_uniform_average_on_ultrawide() {
        let g = Geometry::map(2560, 1080, &config(GeometryPolicy::UniformAverage)).unwrap();
        assert_relative_eq!(g.scale, (2560.0 / 1920.0 + 1.0) / 2.0);
        assert_eq!(g.offset_x, 0.0);
    }

    #[test]
    fn test_aspect_fit_centers_ultrawide() {
        let g = Geometry::map(2560, 1080, &config(GeometryPolicy::AspectFit)).unwrap();
        assert_eq!(g.scale, 1.0);
        assert_eq!(g.offset_x, 320.0);
        assert_eq!(g.offset_y, 0.0);
        assert_eq!(g.origin_x, 497.0);
        assert_eq!(g.origin_y, 103.0);
    }

    #[test]
    fn test_aspect_fit_centers_portrait() {
        let g = Geometry::map(1080, 1920, &config(GeometryPolicy::AspectFit)).unwrap();
        assert_relative_eq!(g.scale, 0.5625);
        assert_eq!(g.offset_x, 0.0);
        assert_relative_eq!(g.offset_y, 656.25);
        assert_relative_eq!(g.origin_y, 103.0 * 0.5625 + 656.25);
        assert_relative_eq!(g.cell_size, 55.0 * 0.5625);
    }

    #[test]
    fn test_degenerate_image_is_rejected() {
        let cfg = ScanConfig::default();
        assert_eq!(
            Geometry::map(0, 1080, &cfg),
            Err(ScanError::DegenerateImage { width: 0, height: 1080 })
        );
        assert!(Geometry::map(1920, 0, &cfg).is_err());
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let cfg = config(GeometryPolicy::AspectFit);
        assert_eq!(Geometry::map(1366, 768, &cfg), Geometry::map(1366, 768, &cfg));
    }
}
