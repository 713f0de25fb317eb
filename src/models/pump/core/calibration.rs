//! Pixel ↔ physical coordinate mapping for a digitized chart.
//!
//! A chart image is calibrated by drawing a rectangle over its plotting area
//! and typing the physical values found at its edges: `x0`/`x1` for flow at the
//! left/right edges and `y0`/`y1` for head at the bottom/top edges.
//! Screen `y` grows downward while head grows upward, so the vertical axis is
//! inverted.
//!
//! # Degraded mode
//!
//! [`CoordinateMapper::to_physical`] and [`CoordinateMapper::to_pixel`] never
//! fail. With an invalid calibration they return `0.0` and the origin pixel
//! respectively. Callers must gate on [`CoordinateMapper::validate`] before
//! trusting those values; [`compute_coordinate_mapping`] does exactly that.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::rotor::{EfficiencyPoint, PhysicalPoint};

/// A point in image pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The calibrated plotting area, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Physical values at the edges of the calibrated rectangle.
///
/// `x0`/`x1` are the flows (m³/h) at the left/right edges and
/// `y0`/`y1` the heads (m) at the bottom/top edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationScale {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Chart axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal axis, flow.
    Flow,
    /// Vertical axis, head.
    Head,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flow => f.write_str("flow"),
            Self::Head => f.write_str("head"),
        }
    }
}

/// Errors describing an unusable calibration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// The rectangle has a non-positive width or height.
    #[error("calibration rectangle must have positive size, got {width}x{height}")]
    InvalidRectangle { width: i32, height: i32 },

    /// A scale value is `NaN` or infinite.
    #[error("calibration scale values must be finite")]
    NonFinite,

    /// Both ends of an axis map to the same physical value.
    #[error("calibration scale is degenerate on the {axis} axis")]
    DegenerateScale { axis: Axis },

    /// A digitized point lies outside the calibrated rectangle.
    #[error("point ({}, {}) lies outside the calibrated chart area", .point.x, .point.y)]
    OutsideChart { point: PixelPoint },
}

/// Bidirectional affine map between a pixel rectangle and physical units.
///
/// # Examples
///
/// ```
/// use pump_curves::models::pump::{Axis, CalibrationScale, CoordinateMapper, PixelPoint, PixelRect};
///
/// let mapper = CoordinateMapper::new(
///     PixelRect { left: 100, top: 50, width: 600, height: 400 },
///     CalibrationScale { x0: 0.0, y0: 0.0, x1: 60.0, y1: 40.0 },
/// );
/// assert!(mapper.is_valid());
///
/// assert_eq!(mapper.to_physical(400.0, Axis::Flow), 30.0);
/// assert_eq!(mapper.to_physical(50.0, Axis::Head), 40.0);
/// assert_eq!(mapper.to_pixel(30.0, 40.0), PixelPoint::new(400, 50));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateMapper {
    pub rect: PixelRect,
    pub scale: CalibrationScale,
}

impl CoordinateMapper {
    #[must_use]
    pub const fn new(rect: PixelRect, scale: CalibrationScale) -> Self {
        Self { rect, scale }
    }

    /// Checks that the rectangle and scale support conversion.
    ///
    /// # Errors
    ///
    /// Returns a [`CalibrationError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let PixelRect { width, height, .. } = self.rect;
        if width <= 0 || height <= 0 {
            return Err(CalibrationError::InvalidRectangle { width, height });
        }

        let CalibrationScale { x0, y0, x1, y1 } = self.scale;
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(CalibrationError::NonFinite);
        }
        if x1 == x0 {
            return Err(CalibrationError::DegenerateScale { axis: Axis::Flow });
        }
        if y1 == y0 {
            return Err(CalibrationError::DegenerateScale { axis: Axis::Head });
        }
        Ok(())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns `true` if the pixel lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, pixel: PixelPoint) -> bool {
        let PixelRect {
            left,
            top,
            width,
            height,
        } = self.rect;
        (left..=left + width).contains(&pixel.x) && (top..=top + height).contains(&pixel.y)
    }

    /// Converts a pixel coordinate along one axis to physical units.
    ///
    /// Returns `0.0` when the calibration is invalid.
    #[must_use]
    pub fn to_physical(&self, coordinate: f64, axis: Axis) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }

        let PixelRect {
            left,
            top,
            width,
            height,
        } = self.rect;
        let CalibrationScale { x0, y0, x1, y1 } = self.scale;

        match axis {
            Axis::Flow => x0 + (coordinate - f64::from(left)) * (x1 - x0) / f64::from(width),
            Axis::Head => y1 - (coordinate - f64::from(top)) * (y1 - y0) / f64::from(height),
        }
    }

    /// Converts a pixel point to `(flow, head)`.
    ///
    /// Returns `(0.0, 0.0)` when the calibration is invalid.
    #[must_use]
    pub fn pixel_to_physical(&self, pixel: PixelPoint) -> (f64, f64) {
        (
            self.to_physical(f64::from(pixel.x), Axis::Flow),
            self.to_physical(f64::from(pixel.y), Axis::Head),
        )
    }

    /// Converts a physical `(flow, head)` pair to the nearest pixel.
    ///
    /// Returns the origin pixel when the calibration is invalid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pixel(&self, flow: f64, head: f64) -> PixelPoint {
        if !self.is_valid() {
            return PixelPoint::default();
        }

        let PixelRect {
            left,
            top,
            width,
            height,
        } = self.rect;
        let CalibrationScale { x0, y0, x1, y1 } = self.scale;

        let x = f64::from(left) + (flow - x0) * f64::from(width) / (x1 - x0);
        let y = f64::from(top) + (y1 - head) * f64::from(height) / (y1 - y0);
        PixelPoint::new(x.round() as i32, y.round() as i32)
    }
}

/// Converts digitized points to physical points.
///
/// # Errors
///
/// Returns a [`CalibrationError`] if the calibration is invalid.
pub fn compute_coordinate_mapping(
    mapper: &CoordinateMapper,
    points: &[EfficiencyPoint],
) -> Result<Vec<PhysicalPoint>, CalibrationError> {
    mapper.validate()?;
    Ok(points
        .iter()
        .map(|point| {
            let (flow, head) = mapper.pixel_to_physical(point.position());
            PhysicalPoint::new_unchecked(flow, head, point.efficiency())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::pump::core::test_support::chart_mapper;

    #[test]
    fn maps_corners() {
        let mapper = chart_mapper();
        assert_relative_eq!(mapper.to_physical(100.0, Axis::Flow), 0.0);
        assert_relative_eq!(mapper.to_physical(700.0, Axis::Flow), 60.0);
        assert_relative_eq!(mapper.to_physical(450.0, Axis::Head), 0.0);
        assert_relative_eq!(mapper.to_physical(50.0, Axis::Head), 40.0);
    }

    #[test]
    fn head_axis_is_inverted() {
        let mapper = chart_mapper();
        let upper = mapper.to_physical(100.0, Axis::Head);
        let lower = mapper.to_physical(300.0, Axis::Head);
        assert!(upper > lower);
    }

    #[test]
    fn round_trips_inside_rectangle() {
        let mapper = chart_mapper();
        for x in (100..=700).step_by(37) {
            for y in (50..=450).step_by(29) {
                let pixel = PixelPoint::new(x, y);
                let (flow, head) = mapper.pixel_to_physical(pixel);
                let back = mapper.to_pixel(flow, head);
                assert!((back.x - x).abs() <= 1, "x {x} -> {}", back.x);
                assert!((back.y - y).abs() <= 1, "y {y} -> {}", back.y);
            }
        }
    }

    #[test]
    fn invalid_calibration_degrades_to_zero() {
        let mut mapper = chart_mapper();
        mapper.rect.width = 0;
        assert_eq!(
            mapper.validate(),
            Err(CalibrationError::InvalidRectangle {
                width: 0,
                height: 400
            })
        );
        assert_relative_eq!(mapper.to_physical(400.0, Axis::Flow), 0.0);
        assert_eq!(mapper.to_pixel(10.0, 10.0), PixelPoint::default());

        let mut mapper = chart_mapper();
        mapper.scale.y1 = mapper.scale.y0;
        assert_eq!(
            mapper.validate(),
            Err(CalibrationError::DegenerateScale { axis: Axis::Head })
        );
        assert_relative_eq!(mapper.to_physical(100.0, Axis::Head), 0.0);
    }

    #[test]
    fn mapping_requires_valid_calibration() {
        let points = [EfficiencyPoint::new(PixelPoint::new(400, 250), 65.0).unwrap()];

        let physical = compute_coordinate_mapping(&chart_mapper(), &points).unwrap();
        assert_relative_eq!(physical[0].flow(), 30.0);
        assert_relative_eq!(physical[0].head(), 20.0);
        assert_relative_eq!(physical[0].efficiency(), 65.0);

        let err = compute_coordinate_mapping(&CoordinateMapper::default(), &points).unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidRectangle { .. }));
    }

    #[test]
    fn contains_includes_edges() {
        let mapper = chart_mapper();
        assert!(mapper.contains(PixelPoint::new(100, 50)));
        assert!(mapper.contains(PixelPoint::new(700, 450)));
        assert!(!mapper.contains(PixelPoint::new(99, 200)));
        assert!(!mapper.contains(PixelPoint::new(300, 451)));
    }
}
