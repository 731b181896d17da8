#![forbid(unsafe_code)]

//! Geometric primitives for wall-space and screen-space coordinates.
//!
//! Two coordinate systems exist side by side:
//!
//! - **Wall-space** ([`WallPoint`]): integer pixel coordinates on the physical
//!   panel grid. This is what the configuration document and the renderer
//!   process speak.
//! - **Screen-space** ([`ScreenPoint`]): real-valued coordinates on the
//!   scaled-down on-screen proxy of the wall.
//!
//! A single [`ScaleMultiplier`] maps one onto the other:
//! `screen = wall × scale`.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// Tolerance used when snapping a converted coordinate onto an integer.
///
/// Dividing a screen value that was produced by `wall × scale` can land a
/// hair below the original integer (`2.9999999999999996`). Truncating that
/// would lose a whole unit, so values this close to an integer snap to it.
const SNAP_EPSILON: f64 = 1e-6;

/// A point in wall-space (unscaled panel pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WallPoint {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl WallPoint {
    /// The origin.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a new wall point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Convert to the `[x, y]` pair used by wire documents.
    #[inline]
    #[must_use]
    pub const fn to_array(self) -> [i32; 2] {
        [self.x, self.y]
    }
}

impl From<[i32; 2]> for WallPoint {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x, y)
    }
}

impl Add for WallPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for WallPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

/// A point or offset in screen-space.
///
/// Used both for absolute positions (element locations, pointer positions)
/// and for relative offsets (drag deltas); the arithmetic is the same.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl ScreenPoint {
    /// The zero point / zero offset.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new screen point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both components are exactly zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for ScreenPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for ScreenPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The on-screen area available for the wall proxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Available width in screen units.
    pub width: f64,
    /// Available height in screen units.
    pub height: f64,
}

impl Viewport {
    /// Create a new viewport.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Bounding box of every panel on the wall, in wall-space.
///
/// `min_*` and `max_*` are both inclusive corner coordinates, so the extent
/// of a single 10×20 panel anchored at the origin is `0..=10` by `0..=20`
/// with `width() == 10` and `height() == 20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasExtent {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl CanvasExtent {
    /// An extent covering exactly one point.
    #[must_use]
    pub const fn from_point(p: WallPoint) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Grow the extent so it covers `p`.
    pub fn include(&mut self, p: WallPoint) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// `max_x - min_x`.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.max_x as i64 - self.min_x as i64
    }

    /// `max_y - min_y`.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i64 {
        self.max_y as i64 - self.min_y as i64
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub const fn min(&self) -> WallPoint {
        WallPoint::new(self.min_x, self.min_y)
    }

    /// Bottom-right corner.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> WallPoint {
        WallPoint::new(self.max_x, self.max_y)
    }

    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Check if a wall point lies inside the extent (edges inclusive).
    #[must_use]
    pub const fn contains(&self, p: WallPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Uniform wall-to-screen scale.
///
/// Always finite and strictly positive; construction rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ScaleMultiplier(f64);

impl ScaleMultiplier {
    /// Identity scale.
    pub const IDENTITY: Self = Self(1.0);

    /// Create a scale multiplier, rejecting zero, negative, and non-finite values.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    /// The tighter-fitting of the two axis ratios.
    ///
    /// Returns `None` if the viewport is invalid or the extent is degenerate.
    #[must_use]
    pub fn fit(viewport: Viewport, extent: &CanvasExtent) -> Option<Self> {
        if !viewport.is_valid() || extent.is_degenerate() {
            return None;
        }
        let sx = viewport.width / extent.width() as f64;
        let sy = viewport.height / extent.height() as f64;
        Self::new(sx.min(sy))
    }

    /// Raw multiplier value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Map a wall-space point to screen-space.
    #[must_use]
    pub fn to_screen(self, p: WallPoint) -> ScreenPoint {
        ScreenPoint::new(f64::from(p.x) * self.0, f64::from(p.y) * self.0)
    }

    /// Map a screen-space point back to wall-space, truncating toward zero.
    #[must_use]
    pub fn to_wall(self, p: ScreenPoint) -> WallPoint {
        WallPoint::new(truncate_to_wall(p.x / self.0), truncate_to_wall(p.y / self.0))
    }

    /// Express a screen point measured under `previous` in terms of `self`.
    ///
    /// Used when the topology (and therefore the scale) changes while
    /// elements are already placed.
    #[must_use]
    pub fn rescale_from(self, previous: Self, p: ScreenPoint) -> ScreenPoint {
        let ratio = self.0 / previous.0;
        ScreenPoint::new(p.x * ratio, p.y * ratio)
    }
}

impl Default for ScaleMultiplier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Truncate toward zero, snapping values within float noise of an integer.
fn truncate_to_wall(v: f64) -> i32 {
    if !v.is_finite() {
        return 0;
    }
    let nearest = v.round();
    let snapped = if (v - nearest).abs() < SNAP_EPSILON {
        nearest
    } else {
        v.trunc()
    };
    // `as` saturates for out-of-range floats.
    snapped as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_point_arithmetic() {
        let a = WallPoint::new(3, -4);
        let b = WallPoint::new(10, 20);
        assert_eq!(a + b, WallPoint::new(13, 16));
        assert_eq!(b - a, WallPoint::new(7, 24));
        assert_eq!(a.min(b), WallPoint::new(3, -4));
        assert_eq!(a.max(b), WallPoint::new(10, 20));
    }

    #[test]
    fn wall_point_saturates() {
        let p = WallPoint::new(i32::MAX, i32::MIN);
        assert_eq!(p + WallPoint::new(1, 0), WallPoint::new(i32::MAX, i32::MIN));
        assert_eq!(p - WallPoint::new(0, 1), WallPoint::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn extent_include_tracks_bounds() {
        let mut extent = CanvasExtent::from_point(WallPoint::ORIGIN);
        extent.include(WallPoint::new(20, -10));
        assert_eq!(extent.min(), WallPoint::new(0, -10));
        assert_eq!(extent.max(), WallPoint::new(20, 0));
        assert_eq!(extent.width(), 20);
        assert_eq!(extent.height(), 10);
        assert!(extent.contains(WallPoint::new(5, -5)));
        assert!(!extent.contains(WallPoint::new(21, 0)));
    }

    #[test]
    fn extent_width_does_not_overflow() {
        let mut extent = CanvasExtent::from_point(WallPoint::new(i32::MIN, 0));
        extent.include(WallPoint::new(i32::MAX, 1));
        assert_eq!(extent.width(), u32::MAX as i64);
    }

    #[test]
    fn single_point_extent_is_degenerate() {
        assert!(CanvasExtent::from_point(WallPoint::new(4, 4)).is_degenerate());
    }

    #[test]
    fn scale_rejects_invalid_values() {
        assert!(ScaleMultiplier::new(0.0).is_none());
        assert!(ScaleMultiplier::new(-1.0).is_none());
        assert!(ScaleMultiplier::new(f64::NAN).is_none());
        assert!(ScaleMultiplier::new(f64::INFINITY).is_none());
        assert_eq!(ScaleMultiplier::new(0.5).map(ScaleMultiplier::get), Some(0.5));
    }

    #[test]
    fn fit_takes_tighter_axis() {
        let mut extent = CanvasExtent::from_point(WallPoint::ORIGIN);
        extent.include(WallPoint::new(200, 50));
        // Width ratio 2.0, height ratio 4.0: width governs.
        let scale = ScaleMultiplier::fit(Viewport::new(400.0, 200.0), &extent).unwrap();
        assert_eq!(scale.get(), 2.0);
    }

    #[test]
    fn fit_rejects_degenerate_inputs() {
        let extent = CanvasExtent::from_point(WallPoint::ORIGIN);
        assert!(ScaleMultiplier::fit(Viewport::new(100.0, 100.0), &extent).is_none());

        let mut extent = extent;
        extent.include(WallPoint::new(10, 10));
        assert!(ScaleMultiplier::fit(Viewport::new(0.0, 100.0), &extent).is_none());
        assert!(ScaleMultiplier::fit(Viewport::new(100.0, f64::NAN), &extent).is_none());
    }

    #[test]
    fn to_wall_truncates_toward_zero() {
        let scale = ScaleMultiplier::new(2.0).unwrap();
        assert_eq!(scale.to_wall(ScreenPoint::new(110.0, 210.0)), WallPoint::new(55, 105));
        assert_eq!(scale.to_wall(ScreenPoint::new(111.0, 3.0)), WallPoint::new(55, 1));
        assert_eq!(scale.to_wall(ScreenPoint::new(-3.0, -1.0)), WallPoint::new(-1, 0));
    }

    #[test]
    fn to_wall_snaps_float_noise() {
        let scale = ScaleMultiplier::new(0.1).unwrap();
        for v in [1, 3, 7, 29, 123, 4096] {
            let screen = scale.to_screen(WallPoint::new(v, -v));
            assert_eq!(scale.to_wall(screen), WallPoint::new(v, -v), "value {v}");
        }
    }

    #[test]
    fn to_wall_handles_non_finite() {
        let scale = ScaleMultiplier::IDENTITY;
        assert_eq!(scale.to_wall(ScreenPoint::new(f64::NAN, f64::INFINITY)), WallPoint::ORIGIN);
    }

    #[test]
    fn rescale_preserves_wall_position() {
        let old = ScaleMultiplier::new(2.0).unwrap();
        let new = ScaleMultiplier::new(0.5).unwrap();
        let screen = old.to_screen(WallPoint::new(40, 80));
        let moved = new.rescale_from(old, screen);
        assert_eq!(new.to_wall(moved), WallPoint::new(40, 80));
    }

    #[test]
    fn screen_point_arithmetic() {
        let a = ScreenPoint::new(105.0, 205.0);
        let b = ScreenPoint::new(5.0, 5.0);
        assert_eq!(a - b, ScreenPoint::new(100.0, 200.0));
        assert_eq!(b + ScreenPoint::ZERO, b);
        assert!(ScreenPoint::ZERO.is_zero());
    }
}
