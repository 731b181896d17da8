#![forbid(unsafe_code)]

//! Canvas geometry resolution.
//!
//! Turns a [`MatrixTopology`] and the available [`Viewport`] into a single
//! [`ResolvedCanvas`]: the wall's bounding [`CanvasExtent`] and the uniform
//! [`ScaleMultiplier`] that fits it on screen.
//!
//! # Algorithm
//!
//! For every panel instance, the far corner is derived from its anchor,
//! its spec's `(width, height)` and its rotation (see
//! [`Rotation::far_corner`]). A running min/max over every anchor and every
//! far corner yields the extent. The scale is
//! `min(viewport.width / extent.width, viewport.height / extent.height)`,
//! so the wall fits on both axes at once.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Result |
//! |---------|-------|--------|
//! | No panel instances | Empty topology | [`GeometryError::EmptyTopology`] |
//! | Instance names a missing spec | Broken document | [`GeometryError::UnknownSpec`] |
//! | Zero-width or zero-height extent | Collinear panels | [`GeometryError::DegenerateExtent`] |
//! | Viewport not finite/positive | Caller bug | [`GeometryError::InvalidViewport`] |
//! | Unknown rotation / bad spec | Wire document | [`GeometryError::Topology`] |
//!
//! No fallback extent is ever fabricated.

use std::fmt;

use crate::geometry::{CanvasExtent, ScaleMultiplier, ScreenPoint, Viewport, WallPoint};
use crate::topology::{MatrixTopology, TopologyDocument, TopologyError};

/// Output of a successful resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedCanvas {
    /// Wall bounding box.
    pub extent: CanvasExtent,
    /// Wall-to-screen multiplier.
    pub scale: ScaleMultiplier,
}

impl ResolvedCanvas {
    /// Size of the scaled wall proxy on screen, as `(width, height)`.
    #[must_use]
    pub fn screen_size(&self) -> (f64, f64) {
        (
            self.extent.width() as f64 * self.scale.get(),
            self.extent.height() as f64 * self.scale.get(),
        )
    }

    /// Map a wall point to screen-space.
    #[must_use]
    pub fn to_screen(&self, p: WallPoint) -> ScreenPoint {
        self.scale.to_screen(p)
    }

    /// Map a screen point to wall-space (truncating).
    #[must_use]
    pub fn to_wall(&self, p: ScreenPoint) -> WallPoint {
        self.scale.to_wall(p)
    }
}

/// Resolves topologies against a fixed viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryResolver {
    viewport: Viewport,
}

impl GeometryResolver {
    /// Create a resolver for the given viewport budget.
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    /// The viewport this resolver fits into.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Compute the wall extent alone.
    pub fn extent(topology: &MatrixTopology) -> Result<CanvasExtent, GeometryError> {
        let mut extent: Option<CanvasExtent> = None;
        for instance in topology.instances() {
            let Some(spec) = topology.spec(&instance.spec_ref) else {
                return Err(GeometryError::UnknownSpec {
                    matrix: instance.id.clone(),
                    spec: instance.spec_ref.clone(),
                });
            };
            let far = instance
                .rotation
                .far_corner(instance.position, spec.width, spec.height);
            let bounds = extent.get_or_insert(CanvasExtent::from_point(instance.position));
            bounds.include(instance.position);
            bounds.include(far);
        }
        extent.ok_or(GeometryError::EmptyTopology)
    }

    /// Resolve a validated topology.
    pub fn resolve(&self, topology: &MatrixTopology) -> Result<ResolvedCanvas, GeometryError> {
        if !self.viewport.is_valid() {
            return Err(GeometryError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        let extent = Self::extent(topology)?;
        let Some(scale) = ScaleMultiplier::fit(self.viewport, &extent) else {
            return Err(GeometryError::DegenerateExtent {
                width: extent.width(),
                height: extent.height(),
            });
        };
        crate::debug!(
            min_x = extent.min_x,
            min_y = extent.min_y,
            width = extent.width(),
            height = extent.height(),
            scale = scale.get(),
            "resolved canvas geometry"
        );
        Ok(ResolvedCanvas { extent, scale })
    }

    /// Validate a wire document and resolve it.
    pub fn resolve_document(
        &self,
        doc: &TopologyDocument,
    ) -> Result<ResolvedCanvas, GeometryError> {
        let topology = MatrixTopology::from_document(doc)?;
        self.resolve(&topology)
    }
}

/// Failures of the resolve step.
#[derive(Debug)]
pub enum GeometryError {
    /// The topology has no panel instances; the extent is undefined.
    EmptyTopology,
    /// A panel instance references a spec id that does not exist.
    UnknownSpec { matrix: String, spec: String },
    /// The extent has zero width or height, so no finite scale exists.
    DegenerateExtent { width: i64, height: i64 },
    /// The viewport is non-positive or non-finite.
    InvalidViewport { width: f64, height: f64 },
    /// The wire document failed validation.
    Topology(TopologyError),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTopology => write!(f, "topology has no panel instances"),
            Self::UnknownSpec { matrix, spec } => {
                write!(f, "matrix {matrix:?} references unknown spec {spec:?}")
            }
            Self::DegenerateExtent { width, height } => {
                write!(f, "wall extent {width}x{height} has zero area")
            }
            Self::InvalidViewport { width, height } => {
                write!(f, "viewport {width}x{height} must be finite and positive")
            }
            Self::Topology(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Topology(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TopologyError> for GeometryError {
    fn from(e: TopologyError) -> Self {
        Self::Topology(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Rotation;

    fn single(rotation: Rotation) -> MatrixTopology {
        MatrixTopology::new()
            .with_spec("S", 10, 20)
            .unwrap()
            .with_instance("A", WallPoint::ORIGIN, rotation, "S")
    }

    #[test]
    fn right_rotation_scenario() {
        let extent = GeometryResolver::extent(&single(Rotation::Right)).unwrap();
        assert_eq!(
            extent,
            CanvasExtent {
                min_x: 0,
                min_y: -10,
                max_x: 20,
                max_y: 0
            }
        );
        assert_eq!(extent.width(), 20);
        assert_eq!(extent.height(), 10);
    }

    #[test]
    fn every_rotation_yields_spec_sized_extent() {
        for rotation in Rotation::ALL {
            let extent = GeometryResolver::extent(&single(rotation)).unwrap();
            let (w, h) = (extent.width(), extent.height());
            match rotation {
                Rotation::Up | Rotation::Down => assert_eq!((w, h), (10, 20), "{rotation}"),
                Rotation::Left | Rotation::Right => assert_eq!((w, h), (20, 10), "{rotation}"),
            }
        }
    }

    #[test]
    fn two_panel_row() {
        let topology = MatrixTopology::new()
            .with_spec("p", 64, 32)
            .unwrap()
            .with_instance("m0", WallPoint::ORIGIN, Rotation::Down, "p")
            .with_instance("m1", WallPoint::new(64, 0), Rotation::Down, "p");
        let canvas = GeometryResolver::new(Viewport::new(256.0, 256.0))
            .resolve(&topology)
            .unwrap();
        assert_eq!(canvas.extent.width(), 128);
        assert_eq!(canvas.extent.height(), 32);
        assert_eq!(canvas.scale.get(), 2.0);
        assert_eq!(canvas.screen_size(), (256.0, 64.0));
    }

    #[test]
    fn height_can_govern_scale() {
        let topology = single(Rotation::Down);
        let canvas = GeometryResolver::new(Viewport::new(1000.0, 40.0))
            .resolve(&topology)
            .unwrap();
        assert_eq!(canvas.scale.get(), 2.0);
        let (w, h) = canvas.screen_size();
        assert!(w <= 1000.0 && h <= 40.0);
    }

    #[test]
    fn empty_topology_is_an_error() {
        let err = GeometryResolver::new(Viewport::default())
            .resolve(&MatrixTopology::new())
            .unwrap_err();
        assert!(matches!(err, GeometryError::EmptyTopology));
    }

    #[test]
    fn unknown_spec_is_an_error() {
        let topology =
            MatrixTopology::new().with_instance("m", WallPoint::ORIGIN, Rotation::Down, "ghost");
        let err = GeometryResolver::extent(&topology).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnknownSpec { ref matrix, ref spec } if matrix == "m" && spec == "ghost"
        ));
    }

    #[test]
    fn invalid_viewport_is_an_error() {
        let err = GeometryResolver::new(Viewport::new(-1.0, 10.0))
            .resolve(&single(Rotation::Down))
            .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidViewport { .. }));
    }

    #[test]
    fn unknown_rotation_fails_document_resolve() {
        let doc = TopologyDocument::from_json(
            r#"{
                "matrix-specs": { "S": { "width-height": [10, 20] } },
                "matrices": { "A": { "pos": [0, 0], "rot": "diagonal", "spec": "S" } }
            }"#,
        )
        .unwrap();
        let err = GeometryResolver::new(Viewport::default())
            .resolve_document(&doc)
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::Topology(TopologyError::UnknownRotation { .. })
        ));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn negative_anchors_are_included() {
        let topology = MatrixTopology::new()
            .with_spec("S", 10, 10)
            .unwrap()
            .with_instance("a", WallPoint::new(-50, -50), Rotation::Down, "S")
            .with_instance("b", WallPoint::new(50, 50), Rotation::Up, "S");
        let extent = GeometryResolver::extent(&topology).unwrap();
        assert_eq!(extent.min(), WallPoint::new(-50, -50));
        assert_eq!(extent.max(), WallPoint::new(50, 50));
    }
}
