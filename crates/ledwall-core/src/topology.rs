#![forbid(unsafe_code)]

//! Physical panel topology.
//!
//! The back end describes the wall as a set of panel *specs* (pixel
//! dimensions of one panel model) and panel *instances* (where each physical
//! panel is anchored and which way it is rotated).
//!
//! # Wire format
//!
//! ```json
//! {
//!   "matrix-specs": { "p10": { "width-height": [64, 32] } },
//!   "matrices": {
//!     "m0": { "pos": [0, 0], "rot": "down", "spec": "p10" }
//!   }
//! }
//! ```
//!
//! [`TopologyDocument`] mirrors that shape verbatim. [`MatrixTopology`] is the
//! validated form: spec dimensions are positive and every rotation is one of
//! the four known values. Conversion happens once, at
//! [`MatrixTopology::from_document`], and fails loudly instead of guessing.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::WallPoint;

// ─────────────────────────────────────────────────────────────────────────────
// Wire documents
// ─────────────────────────────────────────────────────────────────────────────

/// Raw topology document as served by the back end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    /// Panel models keyed by spec id.
    #[serde(rename = "matrix-specs", default)]
    pub matrix_specs: IndexMap<String, MatrixSpecRecord>,
    /// Panel instances keyed by matrix id.
    #[serde(default)]
    pub matrices: IndexMap<String, MatrixRecord>,
}

impl TopologyDocument {
    /// Parse a topology document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// One panel model on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSpecRecord {
    #[serde(rename = "width-height")]
    pub width_height: [i64; 2],
}

/// One panel instance on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub pos: [i32; 2],
    pub rot: String,
    pub spec: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Validated model
// ─────────────────────────────────────────────────────────────────────────────

/// Panel orientation relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Up,
    Down,
    Left,
    Right,
}

impl Rotation {
    /// All rotations, in wire order.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Parse the wire spelling. Anything else is rejected.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// The wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Far corner of a `width × height` panel anchored at `pos`.
    ///
    /// ```text
    /// down : pos + (w, h)
    /// up   : pos - (w, h)
    /// right: pos + (h, -w)
    /// left : pos - (h, -w)
    /// ```
    #[must_use]
    pub fn far_corner(self, pos: WallPoint, width: i32, height: i32) -> WallPoint {
        match self {
            Self::Down => pos + WallPoint::new(width, height),
            Self::Up => pos - WallPoint::new(width, height),
            Self::Right => pos + WallPoint::new(height, -width),
            Self::Left => pos - WallPoint::new(height, -width),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions of one panel model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSpec {
    pub id: String,
    pub width: i32,
    pub height: i32,
}

/// One physical panel on the wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelInstance {
    pub id: String,
    pub position: WallPoint,
    pub rotation: Rotation,
    pub spec_ref: String,
}

/// Validated wall topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixTopology {
    specs: IndexMap<String, PanelSpec>,
    instances: Vec<PanelInstance>,
}

impl MatrixTopology {
    /// Create an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a panel spec, replacing any spec with the same id.
    pub fn insert_spec(&mut self, spec: PanelSpec) -> Result<(), TopologyError> {
        if spec.width <= 0 || spec.height <= 0 {
            return Err(TopologyError::InvalidSpec {
                spec: spec.id,
                width: i64::from(spec.width),
                height: i64::from(spec.height),
            });
        }
        self.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    /// Add a panel instance.
    ///
    /// Spec references are checked at resolve time, so instances may be
    /// added before their spec.
    pub fn push_instance(&mut self, instance: PanelInstance) {
        self.instances.push(instance);
    }

    /// Builder-style [`insert_spec`](Self::insert_spec).
    pub fn with_spec(
        mut self,
        id: impl Into<String>,
        width: i32,
        height: i32,
    ) -> Result<Self, TopologyError> {
        self.insert_spec(PanelSpec {
            id: id.into(),
            width,
            height,
        })?;
        Ok(self)
    }

    /// Builder-style [`push_instance`](Self::push_instance).
    #[must_use]
    pub fn with_instance(
        mut self,
        id: impl Into<String>,
        position: WallPoint,
        rotation: Rotation,
        spec_ref: impl Into<String>,
    ) -> Self {
        self.push_instance(PanelInstance {
            id: id.into(),
            position,
            rotation,
            spec_ref: spec_ref.into(),
        });
        self
    }

    /// Validate a wire document.
    pub fn from_document(doc: &TopologyDocument) -> Result<Self, TopologyError> {
        let mut topology = Self::new();
        for (id, record) in &doc.matrix_specs {
            let [width, height] = record.width_height;
            let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
                return Err(TopologyError::InvalidSpec {
                    spec: id.clone(),
                    width,
                    height,
                });
            };
            topology.insert_spec(PanelSpec {
                id: id.clone(),
                width: w,
                height: h,
            })?;
        }
        for (id, record) in &doc.matrices {
            let Some(rotation) = Rotation::from_wire(&record.rot) else {
                return Err(TopologyError::UnknownRotation {
                    matrix: id.clone(),
                    value: record.rot.clone(),
                });
            };
            topology.push_instance(PanelInstance {
                id: id.clone(),
                position: WallPoint::from(record.pos),
                rotation,
                spec_ref: record.spec.clone(),
            });
        }
        Ok(topology)
    }

    /// Parse and validate JSON text in one step.
    pub fn from_json(text: &str) -> Result<Self, TopologyError> {
        let doc = TopologyDocument::from_json(text).map_err(TopologyError::Malformed)?;
        Self::from_document(&doc)
    }

    /// Render back into the wire shape.
    #[must_use]
    pub fn to_document(&self) -> TopologyDocument {
        TopologyDocument {
            matrix_specs: self
                .specs
                .values()
                .map(|s| {
                    (
                        s.id.clone(),
                        MatrixSpecRecord {
                            width_height: [i64::from(s.width), i64::from(s.height)],
                        },
                    )
                })
                .collect(),
            matrices: self
                .instances
                .iter()
                .map(|i| {
                    (
                        i.id.clone(),
                        MatrixRecord {
                            pos: i.position.to_array(),
                            rot: i.rotation.as_str().to_string(),
                            spec: i.spec_ref.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Look up a spec by id.
    #[must_use]
    pub fn spec(&self, id: &str) -> Option<&PanelSpec> {
        self.specs.get(id)
    }

    /// All specs in insertion order.
    pub fn specs(&self) -> impl Iterator<Item = &PanelSpec> {
        self.specs.values()
    }

    /// All instances in insertion order.
    #[must_use]
    pub fn instances(&self) -> &[PanelInstance] {
        &self.instances
    }

    /// Whether there are no panel instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Topology validation failures.
#[derive(Debug)]
pub enum TopologyError {
    /// The JSON text could not be decoded at all.
    Malformed(serde_json::Error),
    /// A panel spec has a non-positive (or out of range) dimension.
    InvalidSpec {
        spec: String,
        width: i64,
        height: i64,
    },
    /// A panel instance carries a rotation outside `up|down|left|right`.
    UnknownRotation { matrix: String, value: String },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed topology document: {e}"),
            Self::InvalidSpec {
                spec,
                width,
                height,
            } => write!(
                f,
                "panel spec {spec:?} has invalid dimensions {width}x{height}"
            ),
            Self::UnknownRotation { matrix, value } => write!(
                f,
                "matrix {matrix:?} has unknown rotation {value:?} (expected up, down, left or right)"
            ),
        }
    }
}

impl std::error::Error for TopologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) => Some(e),
            Self::InvalidSpec { .. } | Self::UnknownRotation { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "matrix-specs": {
            "p10": { "width-height": [64, 32] },
            "tall": { "width-height": [16, 48] }
        },
        "matrices": {
            "m0": { "pos": [0, 0], "rot": "down", "spec": "p10" },
            "m1": { "pos": [64, 0], "rot": "right", "spec": "tall" }
        }
    }"#;

    #[test]
    fn parses_wire_document() {
        let topology = MatrixTopology::from_json(SAMPLE).expect("valid topology");
        assert_eq!(topology.instances().len(), 2);
        assert_eq!(
            topology.spec("p10"),
            Some(&PanelSpec {
                id: "p10".into(),
                width: 64,
                height: 32
            })
        );
        let m1 = &topology.instances()[1];
        assert_eq!(m1.id, "m1");
        assert_eq!(m1.position, WallPoint::new(64, 0));
        assert_eq!(m1.rotation, Rotation::Right);
        assert_eq!(m1.spec_ref, "tall");
    }

    #[test]
    fn document_order_is_preserved() {
        let topology = MatrixTopology::from_json(SAMPLE).unwrap();
        let ids: Vec<_> = topology.specs().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["p10", "tall"]);
    }

    #[test]
    fn unknown_rotation_is_rejected() {
        let text = r#"{
            "matrix-specs": { "s": { "width-height": [1, 1] } },
            "matrices": { "m": { "pos": [0, 0], "rot": "sideways", "spec": "s" } }
        }"#;
        let err = MatrixTopology::from_json(text).unwrap_err();
        assert!(matches!(
            err,
            TopologyError::UnknownRotation { ref matrix, ref value } if matrix == "m" && value == "sideways"
        ));
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn rotation_is_case_sensitive() {
        assert_eq!(Rotation::from_wire("Up"), None);
        assert_eq!(Rotation::from_wire("up"), Some(Rotation::Up));
    }

    #[test]
    fn zero_sized_spec_is_rejected() {
        let text = r#"{ "matrix-specs": { "s": { "width-height": [0, 8] } }, "matrices": {} }"#;
        assert!(matches!(
            MatrixTopology::from_json(text),
            Err(TopologyError::InvalidSpec { width: 0, height: 8, .. })
        ));
    }

    #[test]
    fn oversized_spec_is_rejected() {
        let text = r#"{ "matrix-specs": { "s": { "width-height": [4294967296, 8] } } }"#;
        assert!(matches!(
            MatrixTopology::from_json(text),
            Err(TopologyError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = MatrixTopology::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TopologyError::Malformed(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn far_corner_per_rotation() {
        let pos = WallPoint::new(100, 100);
        assert_eq!(Rotation::Down.far_corner(pos, 10, 20), WallPoint::new(110, 120));
        assert_eq!(Rotation::Up.far_corner(pos, 10, 20), WallPoint::new(90, 80));
        assert_eq!(Rotation::Right.far_corner(pos, 10, 20), WallPoint::new(120, 90));
        assert_eq!(Rotation::Left.far_corner(pos, 10, 20), WallPoint::new(80, 110));
    }

    #[test]
    fn document_round_trip() {
        let topology = MatrixTopology::from_json(SAMPLE).unwrap();
        let again = MatrixTopology::from_document(&topology.to_document()).unwrap();
        assert_eq!(topology, again);
    }

    #[test]
    fn builder_matches_parsed() {
        let built = MatrixTopology::new()
            .with_spec("p10", 64, 32)
            .unwrap()
            .with_spec("tall", 16, 48)
            .unwrap()
            .with_instance("m0", WallPoint::ORIGIN, Rotation::Down, "p10")
            .with_instance("m1", WallPoint::new(64, 0), Rotation::Right, "tall");
        assert_eq!(built, MatrixTopology::from_json(SAMPLE).unwrap());
    }
}
