#![forbid(unsafe_code)]

//! Configuration document codec.
//!
//! ```json
//! {
//!   "settings": { "gamma": 2.2 },
//!   "elements": {
//!     "logo":   { "id": 1, "type": "image", "location": [0, 0],
//!                 "filepath": "images/logo.png", "scale": 1 },
//!     "banner": { "id": 2, "type": "text", "location": [64, 8],
//!                 "content": "hi", "size": 24, "color": "#000000ff",
//!                 "font_path": "fonts/a.ttf" }
//!   }
//! }
//! ```
//!
//! Documents hold **wall-space** coordinates. [`ConfigDocument::to_elements`]
//! multiplies by the scale on the way in; [`ConfigDocument::from_stack`]
//! divides (truncating) on the way out.
//!
//! # Layer normalisation
//!
//! Hand-edited documents may carry missing, duplicate, or gapped ids. On
//! load, elements are ordered by explicit id (missing ids sort last) with
//! document order breaking ties, then renumbered `1..=N`. A warning is
//! logged whenever that changes any id.

use std::fmt;

use indexmap::IndexMap;
use ledwall_core::geometry::{ScaleMultiplier, WallPoint};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::element::{Element, ElementKind};
use crate::layer_stack::LayerStack;

/// Global wall settings. Only `gamma` is interpreted; everything else is
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// One element on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub location: [i32; 2],
    #[serde(flatten)]
    pub kind: ElementKind,
}

/// Full configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub settings: Settings,
    /// Elements keyed by name, in document order.
    #[serde(default)]
    pub elements: IndexMap<String, ElementRecord>,
}

impl ConfigDocument {
    /// Parse and validate JSON text.
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(text).map_err(DocumentError::Malformed)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value.
    ///
    /// Fractional locations are truncated toward zero.
    pub fn from_value(mut value: Value) -> Result<Self, DocumentError> {
        if let Some(Value::Object(elements)) = value.get_mut("elements") {
            for (name, record) in elements.iter_mut() {
                check_record(name, record)?;
            }
        }
        serde_json::from_value(value).map_err(DocumentError::Malformed)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(self).map_err(DocumentError::Encode)
    }

    /// Snapshot a stack into a document (wall-space, ids from the stack).
    #[must_use]
    pub fn from_stack(stack: &LayerStack, settings: &Settings, scale: ScaleMultiplier) -> Self {
        let elements = stack
            .iter()
            .map(|e| {
                (
                    e.name.clone(),
                    ElementRecord {
                        id: Some(e.id().get()),
                        location: scale.to_wall(e.location).to_array(),
                        kind: e.kind.clone(),
                    },
                )
            })
            .collect();
        Self {
            settings: settings.clone(),
            elements,
        }
    }

    /// Elements in normalised back-to-front order, locations in
    /// screen-space.
    #[must_use]
    pub fn to_elements(&self, scale: ScaleMultiplier) -> Vec<Element> {
        let mut order: Vec<(usize, &String, &ElementRecord)> = self
            .elements
            .iter()
            .enumerate()
            .map(|(index, (name, record))| (index, name, record))
            .collect();
        order.sort_by_key(|(index, _, record)| (record.id.unwrap_or(u32::MAX), *index));

        let renumbered = order
            .iter()
            .enumerate()
            .any(|(slot, (_, _, record))| record.id != Some(slot as u32 + 1));
        if renumbered {
            warn!(
                elements = order.len(),
                "configuration layer ids were not contiguous; renumbered"
            );
        }

        order
            .into_iter()
            .map(|(_, name, record)| {
                let wall = WallPoint::from(record.location);
                Element::new(name.clone(), scale.to_screen(wall), record.kind.clone())
            })
            .collect()
    }
}

fn check_record(name: &str, record: &mut Value) -> Result<(), DocumentError> {
    match record.get("type").and_then(Value::as_str) {
        Some("image" | "text") => {}
        other => {
            return Err(DocumentError::UnknownType {
                element: name.to_string(),
                found: other.map(str::to_string),
            });
        }
    }

    if let Some(scale) = record.get("scale")
        && record.get("type").and_then(Value::as_str) == Some("image")
        && !scale.as_f64().is_some_and(ElementKind::is_valid_scale)
    {
        return Err(DocumentError::InvalidScale {
            element: name.to_string(),
            found: scale.to_string(),
        });
    }

    let malformed = || DocumentError::MalformedLocation {
        element: name.to_string(),
    };
    let Some(Value::Array(location)) = record.get_mut("location") else {
        return Err(malformed());
    };
    if location.len() != 2 {
        return Err(malformed());
    }
    for coord in location.iter_mut() {
        let Some(v) = coord.as_f64() else {
            return Err(malformed());
        };
        let truncated = v.trunc();
        if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
            return Err(malformed());
        }
        *coord = Value::from(truncated as i32);
    }
    Ok(())
}

/// Configuration document failures.
#[derive(Debug)]
pub enum DocumentError {
    /// Not JSON, or a field has the wrong shape.
    Malformed(serde_json::Error),
    /// `type` is missing or not `image`/`text`.
    UnknownType {
        element: String,
        found: Option<String>,
    },
    /// `location` is not a pair of numbers in range.
    MalformedLocation { element: String },
    /// An image `scale` is negative or not a number.
    InvalidScale { element: String, found: String },
    /// Serialisation failed.
    Encode(serde_json::Error),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed configuration document: {e}"),
            Self::UnknownType {
                element,
                found: Some(found),
            } => write!(f, "element {element:?} has unknown type {found:?}"),
            Self::UnknownType {
                element,
                found: None,
            } => write!(f, "element {element:?} has no type"),
            Self::MalformedLocation { element } => {
                write!(f, "element {element:?} location must be [x, y]")
            }
            Self::InvalidScale { element, found } => {
                write!(f, "element {element:?} scale must be a number >= 0, got {found}")
            }
            Self::Encode(e) => write!(f, "failed to encode configuration: {e}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Malformed(e) | Self::Encode(e) => Some(e),
            Self::UnknownType { .. }
            | Self::MalformedLocation { .. }
            | Self::InvalidScale { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledwall_core::geometry::ScreenPoint;

    const SAMPLE: &str = r##"{
        "settings": { "gamma": 2.2, "brightness": 80 },
        "elements": {
            "logo": { "id": 2, "type": "image", "location": [10, 20],
                      "filepath": "images/logo.png", "scale": 1 },
            "banner": { "id": 1, "type": "text", "location": [0, 5],
                        "content": "hi", "size": 24, "color": "#ff0000ff",
                        "font_path": "fonts/a.ttf" }
        }
    }"##;

    #[test]
    fn parses_and_orders_by_id() {
        let doc = ConfigDocument::from_json(SAMPLE).unwrap();
        assert_eq!(doc.settings.gamma, Some(2.2));
        let elements = doc.to_elements(ScaleMultiplier::new(2.0).unwrap());
        let names: Vec<_> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["banner", "logo"]);
        assert_eq!(elements[1].location, ScreenPoint::new(20.0, 40.0));
    }

    #[test]
    fn missing_ids_follow_document_order() {
        let text = r#"{ "elements": {
            "a": { "type": "text", "location": [0, 0], "content": "", "font_path": "" },
            "b": { "id": 1, "type": "text", "location": [0, 0], "content": "", "font_path": "" },
            "c": { "type": "text", "location": [0, 0], "content": "", "font_path": "" }
        } }"#;
        let doc = ConfigDocument::from_json(text).unwrap();
        let stack = LayerStack::from_elements(doc.to_elements(ScaleMultiplier::IDENTITY));
        assert_eq!(stack.layer_list(), ["b", "a", "c"]);
        stack.check_contiguity().unwrap();
    }

    #[test]
    fn duplicate_and_gapped_ids_are_renumbered() {
        let text = r#"{ "elements": {
            "a": { "id": 7, "type": "image", "location": [0, 0], "filepath": "x" },
            "b": { "id": 3, "type": "image", "location": [0, 0], "filepath": "y" },
            "c": { "id": 3, "type": "image", "location": [0, 0], "filepath": "z" }
        } }"#;
        let doc = ConfigDocument::from_json(text).unwrap();
        let stack = LayerStack::from_elements(doc.to_elements(ScaleMultiplier::IDENTITY));
        assert_eq!(stack.layer_list(), ["b", "c", "a"]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let text = r#"{ "elements": { "v": { "type": "video", "location": [0, 0] } } }"#;
        let err = ConfigDocument::from_json(text).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnknownType { ref element, found: Some(ref t) } if element == "v" && t == "video"
        ));
    }

    #[test]
    fn malformed_location_is_rejected() {
        for location in [r#"[1]"#, r#"["a", 2]"#, r#"{"x": 1}"#, "[1e12, 0]"] {
            let text = format!(
                r#"{{ "elements": {{ "e": {{ "type": "image", "filepath": "x", "location": {location} }} }} }}"#
            );
            let err = ConfigDocument::from_json(&text).unwrap_err();
            assert!(
                matches!(err, DocumentError::MalformedLocation { .. }),
                "{location}: {err}"
            );
        }
    }

    #[test]
    fn invalid_image_scale_is_rejected() {
        for scale in ["-3", r#""big""#, "null"] {
            let text = format!(
                r#"{{ "elements": {{ "e": {{ "type": "image", "filepath": "x", "location": [0, 0], "scale": {scale} }} }} }}"#
            );
            let err = ConfigDocument::from_json(&text).unwrap_err();
            assert!(
                matches!(err, DocumentError::InvalidScale { ref element, .. } if element == "e"),
                "{scale}: {err}"
            );
        }
        let text = r#"{ "elements": { "e": { "type": "image", "filepath": "x", "location": [0, 0], "scale": 0 } } }"#;
        assert!(ConfigDocument::from_json(text).is_ok());
    }

    #[test]
    fn fractional_location_truncates() {
        let text = r#"{ "elements": { "e": { "type": "image", "filepath": "x", "location": [12.9, -3.5] } } }"#;
        let doc = ConfigDocument::from_json(text).unwrap();
        assert_eq!(doc.elements["e"].location, [12, -3]);
    }

    #[test]
    fn save_reload_preserves_wall_coordinates() {
        let scale = ScaleMultiplier::new(0.37).unwrap();
        let doc = ConfigDocument::from_json(SAMPLE).unwrap();
        let stack = LayerStack::from_elements(doc.to_elements(scale));
        let saved = ConfigDocument::from_stack(&stack, &doc.settings, scale);
        assert_eq!(saved.elements["logo"].location, [10, 20]);
        assert_eq!(saved.elements["logo"].id, Some(2));
        assert_eq!(saved.elements["banner"].location, [0, 5]);

        let reparsed = ConfigDocument::from_json(&saved.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, saved);
        assert_eq!(
            reparsed.settings.extra.get("brightness"),
            Some(&Value::from(80))
        );
    }
}
