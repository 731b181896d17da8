#![forbid(unsafe_code)]

//! Wall elements: images and text placed on the canvas.
//!
//! An [`Element`] carries two identities:
//!
//! - its [`LayerId`], which *is* its z-order (1 = farthest back) and is
//!   rewritten by every layer operation, and
//! - its [`ElementKey`], assigned once by the stack and never reused, which
//!   selection and drag sessions hold so they follow the object rather
//!   than the slot.

use std::fmt;

use ledwall_core::geometry::ScreenPoint;
use serde::{Deserialize, Serialize};

/// Default colour for new text elements (opaque black, `#rrggbbaa`).
pub const DEFAULT_TEXT_COLOR: &str = "#000000ff";

/// Default font size for new text elements.
pub const DEFAULT_TEXT_SIZE: f64 = 24.0;

/// Directory prefix for uploaded images.
pub const IMAGE_DIR: &str = "images";

/// Layer position of an element. `1` is the back-most layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(u32);

impl LayerId {
    /// The back-most layer.
    pub const BACK: Self = Self(1);

    /// Create a layer id. Zero is not a layer.
    #[must_use]
    pub const fn new(id: u32) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    /// Raw 1-based value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Zero-based stack index for this layer.
    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Layer id for a zero-based stack index.
    #[inline]
    #[must_use]
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable element identity, unique for the lifetime of a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementKey(u64);

impl ElementKey {
    /// Raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type-specific payload, tagged on the wire by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Image {
        filepath: String,
        #[serde(default = "default_image_scale")]
        scale: f64,
    },
    Text {
        content: String,
        #[serde(default = "default_text_size")]
        size: f64,
        #[serde(default = "default_text_color")]
        color: String,
        font_path: String,
    },
}

fn default_image_scale() -> f64 {
    1.0
}

fn default_text_size() -> f64 {
    DEFAULT_TEXT_SIZE
}

fn default_text_color() -> String {
    DEFAULT_TEXT_COLOR.to_string()
}

impl ElementKind {
    /// Image scales must be finite and non-negative.
    #[must_use]
    pub fn is_valid_scale(scale: f64) -> bool {
        scale.is_finite() && scale >= 0.0
    }

    /// Wire tag for this kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
        }
    }
}

/// One element on the wall.
///
/// `location` is in screen-space (wall × scale) for as long as the element
/// lives in a stack; documents convert at the load/save boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    key: ElementKey,
    id: LayerId,
    /// Unique display name; also the element's key in configuration documents.
    pub name: String,
    /// Screen-space baseline position (excludes any in-flight drag offset).
    pub location: ScreenPoint,
    /// Image or text payload.
    pub kind: ElementKind,
}

impl Element {
    /// Create an element that has not been placed in a stack yet.
    ///
    /// The key and layer id are placeholders until
    /// [`LayerStack::append`](crate::LayerStack::append) assigns them.
    #[must_use]
    pub fn new(name: impl Into<String>, location: ScreenPoint, kind: ElementKind) -> Self {
        Self {
            key: ElementKey(0),
            id: LayerId::BACK,
            name: name.into(),
            location,
            kind,
        }
    }

    /// An image element. `filename` is stored under [`IMAGE_DIR`].
    #[must_use]
    pub fn image(name: impl Into<String>, location: ScreenPoint, filename: &str) -> Self {
        Self::new(
            name,
            location,
            ElementKind::Image {
                filepath: format!("{IMAGE_DIR}/{filename}"),
                scale: default_image_scale(),
            },
        )
    }

    /// A text element at the wall origin with default colour and size.
    #[must_use]
    pub fn text(
        name: impl Into<String>,
        content: impl Into<String>,
        font_path: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            ScreenPoint::ZERO,
            ElementKind::Text {
                content: content.into(),
                size: DEFAULT_TEXT_SIZE,
                color: DEFAULT_TEXT_COLOR.to_string(),
                font_path: font_path.into(),
            },
        )
    }

    /// Stable identity.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> ElementKey {
        self.key
    }

    /// Current layer.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image { .. })
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. })
    }

    pub(crate) fn set_key(&mut self, key: ElementKey) {
        self.key = key;
    }

    pub(crate) fn set_id(&mut self, id: LayerId) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_id_rejects_zero() {
        assert_eq!(LayerId::new(0), None);
        assert_eq!(LayerId::new(3).map(LayerId::get), Some(3));
        assert_eq!(LayerId::from_index(0), LayerId::BACK);
        assert_eq!(LayerId::new(4).unwrap().index(), 3);
    }

    #[test]
    fn image_constructor_prefixes_directory() {
        let e = Element::image("logo", ScreenPoint::new(4.0, 8.0), "logo.png");
        assert_eq!(
            e.kind,
            ElementKind::Image {
                filepath: "images/logo.png".into(),
                scale: 1.0
            }
        );
        assert!(e.is_image());
        assert!(!e.is_text());
    }

    #[test]
    fn text_constructor_uses_defaults() {
        let e = Element::text("banner", "hello", "fonts/a.ttf");
        assert_eq!(e.location, ScreenPoint::ZERO);
        let ElementKind::Text { size, color, .. } = &e.kind else {
            panic!("expected text");
        };
        assert_eq!(*size, 24.0);
        assert_eq!(color, "#000000ff");
    }

    #[test]
    fn kind_is_tagged_by_type() {
        let json = r#"{ "type": "image", "filepath": "images/a.png" }"#;
        let kind: ElementKind = serde_json::from_str(json).unwrap();
        assert_eq!(
            kind,
            ElementKind::Image {
                filepath: "images/a.png".into(),
                scale: 1.0
            }
        );
        assert_eq!(kind.type_name(), "image");

        let unknown = r#"{ "type": "video", "filepath": "x" }"#;
        assert!(serde_json::from_str::<ElementKind>(unknown).is_err());
    }
}
