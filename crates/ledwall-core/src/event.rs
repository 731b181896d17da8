#![forbid(unsafe_code)]

//! Canonical pointer event types.
//!
//! The editor only cares about the pointer: presses start drags, moves
//! update them, releases commit them. Coordinates are screen-space and
//! real-valued, because the host (browser, window system) reports
//! sub-pixel positions.
//!
//! # Design Notes
//!
//! - Releases are delivered at document level by the host, not per
//!   element, so a drag survives the pointer leaving the element's bounds.
//! - Hit-testing is the host's job: a press that lands on an element
//!   carries that element's layer id alongside the event (see the editor
//!   messages in `ledwall-runtime`).

use crate::geometry::ScreenPoint;

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// The type of pointer event.
    pub kind: PointerEventKind,
    /// Position in screen-space.
    pub position: ScreenPoint,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            position: ScreenPoint::new(x, y),
        }
    }

    /// Primary-button press at `(x, y)`.
    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Down(PointerButton::Primary), x, y)
    }

    /// Pointer motion to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Moved, x, y)
    }

    /// Primary-button release at `(x, y)`.
    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Up(PointerButton::Primary), x, y)
    }

    /// Whether this event involves the primary button.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        matches!(
            self.kind,
            PointerEventKind::Down(PointerButton::Primary)
                | PointerEventKind::Up(PointerButton::Primary)
        )
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Button pressed down.
    Down(PointerButton),
    /// Button released.
    Up(PointerButton),
    /// Pointer moved (with or without a button held).
    Moved,
}

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left mouse button / primary touch.
    Primary,
    /// Right mouse button; opens the element context menu.
    Secondary,
    /// Middle mouse button.
    Auxiliary,
}
