#![forbid(unsafe_code)]

//! Pointer-driven element positioning.
//!
//! ```text
//! Idle --down on element--> Dragging --up--> Idle (commit)
//!                               \----cancel--> Idle (discard)
//! ```
//!
//! While dragging, the positioner keeps a transient screen-space offset
//! that is *not* written to the stack; renderers add it to the element's
//! baseline via [`DragPositioner::display_position`]. Only the release
//! commits `baseline + offset` into the [`LayerStack`].
//!
//! Releases are expected at document level so a drag survives the pointer
//! leaving the element. Every call returns a [`DragTransition`]; inputs
//! that do not apply produce an explicit [`DragEffect::Noop`] with a
//! reason instead of silently vanishing.

use std::fmt;

use ledwall_core::event::{PointerEvent, PointerEventKind};
use ledwall_core::geometry::{ScaleMultiplier, ScreenPoint, WallPoint};
use tracing::debug;

use crate::element::{Element, ElementKey};
use crate::layer_stack::LayerStack;

/// Positioner lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        key: ElementKey,
        /// `pointer - offset` at the press.
        start_offset: ScreenPoint,
        /// Element baseline at the press.
        base: ScreenPoint,
    },
}

/// Why an input was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragNoopReason {
    /// Move, release or cancel with no drag in progress.
    IdleWithoutActiveDrag,
    /// A second press arrived mid-drag.
    ActiveDragAlreadyInProgress,
    /// Press did not land on an element.
    NoTarget,
    /// The pressed key is not in the stack.
    UnknownElement,
    /// Only the primary button drags.
    NonPrimaryButton,
}

/// What one transition did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEffect {
    Started {
        key: ElementKey,
        start_offset: ScreenPoint,
    },
    Moved {
        key: ElementKey,
        offset: ScreenPoint,
    },
    /// The element's baseline was updated in the stack.
    Committed {
        key: ElementKey,
        location: ScreenPoint,
        /// `location / scale`, truncated toward zero.
        wall: WallPoint,
    },
    /// The drag ended without committing.
    Canceled { key: ElementKey },
    Noop { reason: DragNoopReason },
}

/// One positioner transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragState,
    pub to: DragState,
    pub effect: DragEffect,
}

/// Rejected pointer input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragPositionerError {
    /// The pointer position has a NaN or infinite component.
    NonFinitePointer { x: f64, y: f64 },
}

impl fmt::Display for DragPositionerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinitePointer { x, y } => {
                write!(f, "pointer position ({x}, {y}) is not finite")
            }
        }
    }
}

impl std::error::Error for DragPositionerError {}

/// Idle/Dragging positioning machine. One drag at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct DragPositioner {
    state: DragState,
    offset: ScreenPoint,
    transition_counter: u64,
}

impl Default for DragPositioner {
    fn default() -> Self {
        Self {
            state: DragState::Idle,
            offset: ScreenPoint::ZERO,
            transition_counter: 0,
        }
    }
}

impl DragPositioner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> DragState {
        self.state
    }

    /// Current transient offset (zero while idle).
    #[must_use]
    pub const fn offset(&self) -> ScreenPoint {
        self.offset
    }

    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Key of the element being dragged.
    #[must_use]
    pub const fn active(&self) -> Option<ElementKey> {
        match self.state {
            DragState::Dragging { key, .. } => Some(key),
            DragState::Idle => None,
        }
    }

    /// Where to draw `element` right now: baseline plus the transient
    /// offset if it is the one being dragged.
    #[must_use]
    pub fn display_position(&self, element: &Element) -> ScreenPoint {
        match self.state {
            DragState::Dragging { key, .. } if key == element.key() => {
                element.location + self.offset
            }
            _ => element.location,
        }
    }

    /// Feed one pointer event.
    ///
    /// `target` is the element under the pointer for presses (hit-testing
    /// is the host's job); it is ignored for moves and releases. A press
    /// that starts a drag also selects the element.
    pub fn apply(
        &mut self,
        event: &PointerEvent,
        target: Option<ElementKey>,
        stack: &mut LayerStack,
        scale: ScaleMultiplier,
    ) -> Result<DragTransition, DragPositionerError> {
        let pointer = event.position;
        if !pointer.x.is_finite() || !pointer.y.is_finite() {
            return Err(DragPositionerError::NonFinitePointer {
                x: pointer.x,
                y: pointer.y,
            });
        }

        let from = self.state;
        let effect = match (self.state, event.kind) {
            (DragState::Idle, PointerEventKind::Down(_)) if !event.is_primary() => {
                DragEffect::Noop {
                    reason: DragNoopReason::NonPrimaryButton,
                }
            }
            (DragState::Idle, PointerEventKind::Down(_)) => match target {
                None => DragEffect::Noop {
                    reason: DragNoopReason::NoTarget,
                },
                Some(key) => match stack.by_key(key).map(|e| e.location) {
                    None => DragEffect::Noop {
                        reason: DragNoopReason::UnknownElement,
                    },
                    Some(base) => {
                        let start_offset = pointer - self.offset;
                        self.state = DragState::Dragging {
                            key,
                            start_offset,
                            base,
                        };
                        stack.select_key(key);
                        DragEffect::Started { key, start_offset }
                    }
                },
            },
            (DragState::Idle, _) => DragEffect::Noop {
                reason: DragNoopReason::IdleWithoutActiveDrag,
            },
            (DragState::Dragging { .. }, PointerEventKind::Down(_)) => DragEffect::Noop {
                reason: DragNoopReason::ActiveDragAlreadyInProgress,
            },
            (DragState::Dragging { key, start_offset, .. }, PointerEventKind::Moved) => {
                self.offset = pointer - start_offset;
                DragEffect::Moved {
                    key,
                    offset: self.offset,
                }
            }
            (
                DragState::Dragging {
                    key,
                    start_offset,
                    base,
                },
                PointerEventKind::Up(_),
            ) => {
                self.offset = pointer - start_offset;
                let location = base + self.offset;
                self.state = DragState::Idle;
                self.offset = ScreenPoint::ZERO;
                if stack.set_location(key, location) {
                    let wall = scale.to_wall(location);
                    debug!(element = %key, x = wall.x, y = wall.y, "drag committed");
                    DragEffect::Committed {
                        key,
                        location,
                        wall,
                    }
                } else {
                    // Removed mid-drag.
                    DragEffect::Canceled { key }
                }
            }
        };

        Ok(self.finish(from, effect))
    }

    /// Abandon the current drag (focus loss, escape). The element keeps
    /// its pre-drag baseline.
    pub fn cancel(&mut self) -> DragTransition {
        let from = self.state;
        let effect = match self.state {
            DragState::Dragging { key, .. } => {
                self.state = DragState::Idle;
                self.offset = ScreenPoint::ZERO;
                DragEffect::Canceled { key }
            }
            DragState::Idle => DragEffect::Noop {
                reason: DragNoopReason::IdleWithoutActiveDrag,
            },
        };
        self.finish(from, effect)
    }

    fn finish(&mut self, from: DragState, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state,
            effect,
        }
    }
}

/// Wall position for an element dropped onto the canvas at `drop_offset`
/// (relative to the canvas origin).
#[must_use]
pub fn canvas_drop_position(drop_offset: ScreenPoint, scale: ScaleMultiplier) -> WallPoint {
    scale.to_wall(drop_offset)
}
