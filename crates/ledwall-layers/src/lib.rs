#![forbid(unsafe_code)]

//! Element model and layer management for the LED wall editor.
//!
//! - [`element`]: images and text, with their layer id and stable key.
//! - [`layer_stack`]: the z-ordered collection and its operations.
//! - [`drag`]: the pointer drag positioner.
//! - [`document`]: the persisted configuration format.

pub mod document;
pub mod drag;
pub mod element;
pub mod layer_stack;

pub use document::{ConfigDocument, DocumentError, ElementRecord, Settings};
pub use drag::{
    DragEffect, DragNoopReason, DragPositioner, DragPositionerError, DragState, DragTransition,
    canvas_drop_position,
};
pub use element::{Element, ElementKey, ElementKind, LayerId};
pub use layer_stack::{ContiguityError, LayerChange, LayerOutcome, LayerStack};
