#![forbid(unsafe_code)]

//! LED wall layout editor public facade.
//!
//! Re-exports the types most callers need from the internal crates, a
//! top-level [`Error`], and a prelude.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use ledwall_core::event::{PointerButton, PointerEvent, PointerEventKind};
pub use ledwall_core::topology::TopologyError;
pub use ledwall_core::{
    CanvasExtent, GeometryError, GeometryResolver, MatrixTopology, PanelInstance, PanelSpec,
    ResolvedCanvas, Rotation, ScaleMultiplier, ScreenPoint, TopologyDocument, Viewport, WallPoint,
};

// --- Layer re-exports ------------------------------------------------------

pub use ledwall_layers::{
    ConfigDocument, DocumentError, DragEffect, DragPositioner, DragTransition, Element,
    ElementKey, ElementKind, LayerChange, LayerId, LayerOutcome, LayerStack, Settings,
};

// --- Runtime re-exports ----------------------------------------------------

pub use ledwall_runtime::{
    Cmd, CommandSink, EditorConfig, EditorModel, EditorMsg, FileCommandSink, MemorySync, Model,
    Notice, Program, ProgramSimulator, RemoteSync, RenderCommand, SyncConfig, TransportError,
};
#[cfg(feature = "http")]
pub use ledwall_runtime::HttpSync;

// --- Errors ---------------------------------------------------------------

/// Top-level error type for editor hosts.
#[derive(Debug)]
pub enum Error {
    /// I/O failure reading documents or writing the command file.
    Io(std::io::Error),
    Topology(TopologyError),
    Geometry(GeometryError),
    Document(DocumentError),
    Transport(TransportError),
    /// The editor finished loading without a usable canvas.
    Unresolved(Vec<Notice>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Topology(err) => write!(f, "{err}"),
            Self::Geometry(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "{err}"),
            Self::Unresolved(notices) => match notices.first() {
                Some(first) => write!(f, "wall layout not loaded: {first}"),
                None => write!(f, "wall layout not loaded"),
            },
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Topology(err) => Some(err),
            Self::Geometry(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::Unresolved(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TopologyError> for Error {
    fn from(err: TopologyError) -> Self {
        Self::Topology(err)
    }
}

impl From<GeometryError> for Error {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

impl From<DocumentError> for Error {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Standard result type for ledwall APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Cmd, ConfigDocument, EditorConfig, EditorModel, EditorMsg, Element, Error, LayerStack,
        MatrixTopology, Model, PointerEvent, Program, RemoteSync, Result, ScaleMultiplier,
        ScreenPoint, Viewport, WallPoint,
    };

    pub use crate::{core, layers, runtime};
}

pub use ledwall_core as core;
pub use ledwall_layers as layers;
pub use ledwall_runtime as runtime;
