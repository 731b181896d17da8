#![forbid(unsafe_code)]

//! Editor runtime for the LED wall layout editor.
//!
//! The editor is an Elm-style [`Model`]: [`EditorModel`] holds the state,
//! [`EditorMsg`] is every input, and [`Cmd`] carries side effects (network
//! calls, renderer writes) back out to [`Program`] or, in tests,
//! [`ProgramSimulator`].
//!
//! # Role in the editor
//! - [`editor`]: the reducer tying topology, layers, and drag together.
//! - [`sync`]: the back-end channel ([`RemoteSync`]) with in-memory and
//!   blocking HTTP implementations.
//! - [`render_command`]: the line-oriented renderer command stream.
//! - [`config`]: defaults and environment overrides.
//!
//! # Feature flags
//! - `http`: [`HttpSync`] over `reqwest`'s blocking client.

pub mod config;
pub mod editor;
pub mod program;
pub mod render_command;
pub mod simulator;
pub mod subscription;
pub mod sync;

pub use config::{EditorConfig, parse_viewport};
pub use editor::{EditorModel, EditorMsg, Notice, NoticeSource, SyncOperation};
pub use program::{Cmd, Model, Program, TaskSpec};
pub use render_command::{
    CommandSink, DEFAULT_COMMAND_FILE, FileCommandSink, MemoryCommandSink, RenderCommand,
    RenderCommandParseError, RendererIds, parse_hex_color,
};
pub use simulator::{CmdRecord, ProgramSimulator};
pub use subscription::{ObserverRegistry, SubId};
#[cfg(feature = "http")]
pub use sync::HttpSync;
pub use sync::{
    LayerOrder, LayerUpdate, MemorySync, PositionUpdate, RemoteSync, SyncConfig, SyncRequest,
    SyncResult, TransportError,
};
