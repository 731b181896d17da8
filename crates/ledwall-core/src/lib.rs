#![forbid(unsafe_code)]

//! Core: wall geometry, panel topology, and pointer events.

pub mod event;
pub mod geometry;
pub mod logging;
pub mod resolver;
pub mod topology;

pub use geometry::{CanvasExtent, ScaleMultiplier, ScreenPoint, Viewport, WallPoint};
pub use resolver::{GeometryError, GeometryResolver, ResolvedCanvas};
pub use topology::{MatrixTopology, PanelInstance, PanelSpec, Rotation, TopologyDocument};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
