#![forbid(unsafe_code)]

//! Logging support.
//!
//! Geometry resolution runs on every viewport resize, so this crate keeps
//! `tracing` optional. With the `tracing` feature the macros below are the
//! real `tracing` macros; without it they expand to nothing and call sites
//! never need `cfg` guards.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}
