//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGTERM / Ctrl+C → Shutdown::trigger
//!     → HTTP server stops accepting, drains in-flight requests → exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
