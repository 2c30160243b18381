//! HTTP surface of the extension.
//!
//! # Data Flow
//! ```text
//! request
//!     → SetRequestId → Trace → PropagateRequestId → Timeout
//!     → handlers.rs (actions) / events::handlers (listeners) / index.rs
//!     → JSON response
//! ```

pub mod handlers;
pub mod index;
pub mod server;

pub use server::{build_router, AppState, HttpServer, X_REQUEST_ID};
