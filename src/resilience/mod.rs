//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Status poll:
//!     → retries.rs (fixed attempt budget around the monitor fetch)
//!     → On exhaustion: last error becomes a fatal poll error
//! ```
//!
//! # Design Decisions
//! - No state carries over between polls; each poll gets a fresh budget
//! - Timeouts are the HTTP client's concern, not the retry loop's

pub mod retries;
