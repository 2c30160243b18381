//! Datadog extension for chaos experiments.
//!
//! Offers two actions against Datadog monitors:
//! - a status check that polls a monitor and verifies it reports the
//!   expected states, either all the time or at least once
//! - a downtime that mutes a monitor for the duration of a step
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!   orchestrator     │                 EXTENSION                    │
//!   ─────────────────┼─▶ http ──▶ actions ──▶ datadog ─────────────┼──▶ Datadog API
//!                    │   │          │  ▲                            │
//!                    │   ▼          ▼  │                            │
//!                    │ events    resilience (fixed retry budget)    │
//!                    │ (step registry)                              │
//!                    │                                              │
//!                    │  config · observability · lifecycle          │
//!                    └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod actions;
pub mod config;
pub mod datadog;
pub mod events;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ExtensionConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
