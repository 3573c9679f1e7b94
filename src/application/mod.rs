//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic against a store:
//! - Action log (logging, rate-limit checks, bounded sweeps)
//! - Configuration (table names, default window and sweep policy)
//! - Metrics (counters of what the action log did)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod action_log;
pub mod config;
pub mod metrics;
pub mod ports;
