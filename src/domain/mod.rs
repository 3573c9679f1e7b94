//! Domain layer - pure business logic with no I/O.
//!
//! This layer contains the core concepts of the action log:
//! - Action records, actors and pseudonymised user identities
//! - Rate-limit windows and retention (sweep) policies
//! - Content checksums
//! - Locale and calendar helpers for bot messages
//!
//! All types in this layer are pure and easily testable.

pub mod digest;
pub mod jalali;
pub mod locale;
pub mod policy;
pub mod record;
