//! Upstream throttling
//!
//! A soft per-key throttle: it delays callers, it never refuses them.

pub mod cooldown;

pub use cooldown::CooldownGate;
