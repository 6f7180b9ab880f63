//! # Skirmish Engine
//!
//! Headless host for the Skirmish combat simulation.
//!
//! This crate ties the combat core to a runnable program:
//! - Config: TOML runner settings wrapping the arena tuning
//! - Timing: frame deltas and the fixed physics step
//! - Animation: strike-frame stand-in for animation-driven swings
//! - Telemetry: event counts and the JSON run report
//! - App: the session loop

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod animation;
pub mod app;
pub mod config;
pub mod telemetry;
pub mod timing;
