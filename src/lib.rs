//! Rangefinder firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod ranging;

// The ESP-IDF-only pieces compile to simulation stubs on the host.
pub mod adapters;
pub mod drivers;
