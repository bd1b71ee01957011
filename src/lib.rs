//! Bioreactor data-acquisition library.
//!
//! Exposes the sampling loop, its ports and every adapter for integration
//! testing.  Board bindings live behind the `linux` feature; the live plot
//! behind `plot`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod scheduler;
pub mod sensors;
