//! Application core: pure domain logic, zero I/O.
//!
//! The record layout, cycle timing and the sampling loop itself.  All
//! interaction with hardware and files happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without a rig.

pub mod commands;
pub mod events;
pub mod ports;
pub mod record;
pub mod series;
pub mod service;
pub mod timing;
