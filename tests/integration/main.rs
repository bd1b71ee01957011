//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real hardware
//! and a simulated clock.

mod mock_hw;
mod ring_light_tests;
mod sampling_loop_tests;
