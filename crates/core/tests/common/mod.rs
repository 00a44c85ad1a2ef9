//! Common test utilities for the supervisor integration tests.
//!
//! - Fixture worker configuration (`mock_worker.sh`)
//! - Event collection helpers with timeouts
//! - Custom assertions over event sequences

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
pub use fixtures::*;
