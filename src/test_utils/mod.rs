//! Test utilities shared by unit and route tests.
//!
//! - Factories for valid fixtures and test configuration
//! - In-memory store implementations of the auth ports
//! - `TestAppStateBuilder` for HTTP-level tests

mod app_state_builder;
mod auth_mocks;
mod factories;

pub use app_state_builder::*;
pub use auth_mocks::*;
pub use factories::*;
