//! Shared test utilities for scriptloom integration tests.
//!
//! This module provides:
//! - Scripted fakes for the remote API, the text generator and the script generator
//! - `TestHarness` wiring a queue over an in-memory or on-disk database
//! - Canned outline texts and response builders

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::{queue_config, TestHarness};
