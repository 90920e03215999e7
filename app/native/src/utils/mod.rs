//! Shared utilities.

pub mod thread;
