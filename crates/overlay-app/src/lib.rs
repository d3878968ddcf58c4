//! Shared library surface for the overlay process and its tests.

pub mod config;
pub mod host;
pub mod overlay;
