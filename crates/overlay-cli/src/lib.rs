//! Overlay CLI - command line tools for exercising the overlay.
//!
//! This crate provides:
//! - simulate_feed: local position feed server with a synthetic track

pub mod auth;
pub mod sim;
