//! Overlay feed - real-time position stream integration
//!
//! Connects to the streaming channel, joins the tracked room and turns
//! matching observations into poses.

pub mod client;
pub mod decode;
pub mod error;
pub mod listener;

pub use client::{listen, FeedClient, FeedSession, FeedStats};
pub use decode::{decode_payload, Envelope, FeedPayload, Numeric, JOIN_EVENT};
pub use error::{DecodeError, FeedError};
pub use listener::{Disposition, FeedListener};
