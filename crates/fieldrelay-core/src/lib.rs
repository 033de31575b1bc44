//! Core types and in-memory state for the fieldrelay service.
//!
//! This crate is deliberately free of HTTP dependencies. It owns the
//! coordinate and notification stores, the push-subscriber registry, and the
//! [`Relay`](relay::Relay) object that ties them together.

pub mod coordinate;
pub mod error;
pub mod notification;
pub mod relay;
pub mod subscriber;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use relay::Relay;
