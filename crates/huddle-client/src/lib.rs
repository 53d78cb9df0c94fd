//! # huddle-client
//!
//! REST client for the messaging server, plus the async actions that run a
//! request and feed its outcome into a [`huddle_store::Store`].

pub mod actions;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;

#[cfg(test)]
mod testing;

pub use client::{Client, FetchResponse, UploadFile};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::ClientEvent;
