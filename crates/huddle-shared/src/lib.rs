//! # huddle-shared
//!
//! Entity types mirrored from the messaging server, shared by the store and
//! the REST client.

pub mod constants;
pub mod error;
pub mod models;
pub mod types;

pub use error::{IntlMessage, ServerError};
pub use models::*;
pub use types::{ChannelId, PostId, TeamId, UserId};
