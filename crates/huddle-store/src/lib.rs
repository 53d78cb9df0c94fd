//! # huddle-store
//!
//! Normalised client-side cache of the messaging server's entities.
//!
//! State lives in an immutable, `Arc`-shared tree ([`GlobalState`]). Every
//! change goes through a closed [`Action`] enum and a set of pure reducers;
//! a reducer that has nothing to change hands back the very same `Arc`, so
//! consumers detect changes with `Arc::ptr_eq`. The [`Store`] runs the
//! reducers and notifies subscribers, and [`SnapshotStore`] keeps an offline
//! copy of the entities in SQLite.

pub mod action;
pub mod migrations;
pub mod persist;
pub mod reducers;
pub mod selectors;
pub mod state;
pub mod store;
pub mod unreads;

mod error;

pub use action::{
    Action, ChannelAction, EmojiAction, ErrorAction, JobAction, PostAction, RequestAction,
    RoleAction, SearchAction, TeamAction, UserAction,
};
pub use error::{Result, StoreError};
pub use persist::SnapshotStore;
pub use reducers::errors::LoggedError;
pub use reducers::posts::MessageType;
pub use reducers::requests::{RequestOp, RequestPhase, RequestState, RequestStatus, StoredError};
pub use state::{EntitiesState, GlobalState};
pub use store::Store;
