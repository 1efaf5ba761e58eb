//! # chatline-client
//!
//! Client-side chat state and synchronization layer. A [`ChatService`]
//! mediates between a front end and a hosted document database: it holds the
//! roster, the session identity, the selected chat partner and the live
//! message stream, and it is the only component that reads from or writes to
//! the remote store.
//!
//! The store is reached through the [`DocumentStore`] trait so the same
//! service runs against the in-memory store (tests, local demo) or the
//! Firestore REST adapter.
//!
//! [`ChatService`]: services::chat::ChatService
//! [`DocumentStore`]: net::store::DocumentStore

pub mod config;
pub mod net;
pub mod services;
pub mod state;
pub mod util;
pub mod view;
