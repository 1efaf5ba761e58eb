//! Remote document store access.
//!
//! SYSTEM CONTEXT
//! ==============
//! `store` defines the trait every backend implements, `query` the portable
//! query model, `memory` and `firestore` the two backends, and `types` the
//! user/message records exchanged with the store.

pub mod firestore;
pub mod memory;
pub mod query;
pub mod store;
pub mod types;
