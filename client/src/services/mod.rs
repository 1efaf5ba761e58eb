//! Synchronization services used by front ends.
//!
//! ARCHITECTURE
//! ============
//! Service modules own every read from and write to the document store so
//! front ends can stay focused on rendering published state and forwarding
//! user intents.

pub mod chat;
