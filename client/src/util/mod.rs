//! Utility helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate environment concerns (clock, ids, local session
//! storage) from the synchronization layer to improve reuse and testability.

pub mod clock;
pub mod color;
pub mod ids;
pub mod persistence;
