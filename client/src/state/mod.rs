//! Client-side state holders.
//!
//! SYSTEM CONTEXT
//! ==============
//! `observable` is the publish/subscribe primitive the chat service exposes
//! its state through, `session` derives the active chat scope from the
//! current user and partner, and `composer` holds the input guards front ends
//! run before calling into the service.

pub mod composer;
pub mod observable;
pub mod session;
