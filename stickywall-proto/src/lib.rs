//! Shared definitions for Sticky Wall: the task document model, the
//! identity-service error vocabulary, and the WebSocket wire format.

pub mod auth;
pub mod task;
pub mod wire;
