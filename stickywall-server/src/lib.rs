//! Sticky Wall development server library.
//!
//! Exposes the server for use in tests and embedding. The server accepts
//! WebSocket connections, answers sign-in and registration requests, and
//! serves live task collections to every connected client.

pub mod accounts;
pub mod config;
pub mod documents;
pub mod server;
