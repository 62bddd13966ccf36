//! Sticky Wall: live sticky-note task board library.

pub mod app;
pub mod auth;
pub mod board;
pub mod config;
pub mod remote;
pub mod store;
pub mod ui;
