//! Document tracking for a local government office.
//!
//! Staff encode incoming documents, route them between departments and mark
//! them received, released or completed; the public can look up a document's
//! status and history without signing in.

pub mod assets;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod realtime;
pub mod state;
pub mod store;
pub mod views;
