//! Client session management.

pub mod client;
pub mod state;

pub use client::Session;
pub use state::SessionState;
