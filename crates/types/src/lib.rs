//! Core types and traits for the canvasgate workspace.
//!
//! This crate defines the shared abstractions used across all layers of the
//! gateway: the error taxonomy, the access-token wrapper, opaque session
//! credentials, and the session-store trait the other crates implement or
//! consume.

pub mod error;
pub mod session;
pub mod token;
pub mod traits;

pub use error::{GateError, Result};
pub use session::{BoundSession, SessionId};
pub use token::{AccessToken, unix_now};
pub use traits::SessionStore;
