//! Canvas OAuth 2.0 authorization-code flow and session binding.
//!
//! [`canvas`] holds the pure URL/form builders and response parsing,
//! [`exchange`] performs the single token-endpoint call, and
//! [`SessionManager`] binds the resulting token to an opaque session id.

pub mod canvas;
pub mod exchange;
pub mod manager;

pub use exchange::TokenExchanger;
pub use manager::SessionManager;
