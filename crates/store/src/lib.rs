//! Session storage backends.
//!
//! Sessions live only as long as the gateway process; the in-memory store is
//! the single backend.

pub mod memory;

pub use memory::InMemorySessionStore;
