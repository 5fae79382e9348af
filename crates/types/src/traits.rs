//! Async traits shared across canvasgate crates.
//!
//! Cross-crate abstractions live here so that higher layers depend only on
//! `canvasgate-types`, not on each other.

use crate::{BoundSession, SessionId, error::Result};
use async_trait::async_trait;

/// Server-side storage of session bindings, keyed by the opaque [`SessionId`].
///
/// Writes happen once per login (`insert`) and once per logout (`remove`);
/// request handling only ever calls `get`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a binding under `id`, replacing any previous one.
    async fn insert(&self, id: &SessionId, session: BoundSession) -> Result<()>;
    /// Look up a binding. Expiry is the caller's concern.
    async fn get(&self, id: &SessionId) -> Result<Option<BoundSession>>;
    /// Remove and return the binding for `id`, if any.
    async fn remove(&self, id: &SessionId) -> Result<Option<BoundSession>>;
    /// Number of stored bindings.
    async fn count(&self) -> Result<usize>;

    /// Drop every binding for which `keep` returns `false`; returns how many were dropped.
    async fn retain(
        &self,
        keep: &(dyn for<'a> Fn(&'a BoundSession) -> bool + Sync),
    ) -> Result<usize>;
}
