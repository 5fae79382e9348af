//! Session binding: maps opaque session ids to access tokens.
//!
//! Responsibilities:
//! - Issue a fresh [`SessionId`] for every successful exchange.
//! - Resolve ids to tokens, treating unknown, cleared and expired sessions
//!   uniformly as absent.
//! - Periodically sweep expired bindings from the store.
use canvasgate_config::SessionConfig;
use canvasgate_types::{AccessToken, BoundSession, Result, SessionId, SessionStore, unix_now};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    max_age: Option<u64>,
    honor_token_expiry: bool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            max_age: config.max_age_secs,
            honor_token_expiry: config.honor_token_expiry,
        }
    }

    /// Bind `token` to a newly generated session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails to persist the binding.
    pub async fn bind(&self, token: AccessToken) -> Result<SessionId> {
        let id = SessionId::generate();
        let now = unix_now();
        let session = BoundSession {
            token: Arc::new(token),
            created_at: now,
            expires_at: self.max_age.map(|age| now.saturating_add(age)),
        };
        self.store.insert(&id, session).await?;
        tracing::debug!(session = ?id, "session bound");
        Ok(id)
    }

    /// Resolve a session id to its token.
    ///
    /// Never fails: store errors are logged and reported as absent, so every
    /// caller fails closed.
    pub async fn resolve(&self, id: &SessionId) -> Option<Arc<AccessToken>> {
        match self.store.get(id).await {
            Ok(Some(session)) if session.is_live_at(unix_now(), self.honor_token_expiry) => {
                Some(session.token)
            }
            Ok(Some(_)) => {
                tracing::debug!(session = ?id, "session expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                None
            }
        }
    }

    /// Remove a binding (logout), returning the token it held.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails to remove the binding.
    pub async fn clear(&self, id: &SessionId) -> Result<Option<Arc<AccessToken>>> {
        let removed = self.store.remove(id).await?;
        if let Some(session) = &removed {
            tracing::debug!(
                session = ?id,
                age_secs = session.age_at(unix_now()),
                "session cleared"
            );
        }
        Ok(removed.map(|s| s.token))
    }

    /// Drop expired bindings; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn sweep(&self) -> Result<usize> {
        let now = unix_now();
        let honor = self.honor_token_expiry;
        let keep = move |s: &BoundSession| s.is_live_at(now, honor);
        self.store.retain(&keep).await
    }

    /// Number of stored bindings, live or not yet swept.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn active_sessions(&self) -> Result<usize> {
        self.store.count().await
    }

    /// Spawn a background task that calls [`SessionManager::sweep`] every `interval`.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; nothing to sweep yet.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep().await {
                    tracing::warn!(error = %e, "session sweep failed");
                }
            }
        })
    }
}
