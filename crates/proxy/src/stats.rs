//! In-memory relay counters.

use axum::http::StatusCode;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Gateway-wide request counters. Never records token or path data.
#[derive(Default)]
pub struct RelayStats {
    /// Requests forwarded to the upstream (any status).
    pub forwarded: AtomicU64,
    /// Forwarded requests answered with 2xx.
    pub upstream_success: AtomicU64,
    /// Forwarded requests answered with a non-2xx status (relayed as-is).
    pub upstream_error: AtomicU64,
    /// Upstream could not be reached.
    pub upstream_unavailable: AtomicU64,
    /// Proxy calls rejected for lack of a session.
    pub unauthenticated: AtomicU64,
    /// Successful logins.
    pub logins: AtomicU64,
    /// Callbacks whose code exchange failed.
    pub exchange_failures: AtomicU64,
}

/// JSON-serializable snapshot of the counters.
#[derive(Debug, Serialize)]
pub struct StatsSnapshot {
    pub forwarded: u64,
    pub upstream_success: u64,
    pub upstream_error: u64,
    pub upstream_unavailable: u64,
    pub unauthenticated: u64,
    pub logins: u64,
    pub exchange_failures: u64,
    pub active_sessions: usize,
}

impl RelayStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a response received from the upstream.
    pub fn record_relayed(&self, status: StatusCode) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        if status.is_success() {
            self.upstream_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.upstream_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_unavailable(&self) {
        self.upstream_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unauthenticated(&self) {
        self.unauthenticated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_exchange_failure(&self) {
        self.exchange_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a point-in-time snapshot.
    #[must_use]
    pub fn snapshot(&self, active_sessions: usize) -> StatsSnapshot {
        StatsSnapshot {
            forwarded: self.forwarded.load(Ordering::Relaxed),
            upstream_success: self.upstream_success.load(Ordering::Relaxed),
            upstream_error: self.upstream_error.load(Ordering::Relaxed),
            upstream_unavailable: self.upstream_unavailable.load(Ordering::Relaxed),
            unauthenticated: self.unauthenticated.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
            exchange_failures: self.exchange_failures.load(Ordering::Relaxed),
            active_sessions,
        }
    }
}
