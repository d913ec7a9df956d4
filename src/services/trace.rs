//! Per-request trace correlation.
//!
//! A [`TraceToken`] is bound for the duration of one logical unit of work
//! with [`scope`] (async) or [`sync_scope`] (blocking). The slot is
//! task-local, so concurrent requests never observe each other's token, and
//! it is released when the scope exits, whether the work succeeded, failed
//! or panicked.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Value reported when no token is bound in the calling context.
pub const NO_TRACE_ID: &str = "no-trace-id";

tokio::task_local! {
    static TRACE_ID: TraceToken;
}

/// Opaque correlation identifier for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceToken(Arc<str>);

impl TraceToken {
    /// Mints a fresh, unique token.
    pub fn generate() -> Self {
        Self(Arc::from(Uuid::new_v4().to_string()))
    }

    /// Reuses an externally supplied identifier verbatim, or mints one when
    /// the caller sent nothing usable.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self(Arc::from(v)),
            _ => Self::generate(),
        }
    }

    /// The "no-trace-id" sentinel.
    pub fn none() -> Self {
        Self(Arc::from(NO_TRACE_ID))
    }

    pub fn is_none(&self) -> bool {
        &*self.0 == NO_TRACE_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TraceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token bound to the calling task, or the sentinel if none is bound.
pub fn current() -> TraceToken {
    TRACE_ID
        .try_with(|token| token.clone())
        .unwrap_or_else(|_| TraceToken::none())
}

/// Runs `fut` with `token` bound; the binding ends when `fut` completes.
pub async fn scope<F: Future>(token: TraceToken, fut: F) -> F::Output {
    TRACE_ID.scope(token, fut).await
}

/// Blocking counterpart of [`scope`].
pub fn sync_scope<F, R>(token: TraceToken, f: F) -> R
where
    F: FnOnce() -> R,
{
    TRACE_ID.sync_scope(token, f)
}

/// `tokio::task::spawn_blocking` that carries the caller's token onto the
/// blocking thread.
pub fn spawn_blocking<F, R>(f: F) -> tokio::task::JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let token = current();
    tokio::task::spawn_blocking(move || sync_scope(token, f))
}
