//! Scoped request lifetimes.
//!
//! A [`RequestScope`] belongs to whatever view started the requests. Futures
//! run through one of its [`ScopeHandle`]s resolve to [`Cancelled`] as soon
//! as the scope is cancelled or dropped, so a response can never land in a
//! view that is gone.

use std::future::Future;

use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request cancelled: its scope has ended")]
pub struct Cancelled;

/// Owner side of a scope. Dropping it cancels every pending request.
#[derive(Debug)]
pub struct RequestScope {
    cancel: watch::Sender<bool>,
}

impl RequestScope {
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self { cancel }
    }

    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle {
            cancelled: self.cancel.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// Cheap, clonable view of a scope used to run requests inside it.
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    cancelled: watch::Receiver<bool>,
}

impl ScopeHandle {
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Drives `future` until it completes or the scope ends, whichever is
    /// first. A future that loses the race is dropped unfinished.
    pub async fn run<F>(
        &self,
        future: F,
    ) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        let mut cancelled = self.cancelled.clone();

        tokio::select! {
            biased;
            _ = cancelled.wait_for(|c| *c) => Err(Cancelled),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn completes_while_scope_alive() {
        let scope = RequestScope::new();

        let result = scope.handle().run(async { 42 }).await;

        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn cancelled_scope_refuses_new_work() {
        let scope = RequestScope::new();
        let handle = scope.handle();
        scope.cancel();

        assert_eq!(handle.run(async { 1 }).await, Err(Cancelled));
    }

    #[tokio::test]
    async fn dropping_scope_cancels_pending_request() {
        let scope = RequestScope::new();
        let handle = scope.handle();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let pending = tokio::spawn(async move {
            handle
                .run(async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    flag.store(true, Ordering::SeqCst);
                })
                .await
        });
        tokio::task::yield_now().await;
        drop(scope);

        let result = pending.await.unwrap();
        assert_eq!(result, Err(Cancelled));
        assert!(!finished.load(Ordering::SeqCst));
    }
}
