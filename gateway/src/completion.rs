use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::errors::Error;
use crate::settings::ResumeData;

/// The terminal value of a session run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Resume data to hand to the next session constructor, if the
    /// disconnect was resumable.
    pub resume: Option<ResumeData>,
    /// Whether the reconnect supervisor should apply a pre-reconnect delay.
    pub wait: bool,
}

/// Sender-side half of a single-fire completion signal. Every termination
/// site calls `complete`; only the first call has any effect, satisfying the
/// "all completions are idempotent" invariant.
pub(crate) struct Completion<T> {
    tx: Option<oneshot::Sender<T>>,
}

impl<T> Completion<T> {
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Completes the signal if it hasn't already fired. No-op otherwise.
    pub fn complete(&mut self, value: T) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(value);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.tx.is_some()
    }
}

/// Consumed by the reconnect supervisor: resolves once the session ends, with
/// resume data and a wait hint, or fails with the error that ended it.
pub struct SessionOutcome(oneshot::Receiver<Result<Outcome, Arc<Error>>>);

impl SessionOutcome {
    pub(crate) fn new(rx: oneshot::Receiver<Result<Outcome, Arc<Error>>>) -> Self {
        Self(rx)
    }
}

impl Future for SessionOutcome {
    type Output = Result<Outcome, Arc<Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().0).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Arc::new(Error::AbruptTermination))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Fires on the first inbound `Ready` or `Resumed`, letting the supervisor
/// reset its reconnect backoff counter. Fails if the session dies before
/// either ever arrives.
pub struct SuccessfulStart(oneshot::Receiver<Result<(), Arc<Error>>>);

impl SuccessfulStart {
    pub(crate) fn new(rx: oneshot::Receiver<Result<(), Arc<Error>>>) -> Self {
        Self(rx)
    }
}

impl Future for SuccessfulStart {
    type Output = Result<(), Arc<Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().0).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Arc::new(Error::AbruptTermination))),
            Poll::Pending => Poll::Pending,
        }
    }
}
