use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::debug;
use uuid::Uuid;

use crate::error::{LocalError, NetworkError};

/// The state of a spawned dispatch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    /// Dispatch is in progress
    Pending,
    /// Dispatch produced a response
    Complete,
    /// Dispatch produced an error
    Failed,
    /// Dispatch was cancelled and will never produce a result
    Cancelled,
}

type Outcome<R, E> = Result<R, NetworkError<E>>;

/// Handle to a dispatch running on the tokio runtime.
///
/// The result is delivered at most once, to whoever holds the handle.
/// Cancelling (or dropping the handle) before the transport answers stops
/// the dispatch before anything is decoded.
pub struct DispatchHandle<R, E> {
    id: String,
    state: RequestState,
    result: Option<oneshot::Receiver<Outcome<R, E>>>,
    cancel: Option<oneshot::Sender<()>>,
}

/// The task side of a [`DispatchHandle`].
pub(crate) struct Completion<R, E> {
    id: String,
    result: oneshot::Sender<Outcome<R, E>>,
    cancel: oneshot::Receiver<()>,
}

pub(crate) fn pair<R, E>() -> (DispatchHandle<R, E>, Completion<R, E>) {
    let id = Uuid::new_v4().to_string();
    let (result_tx, result_rx) = oneshot::channel();
    let (cancel_tx, cancel_rx) = oneshot::channel();
    (
        DispatchHandle {
            id: id.clone(),
            state: RequestState::Pending,
            result: Some(result_rx),
            cancel: Some(cancel_tx),
        },
        Completion {
            id,
            result: result_tx,
            cancel: cancel_rx,
        },
    )
}

impl<R, E> Completion<R, E> {
    /// Drive `dispatch` unless the handle cancels first.
    pub(crate) async fn run<F>(self, dispatch: F)
    where
        F: Future<Output = Outcome<R, E>>,
    {
        let Completion { id, result, cancel } = self;
        tokio::select! {
            biased;
            _ = cancel => {
                debug!(id = %id, "dispatch cancelled");
            }
            outcome = dispatch => {
                if result.send(outcome).is_err() {
                    debug!(id = %id, "dispatch finished after its handle went away");
                }
            }
        }
    }
}

fn vanished<R, E>() -> Outcome<R, E> {
    Err(NetworkError::Local(LocalError::Unknown {
        message: "dispatch ended without a result".to_string(),
    }))
}

impl<R, E> DispatchHandle<R, E> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Pending
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == RequestState::Cancelled
    }

    /// Cancel the dispatch. No result is delivered afterwards, even one that
    /// was already on its way.
    pub fn cancel(&mut self) {
        if self.state != RequestState::Pending {
            return;
        }
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.result = None;
        self.state = RequestState::Cancelled;
        debug!(id = %self.id, "cancel requested");
    }

    /// Take the result if it is ready. Returns `None` while pending, after
    /// cancellation and once the result has been taken.
    pub fn try_result(&mut self) -> Option<Outcome<R, E>> {
        let receiver = self.result.as_mut()?;
        let outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => vanished(),
        };
        self.finish(&outcome);
        Some(outcome)
    }

    /// Wait for the result. Returns `None` if the dispatch was cancelled or
    /// the result was already taken.
    pub async fn wait(&mut self) -> Option<Outcome<R, E>> {
        let receiver = self.result.as_mut()?;
        let outcome = receiver.await.unwrap_or_else(|_| vanished());
        self.finish(&outcome);
        Some(outcome)
    }

    fn finish(&mut self, outcome: &Outcome<R, E>) {
        self.result = None;
        self.cancel = None;
        self.state = if outcome.is_ok() {
            RequestState::Complete
        } else {
            RequestState::Failed
        };
    }
}

impl<R, E> std::fmt::Debug for DispatchHandle<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}
