use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::oneshot;

use crate::{
    error::{Error, Result},
    progress::Progress,
};

enum State<T> {
    Waiting(oneshot::Receiver<Result<T>>),
    Ready(Option<Result<T>>),
}

/// Outcome of a request queued on a connection.
///
/// The request is already queued when this value is returned; awaiting it
/// only waits for the answer, so the outcome is delivered on whatever task or
/// executor awaits it. Dropping it does not cancel the request.
#[must_use = "the outcome of the request is lost if this is dropped"]
pub struct Pending<T> {
    state: State<T>,
}

impl<T> Unpin for Pending<T> {}

impl<T> Pending<T> {
    pub(crate) const fn waiting(receiver: oneshot::Receiver<Result<T>>) -> Self {
        Self {
            state: State::Waiting(receiver),
        }
    }

    pub(crate) const fn ready(result: Result<T>) -> Self {
        Self {
            state: State::Ready(Some(result)),
        }
    }

    /// Takes the outcome without waiting, `None` while the request still runs.
    ///
    /// Once the outcome has been taken, later calls and polls report [`Error::Closed`].
    pub fn try_result(&mut self) -> Option<Result<T>> {
        match &mut self.state {
            State::Waiting(receiver) => match receiver.try_recv() {
                Ok(result) => {
                    self.state = State::Ready(None);
                    Some(result)
                }
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.state = State::Ready(None);
                    Some(Err(Error::Closed))
                }
            },
            State::Ready(result) => Some(result.take().unwrap_or(Err(Error::Closed))),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            State::Waiting(receiver) => match Pin::new(receiver).poll(cx) {
                Poll::Ready(result) => {
                    this.state = State::Ready(None);
                    Poll::Ready(result.unwrap_or(Err(Error::Closed)))
                }
                Poll::Pending => Poll::Pending,
            },
            State::Ready(result) => Poll::Ready(result.take().unwrap_or(Err(Error::Closed))),
        }
    }
}

/// A queued download.
///
/// The [`Progress`] is available right away to observe or cancel the transfer;
/// awaiting the download yields its outcome.
#[must_use = "the outcome of the download is lost if this is dropped"]
pub struct Download {
    progress: Arc<Progress>,
    result: Pending<()>,
}

impl Download {
    pub(crate) const fn new(progress: Arc<Progress>, result: Pending<()>) -> Self {
        Self { progress, result }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<Progress> {
        self.progress.clone()
    }

    /// See [`Pending::try_result`].
    pub fn try_result(&mut self) -> Option<Result<()>> {
        self.result.try_result()
    }
}

impl Future for Download {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().result).poll(cx)
    }
}
