// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

pub(crate) trait Cubit {
    type State;

    fn close(&mut self);

    fn is_closed(&self) -> bool;

    fn state(&self) -> Self::State;

    fn stream(&self) -> WatchStream<Self::State>;
}

pub(crate) struct CubitCore<S> {
    state_tx: watch::Sender<S>,
    cancel: CancellationToken,
}

impl<S> Drop for CubitCore<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<S: Clone + Send + Sync + 'static> Cubit for CubitCore<S> {
    type State = S;

    fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }

    fn state(&self) -> S {
        self.state_tx.borrow().clone()
    }

    /// Yields the current state immediately, then every change.
    fn stream(&self) -> WatchStream<S> {
        WatchStream::new(self.state_tx.subscribe())
    }
}

impl<S> CubitCore<S>
where
    S: Default + Clone + Send + Sync + fmt::Debug + 'static,
{
    pub(crate) fn new() -> Self {
        Self::with_initial_state(S::default())
    }

    pub(crate) fn with_initial_state(state: S) -> Self {
        let (state_tx, _state_rx) = watch::channel(state);
        Self {
            state_tx,
            cancel: CancellationToken::new(),
        }
    }

    pub(crate) fn state_tx(&self) -> &watch::Sender<S> {
        &self.state_tx
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
