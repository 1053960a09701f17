//! Live planet snapshots as a [`Stream`].
//!
//! [`PlanetStream`] wraps a store observer. It is lazy: nothing is
//! registered until the first poll. Dropping the stream closes the observer.
//! Restarting means asking the service for a new stream.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use orrery_core::{Document, Planet};
use tokio::sync::mpsc;

use crate::query::Query;
use crate::repositories::PlanetRepo;
use crate::service::ServiceError;
use crate::store::{ObserverCallback, ObserverHandle, Store};

enum State {
    Idle,
    Live {
        receiver: mpsc::UnboundedReceiver<Vec<Planet>>,
        // Held for its drop: closes the observer with the stream.
        _observer: ObserverHandle,
    },
    Done,
}

/// Stream of complete planet snapshots from a live query.
///
/// Yields `Err` once and then ends if the observer cannot be registered.
pub struct PlanetStream {
    store: Arc<dyn Store>,
    query: Query,
    state: State,
}

impl PlanetStream {
    pub(crate) fn new(store: Arc<dyn Store>, query: Query) -> Self {
        Self {
            store,
            query,
            state: State::Idle,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Whether the underlying observer is currently registered.
    pub fn is_live(&self) -> bool {
        matches!(self.state, State::Live { .. })
    }

    fn register(&mut self) -> Result<(), ServiceError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let callback: ObserverCallback = Arc::new(move |docs: Vec<Document>| {
            // A closed receiver means the stream is being dropped.
            let _ = sender.send(PlanetRepo::decode_all(docs));
        });

        let observer = self.store.register_observer(self.query.clone(), callback)?;
        tracing::debug!(query = %self.query, "Planet stream started");

        self.state = State::Live {
            receiver,
            _observer: observer,
        };
        Ok(())
    }
}

impl Stream for PlanetStream {
    type Item = Result<Vec<Planet>, ServiceError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let State::Idle = this.state {
            if let Err(e) = this.register() {
                this.state = State::Done;
                return Poll::Ready(Some(Err(e)));
            }
        }

        match &mut this.state {
            State::Live { receiver, .. } => match receiver.poll_recv(cx) {
                Poll::Ready(Some(planets)) => Poll::Ready(Some(Ok(planets))),
                Poll::Ready(None) => {
                    this.state = State::Done;
                    Poll::Ready(None)
                }
                Poll::Pending => Poll::Pending,
            },
            State::Idle | State::Done => Poll::Ready(None),
        }
    }
}

impl Drop for PlanetStream {
    fn drop(&mut self) {
        if self.is_live() {
            tracing::debug!(query = %self.query, "Planet stream dropped, closing observer");
        }
    }
}
