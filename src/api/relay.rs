use crate::core::{ReleaseReason, ReleaseStats};
use axum::body::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Outbound body that relays upstream chunks and owns the upstream exchange.
///
/// The upstream stream is released exactly once, on whichever comes first:
/// the stream ends, a chunk fails, or the relay is dropped before the end
/// (the client went away). Release drops the upstream body. hyper only puts
/// the connection back into the pool when the body was read to the end; a
/// body dropped early or after an error closes its connection instead.
pub struct RelayStream<S> {
    upstream: Option<S>,
    stats: Arc<ReleaseStats>,
    request_id: String,
    released: bool,
}

impl<S> RelayStream<S> {
    pub fn new(upstream: S, stats: Arc<ReleaseStats>, request_id: String) -> Self {
        stats.record_open();
        Self {
            upstream: Some(upstream),
            stats,
            request_id,
            released: false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn release(&mut self, reason: ReleaseReason) {
        if self.released {
            return;
        }
        self.released = true;
        drop(self.upstream.take());
        self.stats.record_release(&reason);

        match &reason {
            ReleaseReason::Completed => {
                tracing::debug!(request_id = %self.request_id, "Upstream stream completed")
            }
            ReleaseReason::ClientDisconnect => {
                tracing::info!(request_id = %self.request_id, "Client disconnect detected - upstream released")
            }
            ReleaseReason::UpstreamError(e) => {
                tracing::warn!(request_id = %self.request_id, error = %e, "Upstream stream failed")
            }
        }
    }
}

impl<S, E> Stream for RelayStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        match Pin::new(upstream).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(e))) => {
                self.release(ReleaseReason::UpstreamError(e.to_string()));
                Poll::Ready(Some(Err(std::io::Error::other(e))))
            }
            Poll::Ready(None) => {
                self.release(ReleaseReason::Completed);
                Poll::Ready(None)
            }
        }
    }
}

impl<S> Drop for RelayStream<S> {
    fn drop(&mut self) {
        self.release(ReleaseReason::ClientDisconnect);
    }
}
