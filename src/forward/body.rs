//! Response body relay applying a [`FlushPolicy`].
//!
//! The relay owns the upstream body. When the client goes away the server
//! drops the response body, the relay is dropped with it, and dropping the
//! upstream body closes the upstream connection. No explicit cancellation
//! token is needed.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::http::HeaderMap;
use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};

use crate::forward::target::FlushPolicy;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body wrapper relaying an upstream response to the client.
pub struct RelayBody<B> {
    inner: B,
    policy: FlushPolicy,
    buffer: BytesMut,
    capacity: usize,
    trailers: Option<HeaderMap>,
    upstream_done: bool,
    relayed: u64,
    upstream: String,
}

impl<B> RelayBody<B> {
    /// `capacity` is the flush threshold for [`FlushPolicy::Buffered`].
    pub fn new(inner: B, policy: FlushPolicy, capacity: usize) -> Self {
        Self {
            inner,
            policy,
            buffer: BytesMut::new(),
            capacity: capacity.max(1),
            trailers: None,
            upstream_done: false,
            relayed: 0,
            upstream: String::new(),
        }
    }

    /// Upstream name used in log events.
    pub fn with_upstream(mut self, upstream: impl Into<String>) -> Self {
        self.upstream = upstream.into();
        self
    }

    /// Bytes handed to the client so far.
    pub fn relayed_bytes(&self) -> u64 {
        self.relayed
    }

    fn take_buffer(&mut self) -> Bytes {
        self.relayed += self.buffer.len() as u64;
        self.buffer.split().freeze()
    }
}

impl<B> RelayBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    fn poll_streaming(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        match ready!(Pin::new(&mut self.inner).poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    self.relayed += data.len() as u64;
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(e)) => Poll::Ready(Some(Err(self.upstream_failed(e.into())))),
            None => {
                self.upstream_done = true;
                Poll::Ready(None)
            }
        }
    }

    fn poll_buffered(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        loop {
            if self.upstream_done {
                if !self.buffer.is_empty() {
                    return Poll::Ready(Some(Ok(Frame::data(self.take_buffer()))));
                }
                return Poll::Ready(self.trailers.take().map(|t| Ok(Frame::trailers(t))));
            }

            match ready!(Pin::new(&mut self.inner).poll_frame(cx)) {
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) => {
                        self.buffer.extend_from_slice(&data);
                        if self.buffer.len() >= self.capacity {
                            return Poll::Ready(Some(Ok(Frame::data(self.take_buffer()))));
                        }
                    }
                    Err(frame) => {
                        // Trailers end the body.
                        if let Ok(trailers) = frame.into_trailers() {
                            self.trailers = Some(trailers);
                            self.upstream_done = true;
                        }
                    }
                },
                Some(Err(e)) => return Poll::Ready(Some(Err(self.upstream_failed(e.into())))),
                None => self.upstream_done = true,
            }
        }
    }

    fn upstream_failed(&mut self, error: BoxError) -> BoxError {
        // Bytes already sent cannot be taken back; the client stream is cut here.
        self.upstream_done = true;
        self.buffer.clear();
        tracing::warn!(
            upstream = %self.upstream,
            policy = %self.policy,
            relayed_bytes = self.relayed,
            error = %error,
            "Upstream body failed mid-relay"
        );
        error
    }
}

impl<B> Body for RelayBody<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match this.policy {
            FlushPolicy::Streaming => this.poll_streaming(cx),
            FlushPolicy::Buffered => this.poll_buffered(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self.policy {
            FlushPolicy::Streaming => self.upstream_done || self.inner.is_end_stream(),
            FlushPolicy::Buffered => {
                self.buffer.is_empty()
                    && self.trailers.is_none()
                    && (self.upstream_done || self.inner.is_end_stream())
            }
        }
    }

    fn size_hint(&self) -> SizeHint {
        if self.relayed == 0 && self.buffer.is_empty() && !self.upstream_done {
            self.inner.size_hint()
        } else {
            SizeHint::default()
        }
    }
}

impl<B> Drop for RelayBody<B> {
    fn drop(&mut self) {
        if !self.upstream_done {
            tracing::debug!(
                upstream = %self.upstream,
                policy = %self.policy,
                relayed_bytes = self.relayed,
                "Client gone before upstream finished, dropping upstream response"
            );
        }
    }
}
