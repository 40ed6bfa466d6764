//! Transport contract and the decorators that compose into a chain.
//!
//! A chain is a singly linked list of [`Transport`] values: every decorator owns exactly one
//! `next` transport and the innermost leaf performs the network call. [`Transport::send`]
//! resolves exactly once per call with a [`TransportOutcome`], and [`Transport::cancel`] walks
//! the list from the head to the leaf synchronously. Only the leaf owns in-flight work, so only
//! the leaf performs a real cancellation; in-flight sends then resolve to
//! [`TransportFailure::Cancelled`](crate::error::TransportFailure::Cancelled).

pub mod background;
pub mod chain;
pub mod headers;
pub mod outcome;
pub mod token_auth;

#[cfg(feature = "reqwest")] mod leaf;

pub use background::*;
pub use chain::*;
pub use headers::*;
pub use outcome::*;
#[cfg(feature = "reqwest")] pub use leaf::*;
pub use token_auth::*;

// crates.io
use http::HeaderMap;
// self
use crate::{_prelude::*, request::WireRequest};

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = TransportOutcome> + 'a + Send>>;

/// Turns a [`WireRequest`] into a [`TransportOutcome`] asynchronously and supports cancellation.
///
/// Decorators implement [`next`](Transport::next) to expose the transport they forward to.
/// The default [`cancel`](Transport::cancel) forwards to that transport; implementations that
/// override it must keep forwarding, otherwise cancellation stops halfway down the chain.
pub trait Transport
where
	Self: Send + Sync,
{
	/// Sends the request and resolves once with its outcome.
	fn send(&self, request: WireRequest) -> TransportFuture<'_>;

	/// Transport this one forwards to; `None` for the leaf.
	fn next(&self) -> Option<&dyn Transport>;

	/// Cancels in-flight sends.
	fn cancel(&self) {
		if let Some(next) = self.next() {
			next.cancel();
		}
	}
}
impl<T> Transport for Arc<T>
where
	T: ?Sized + Transport,
{
	fn send(&self, request: WireRequest) -> TransportFuture<'_> {
		(**self).send(request)
	}

	fn next(&self) -> Option<&dyn Transport> {
		(**self).next()
	}

	fn cancel(&self) {
		(**self).cancel()
	}
}

/// Response received from a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
	/// Received HTTP status code.
	pub status: StatusCode,
	/// Received headers, if the transport provides them.
	pub headers: HeaderMap,
	/// Raw response body; empty when the server sent none.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Creates a response without headers.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Replaces the response headers.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;

		self
	}

	/// Returns the body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> std::borrow::Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}
}
