//! Test doubles and helpers shared by unit and integration tests; enabled via `cfg(test)` or
//! the `test` crate feature.

pub use crate::_prelude::*;

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicBool, AtomicUsize, Ordering},
	task::{Context, Poll},
};
// crates.io
use futures::future::{self, AbortHandle, Abortable};
use http::Method;
// self
use crate::{
	auth::{ProviderFuture, Token, TokenPair, TokenProvider},
	error::{BoxError, RequestError, TransportFailure},
	request::{ApiRequest, WireRequest},
	transport::{Transport, TransportFuture, TransportOutcome, TransportResponse, classify},
};

/// Canned reply served by [`StubTransport`].
#[derive(Clone, Debug)]
pub enum StubReply {
	/// Classifies the given status and body.
	Status(u16, Vec<u8>),
	/// Fails with a network error.
	Network,
	/// Stays pending until the transport is cancelled.
	Pending,
}
impl StubReply {
	/// Shorthand for [`StubReply::Status`].
	pub fn status(code: u16, body: impl Into<Vec<u8>>) -> Self {
		Self::Status(code, body.into())
	}
}

/// Leaf transport that records requests and serves canned replies.
///
/// Replies queued with [`push`](StubTransport::push) are served first; afterwards every send
/// gets the fallback reply (`200 "Test"` by default).
pub struct StubTransport {
	fallback: StubReply,
	replies: Mutex<VecDeque<StubReply>>,
	history: Mutex<Vec<WireRequest>>,
	pending: Mutex<Vec<AbortHandle>>,
	cancels: AtomicUsize,
}
impl StubTransport {
	/// Creates a stub that answers every send with `fallback`.
	pub fn replying(fallback: StubReply) -> Self {
		Self {
			fallback,
			replies: Default::default(),
			history: Default::default(),
			pending: Default::default(),
			cancels: Default::default(),
		}
	}

	/// Queues a one-shot reply.
	pub fn push(&self, reply: StubReply) -> &Self {
		self.replies.lock().push_back(reply);

		self
	}

	/// Requests received so far, oldest first.
	pub fn history(&self) -> Vec<WireRequest> {
		self.history.lock().clone()
	}

	/// Most recent request.
	pub fn last_request(&self) -> Option<WireRequest> {
		self.history.lock().last().cloned()
	}

	/// Number of times [`Transport::cancel`] reached this transport.
	pub fn cancel_count(&self) -> usize {
		self.cancels.load(Ordering::SeqCst)
	}

	/// Number of pending sends that have not been cancelled.
	pub fn pending_count(&self) -> usize {
		self.pending.lock().len()
	}
}
impl Default for StubTransport {
	fn default() -> Self {
		Self::replying(StubReply::status(200, "Test"))
	}
}
impl Transport for StubTransport {
	fn send(&self, request: WireRequest) -> TransportFuture<'_> {
		self.history.lock().push(request);

		let reply = self.replies.lock().pop_front().unwrap_or_else(|| self.fallback.clone());

		match reply {
			StubReply::Status(code, body) => {
				let outcome = classify(code, Default::default(), body);

				Box::pin(future::ready(outcome))
			},
			StubReply::Network => Box::pin(future::ready(TransportOutcome::from(
				TransportFailure::network(std::io::Error::other("stub network failure")),
			))),
			StubReply::Pending => {
				let (handle, registration) = AbortHandle::new_pair();

				self.pending.lock().push(handle);

				let parked = Abortable::new(future::pending::<TransportOutcome>(), registration);

				Box::pin(async move {
					match parked.await {
						Ok(outcome) => outcome,
						Err(_) => TransportFailure::Cancelled.into(),
					}
				})
			},
		}
	}

	fn next(&self) -> Option<&dyn Transport> {
		None
	}

	fn cancel(&self) {
		self.cancels.fetch_add(1, Ordering::SeqCst);

		for handle in self.pending.lock().drain(..) {
			handle.abort();
		}
	}
}

/// Token provider that mints numbered tokens and counts its calls.
///
/// Fetches return `access-<n>`/`refresh-<n>`; refreshes return `refreshed-<n>`, where `<n>`
/// counts calls of that kind starting at zero.
pub struct StubTokenProvider {
	access_ttl: Option<Duration>,
	refresh_ttl: Option<Duration>,
	yields: usize,
	fail: AtomicBool,
	fetches: AtomicUsize,
	refreshes: AtomicUsize,
}
impl StubTokenProvider {
	/// Creates a provider whose tokens never expire.
	pub fn new() -> Self {
		Self {
			access_ttl: None,
			refresh_ttl: None,
			yields: 0,
			fail: AtomicBool::new(false),
			fetches: AtomicUsize::new(0),
			refreshes: AtomicUsize::new(0),
		}
	}

	/// Issues access tokens that expire after `ttl`.
	pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
		self.access_ttl = Some(ttl);

		self
	}

	/// Issues refresh tokens that expire after `ttl`.
	pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
		self.refresh_ttl = Some(ttl);

		self
	}

	/// Yields to the executor `yields` times before every answer.
	pub fn with_yields(mut self, yields: usize) -> Self {
		self.yields = yields;

		self
	}

	/// Makes subsequent calls fail (or succeed again).
	pub fn set_failing(&self, fail: bool) {
		self.fail.store(fail, Ordering::SeqCst);
	}

	/// Number of fetch calls so far.
	pub fn fetch_count(&self) -> usize {
		self.fetches.load(Ordering::SeqCst)
	}

	/// Number of refresh calls so far.
	pub fn refresh_count(&self) -> usize {
		self.refreshes.load(Ordering::SeqCst)
	}

	fn token(raw: String, ttl: Option<Duration>) -> Token {
		match ttl {
			Some(ttl) => Token::expiring_in(raw, ttl),
			None => Token::never_expiring(raw),
		}
	}

	async fn settle(&self) -> Result<(), BoxError> {
		for _ in 0..self.yields {
			YieldNow(false).await;
		}

		if self.fail.load(Ordering::SeqCst) {
			Err(BoxError::from("stub provider failure"))
		} else {
			Ok(())
		}
	}
}
impl Default for StubTokenProvider {
	fn default() -> Self {
		Self::new()
	}
}
impl TokenProvider for StubTokenProvider {
	fn fetch_token(&self) -> ProviderFuture<'_, TokenPair> {
		let n = self.fetches.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			self.settle().await?;

			Ok::<_, BoxError>(TokenPair::new(
				Self::token(format!("access-{n}"), self.access_ttl),
				Self::token(format!("refresh-{n}"), self.refresh_ttl),
			))
		})
	}

	fn refresh_token<'a>(&'a self, _: &'a Token) -> ProviderFuture<'a, Token> {
		let n = self.refreshes.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			self.settle().await?;

			Ok::<_, BoxError>(Self::token(format!("refreshed-{n}"), self.access_ttl))
		})
	}
}

/// Request that sends a fixed method and path and decodes the body as UTF-8 text.
#[derive(Clone, Debug)]
pub struct TextRequest {
	method: Method,
	path: String,
	headers: Vec<(String, String)>,
}
impl TextRequest {
	/// Creates a `GET` request for `path`, resolved against the client's base URL.
	pub fn get(path: impl Into<String>) -> Self {
		Self { method: Method::GET, path: path.into(), headers: Vec::new() }
	}

	/// Adds a header the request carries before any decorator sees it.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}
}
impl ApiRequest for TextRequest {
	type Output = String;

	fn make_request(&self, base_url: &Url) -> Result<WireRequest, RequestError> {
		self.headers.iter().try_fold(
			WireRequest::from_base(self.method.clone(), base_url, &self.path)?,
			|request, (name, value)| request.with_header(name, value),
		)
	}

	fn parse_response(&self, response: TransportResponse) -> Result<String, BoxError> {
		Ok(String::from_utf8(response.body)?)
	}
}

/// Parses a URL fixture.
pub fn url(raw: &str) -> Url {
	Url::parse(raw).expect("URL fixture should parse.")
}

/// Builds a reqwest transport that accepts the self-signed certificates produced by
/// `httpmock` during tests.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_transport() -> crate::transport::ReqwestTransport {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	crate::transport::ReqwestTransport::with_client(client)
}

struct YieldNow(bool);
impl Future for YieldNow {
	type Output = ();

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
		if self.0 {
			Poll::Ready(())
		} else {
			self.0 = true;
			cx.waker().wake_by_ref();

			Poll::Pending
		}
	}
}
