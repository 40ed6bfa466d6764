//! Client façade that turns typed requests into wire calls and typed results.

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	obs::{self, Stage, StageSpan},
	request::ApiRequest,
	transport::{Transport, TransportOutcome},
};

/// Sends [`ApiRequest`] values through an injected transport chain.
///
/// The client holds no per-request state; it can be shared freely and called concurrently.
#[derive(Clone)]
pub struct Client {
	base_url: Url,
	transport: Arc<dyn Transport>,
}
impl Client {
	/// Creates a client that resolves request paths against `base_url` and sends through
	/// `transport`, the head of a chain.
	pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
		Self { base_url, transport }
	}

	/// Creates a client that sends straight through a default [`ReqwestTransport`].
	///
	/// [`ReqwestTransport`]: crate::transport::ReqwestTransport
	#[cfg(feature = "reqwest")]
	pub fn reqwest(base_url: Url) -> Self {
		Self::new(base_url, Arc::new(crate::transport::ReqwestTransport::default()))
	}

	/// Base URL every request is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Head of the transport chain.
	pub fn transport(&self) -> &Arc<dyn Transport> {
		&self.transport
	}

	/// Cancels in-flight calls by cancelling the head of the chain.
	pub fn cancel(&self) {
		self.transport.cancel();
	}

	/// Runs `request` and returns its typed result.
	///
	/// Construction errors return before anything is sent. A 2xx response goes to
	/// [`ApiRequest::parse_response`], any other status to [`ApiRequest::parse_error`], and
	/// transport failures are returned unchanged as [`Error::Transport`].
	pub async fn load<R>(&self, request: &R) -> Result<R::Output>
	where
		R: ApiRequest,
	{
		let started = Instant::now();
		let wire = request.make_request(&self.base_url)?;
		let label = wire.to_string();
		let span = StageSpan::new(Stage::ClientLoad, &label);
		let outcome = span.instrument(self.transport.send(wire)).await;
		let received = Instant::now();

		obs::trace_event(&format_args!(
			"Request '{label}' received response in {}ms",
			started.elapsed().as_millis()
		));
		obs::record_stage_outcome(Stage::ClientLoad, outcome.kind().as_str());

		let result = match outcome {
			TransportOutcome::Success(response) =>
				request.parse_response(response).map_err(|source| Error::Parse { source }),
			TransportOutcome::ApplicationFailure(response) => Err(request.parse_error(response)),
			TransportOutcome::TransportFailure(failure) => Err(failure.into()),
		};

		obs::trace_event(&format_args!(
			"Request '{label}' was processed in {}ms",
			received.elapsed().as_millis()
		));
		obs::trace_event(&format_args!(
			"Request '{label}' took a total of {}ms",
			started.elapsed().as_millis()
		));

		result
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client").field("base_url", &self.base_url.as_str()).finish()
	}
}
