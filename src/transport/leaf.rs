//! Reqwest-backed leaf transport.

// std
use std::{
	collections::HashMap,
	sync::atomic::{AtomicU64, Ordering},
	time::Instant,
};
// crates.io
use futures::future::{AbortHandle, Abortable};
use http::HeaderMap;
// self
use crate::{
	_prelude::*,
	error::TransportFailure,
	obs::{self, Stage, StageSpan},
	request::WireRequest,
	transport::{Transport, TransportFuture, classify_exchange},
};

/// Leaf transport that performs the network exchange with [`ReqwestClient`].
///
/// Every send registers an abort handle; [`Transport::cancel`] aborts all of them and the
/// affected sends resolve to [`TransportFailure::Cancelled`]. Redirect, timeout, and TLS
/// behavior come from the wrapped client.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	in_flight: Arc<InFlight>,
}
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, in_flight: Default::default() }
	}

	/// Underlying reqwest client.
	pub fn client(&self) -> &ReqwestClient {
		&self.client
	}

	/// Number of sends that have started but not finished.
	pub fn in_flight(&self) -> usize {
		self.in_flight.handles.lock().len()
	}
}
impl Transport for ReqwestTransport {
	fn send(&self, request: WireRequest) -> TransportFuture<'_> {
		let span = StageSpan::new(Stage::LeafSend, &request);
		let label = request.to_string();
		let (handle, registration) = AbortHandle::new_pair();
		let guard = self.in_flight.register(handle);
		let client = self.client.clone();

		Box::pin(span.instrument(async move {
			let started = Instant::now();
			let outcome = match Abortable::new(exchange(client, request), registration).await {
				Ok(exchange) => classify_exchange(exchange),
				Err(_) => TransportFailure::Cancelled.into(),
			};

			drop(guard);
			obs::trace_event(&format_args!(
				"{label} finished as {} in {}ms",
				outcome.kind(),
				started.elapsed().as_millis()
			));
			obs::record_stage_outcome(Stage::LeafSend, outcome.kind().as_str());

			outcome
		}))
	}

	fn next(&self) -> Option<&dyn Transport> {
		None
	}

	fn cancel(&self) {
		for (_, handle) in self.in_flight.handles.lock().drain() {
			handle.abort();
		}
	}
}
impl Debug for ReqwestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestTransport").field("in_flight", &self.in_flight()).finish()
	}
}

#[derive(Default)]
struct InFlight {
	next_id: AtomicU64,
	handles: Mutex<HashMap<u64, AbortHandle>>,
}
impl InFlight {
	fn register(&self, handle: AbortHandle) -> InFlightGuard<'_> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);

		self.handles.lock().insert(id, handle);

		InFlightGuard { registry: self, id }
	}
}

// Unregisters the send even when its future is dropped before completion.
struct InFlightGuard<'a> {
	registry: &'a InFlight,
	id: u64,
}
impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.registry.handles.lock().remove(&self.id);
	}
}

async fn exchange(
	client: ReqwestClient,
	request: WireRequest,
) -> Result<(u16, HeaderMap, Vec<u8>), TransportFailure> {
	let request = request.into_http().map_err(TransportFailure::unknown)?;
	let request = reqwest::Request::try_from(request).map_err(map_reqwest_error)?;
	let response = client.execute(request).await.map_err(map_reqwest_error)?;
	let status = response.status().as_u16();
	let headers = response.headers().to_owned();
	let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

	Ok((status, headers, body))
}

fn map_reqwest_error(e: ReqwestError) -> TransportFailure {
	if e.is_builder() { TransportFailure::unknown(e) } else { TransportFailure::network(e) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn cancel_before_first_poll_resolves_to_cancelled() {
		let transport = ReqwestTransport::default();
		let url = Url::parse("http://127.0.0.1:9/never").expect("URL fixture should parse.");
		let send = transport.send(WireRequest::get(url));

		assert_eq!(transport.in_flight(), 1);

		transport.cancel();

		assert!(send.await.is_cancelled());
		assert_eq!(transport.in_flight(), 0);
	}

	#[tokio::test]
	async fn dropped_sends_are_unregistered() {
		let transport = ReqwestTransport::default();
		let url = Url::parse("http://127.0.0.1:9/never").expect("URL fixture should parse.");

		drop(transport.send(WireRequest::get(url)));

		assert_eq!(transport.in_flight(), 0);
	}

	#[test]
	fn leaf_has_no_next_transport() {
		assert!(ReqwestTransport::default().next().is_none());
	}
}
