//! Decorator that keeps a host-granted background activity alive for the duration of a send.
//!
//! Hosts that may suspend the process (mobile runtimes, serverless workers with a shutdown
//! grace period) expose some notion of "please let me finish this work". [`BackgroundTask`]
//! asks a [`BackgroundActivity`] for such a lease before forwarding. A denied lease cancels the
//! request without sending it; a lease that expires mid-flight cancels the chain, and the
//! cancelled outcome produced by the leaf is what the caller receives.
//!
//! Expiry cancels whatever the leaf is running at that moment. If an inner
//! [`TokenAuth`](crate::transport::TokenAuth) is still waiting on a provider that does not share
//! the leaf, the cancel finds the leaf idle and the send goes ahead once the token arrives.

// crates.io
use futures::future::{self, Either};
// self
use crate::{
	_prelude::*,
	error::TransportFailure,
	request::WireRequest,
	transport::{Transport, TransportFuture},
};

type ExpirationHandler = Arc<dyn Fn() + Send + Sync>;

/// Host hook that grants (or refuses) time to finish a request.
pub trait BackgroundActivity
where
	Self: Send + Sync,
{
	/// Starts an activity described by `reason`; `None` means the host refused.
	fn begin(&self, reason: &str) -> Option<ActivityLease>;
}

/// Granted activity. Dropping the lease ends the activity.
pub struct ActivityLease {
	expired: Pin<Box<dyn Future<Output = ()> + Send>>,
	release: Option<Box<dyn FnOnce() + Send>>,
}
impl ActivityLease {
	/// Creates a lease that expires when `expired` resolves.
	pub fn new(expired: impl 'static + Future<Output = ()> + Send) -> Self {
		Self { expired: Box::pin(expired), release: None }
	}

	/// Creates a lease that never expires.
	pub fn unbounded() -> Self {
		Self::new(future::pending())
	}

	/// Runs `release` once the lease is dropped.
	pub fn on_release(mut self, release: impl 'static + FnOnce() + Send) -> Self {
		self.release = Some(Box::new(release));

		self
	}
}
impl Drop for ActivityLease {
	fn drop(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}
}
impl Debug for ActivityLease {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ActivityLease(..)")
	}
}

/// Decorator that runs every send inside a [`BackgroundActivity`] lease.
pub struct BackgroundTask {
	next: Arc<dyn Transport>,
	activity: Arc<dyn BackgroundActivity>,
	name: Option<String>,
	expiration_handler: Option<ExpirationHandler>,
}
impl BackgroundTask {
	/// Creates a decorator that asks `activity` for a lease before each send.
	pub fn new(next: Arc<dyn Transport>, activity: Arc<dyn BackgroundActivity>) -> Self {
		Self { next, activity, name: None, expiration_handler: None }
	}

	/// Prefixes activity reasons with `name`; the request's method and URL follow it.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Runs `handler` right before an expired lease cancels the chain.
	pub fn with_expiration_handler(mut self, handler: impl 'static + Fn() + Send + Sync) -> Self {
		self.expiration_handler = Some(Arc::new(handler));

		self
	}

	fn reason(&self, request: &WireRequest) -> String {
		match &self.name {
			Some(name) => format!("{name} {request}"),
			None => request.to_string(),
		}
	}
}
impl Transport for BackgroundTask {
	fn send(&self, request: WireRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let Some(mut lease) = self.activity.begin(&self.reason(&request)) else {
				self.cancel();

				return TransportFailure::Cancelled.into();
			};
			let send = self.next.send(request);

			match future::select(send, &mut lease.expired).await {
				Either::Left((outcome, _)) => outcome,
				Either::Right(((), send)) => {
					if let Some(handler) = &self.expiration_handler {
						handler();
					}

					self.next.cancel();

					send.await
				},
			}
		})
	}

	fn next(&self) -> Option<&dyn Transport> {
		Some(self.next.as_ref())
	}
}
impl Debug for BackgroundTask {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BackgroundTask")
			.field("name", &self.name)
			.field("expiration_handler_set", &self.expiration_handler.is_some())
			.finish()
	}
}
