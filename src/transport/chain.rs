//! Builder that assembles a transport chain from the leaf outward.

// self
use crate::{
	_prelude::*,
	auth::TokenProvider,
	error::ConfigError,
	transport::{AddHeaders, BackgroundActivity, BackgroundTask, HeaderMode, TokenAuth, Transport},
};

/// Composes decorators around a leaf transport.
///
/// Each call wraps the current head, so the last decorator added is the first to see a
/// request:
///
/// ```ignore
/// let chain = ChainBuilder::new(ReqwestTransport::default())
/// 	.headers([("x-client", "demo")], HeaderMode::Append)?
/// 	.token_auth(provider)
/// 	.build();
/// ```
#[derive(Clone)]
pub struct ChainBuilder {
	head: Arc<dyn Transport>,
}
impl ChainBuilder {
	/// Starts a chain at `leaf`.
	pub fn new(leaf: impl 'static + Transport) -> Self {
		Self { head: Arc::new(leaf) }
	}

	/// Starts a chain at an already shared transport.
	pub fn from_arc(head: Arc<dyn Transport>) -> Self {
		Self { head }
	}

	/// Wraps the current head with an arbitrary decorator.
	pub fn layer<T, F>(self, wrap: F) -> Self
	where
		T: 'static + Transport,
		F: FnOnce(Arc<dyn Transport>) -> T,
	{
		Self { head: Arc::new(wrap(self.head)) }
	}

	/// Wraps the current head with a fallible decorator constructor.
	pub fn try_layer<T, E, F>(self, wrap: F) -> Result<Self, E>
	where
		T: 'static + Transport,
		F: FnOnce(Arc<dyn Transport>) -> Result<T, E>,
	{
		Ok(Self { head: Arc::new(wrap(self.head)?) })
	}

	/// Wraps the current head with an [`AddHeaders`] decorator.
	pub fn headers<I, K, V>(self, headers: I, mode: HeaderMode) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		self.try_layer(|next| AddHeaders::new(next, headers, mode))
	}

	/// Wraps the current head with a [`TokenAuth`] decorator using default settings.
	pub fn token_auth(self, provider: Arc<dyn TokenProvider>) -> Self {
		self.layer(|next| TokenAuth::new(next, provider))
	}

	/// Wraps the current head with a [`BackgroundTask`] decorator.
	pub fn background(self, activity: Arc<dyn BackgroundActivity>) -> Self {
		self.layer(|next| BackgroundTask::new(next, activity))
	}

	/// Returns the head of the assembled chain.
	pub fn build(self) -> Arc<dyn Transport> {
		self.head
	}
}
impl Debug for ChainBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ChainBuilder").field("depth", &chain_depth(self.head.as_ref())).finish()
	}
}

/// Counts the transports reachable from `head`, leaf included.
pub fn chain_depth(head: &dyn Transport) -> usize {
	let mut depth = 1;
	let mut current = head;

	while let Some(next) = current.next() {
		depth += 1;
		current = next;
	}

	depth
}
