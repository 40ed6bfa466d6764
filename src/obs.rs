//! Optional observability helpers for transport chains.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `transport_chain.stage` with the `stage` and
//!   `request` fields, plus `trace` events for token acquisition and request timing.
//! - Enable `metrics` to increment the `transport_chain_outcome_total` counter for every finished
//!   stage, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline stages observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// [`Client::load`](crate::client::Client::load) from request construction to parsed result.
	ClientLoad,
	/// Bearer-token acquisition inside [`TokenAuth`](crate::transport::TokenAuth).
	TokenAcquire,
	/// Network exchange performed by a leaf transport.
	LeafSend,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::ClientLoad => "client_load",
			Stage::TokenAcquire => "token_acquire",
			Stage::LeafSend => "leaf_send",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
