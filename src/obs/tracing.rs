// self
use crate::{_prelude::*, obs::Stage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by the client, auth layer, and leaf transports.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage + request label.
	pub fn new(stage: Stage, request: &dyn Display) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!(
				"transport_chain.stage",
				stage = stage.as_str(),
				request = %request
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, request);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `trace` event inside the current span (when tracing is enabled).
pub fn trace_event(message: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::trace!("{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = message;
	}
}
