// self
use crate::obs::Stage;

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_stage_outcome(stage: Stage, outcome: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"transport_chain_outcome_total",
			"stage" => stage.as_str(),
			"outcome" => outcome
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}
