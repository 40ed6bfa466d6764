//! Classification of raw exchanges into [`TransportOutcome`] values.

// crates.io
use http::HeaderMap;
// self
use crate::{_prelude::*, error::TransportFailure, transport::TransportResponse};

/// Result of a single [`Transport::send`](crate::transport::Transport::send) call.
#[derive(Debug)]
pub enum TransportOutcome {
	/// The server answered with a 2xx status.
	Success(TransportResponse),
	/// The exchange completed but the status is outside 2xx; the request decides what it means.
	ApplicationFailure(TransportResponse),
	/// The exchange itself did not complete.
	TransportFailure(TransportFailure),
}
impl TransportOutcome {
	/// Returns the label-friendly kind of this outcome.
	pub fn kind(&self) -> OutcomeKind {
		match self {
			Self::Success(_) => OutcomeKind::Success,
			Self::ApplicationFailure(_) => OutcomeKind::ApplicationFailure,
			Self::TransportFailure(_) => OutcomeKind::TransportFailure,
		}
	}

	/// Returns the HTTP status when a response was received.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Success(response) | Self::ApplicationFailure(response) => Some(response.status),
			Self::TransportFailure(_) => None,
		}
	}

	/// Returns `true` for [`TransportOutcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Returns `true` when the outcome is a cancelled transport failure.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::TransportFailure(failure) if failure.is_cancelled())
	}
}
impl From<TransportFailure> for TransportOutcome {
	fn from(failure: TransportFailure) -> Self {
		Self::TransportFailure(failure)
	}
}

/// Stable labels for the three outcome kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
	/// 2xx response.
	Success,
	/// Non-2xx response.
	ApplicationFailure,
	/// No usable response.
	TransportFailure,
}
impl OutcomeKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OutcomeKind::Success => "success",
			OutcomeKind::ApplicationFailure => "application_failure",
			OutcomeKind::TransportFailure => "transport_failure",
		}
	}
}
impl Display for OutcomeKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Classifies a received status line, headers, and body.
///
/// 200–299 is a success, any other HTTP status (100–599) is an application failure carrying
/// the exact status and body, and anything else means the peer did not speak HTTP.
pub fn classify(status: u16, headers: HeaderMap, body: Vec<u8>) -> TransportOutcome {
	if !(100..=599).contains(&status) {
		return TransportFailure::InvalidResponse.into();
	}

	let Ok(status) = StatusCode::from_u16(status) else {
		return TransportFailure::InvalidResponse.into();
	};
	let response = TransportResponse { status, headers, body };

	if status.is_success() {
		TransportOutcome::Success(response)
	} else {
		TransportOutcome::ApplicationFailure(response)
	}
}

/// Classifies a whole exchange; transport errors take precedence over any status.
pub fn classify_exchange(
	exchange: Result<(u16, HeaderMap, Vec<u8>), TransportFailure>,
) -> TransportOutcome {
	match exchange {
		Ok((status, headers, body)) => classify(status, headers, body),
		Err(failure) => failure.into(),
	}
}
