//! Client-level error types shared across requests, transports, and token providers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used wherever a collaborator may fail with an arbitrary error value.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error returned by [`Client::load`](crate::client::Client::load).
#[derive(Debug, ThisError)]
pub enum Error {
	/// The typed request could not be turned into a wire request.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// The exchange itself did not complete.
	#[error(transparent)]
	Transport(#[from] TransportFailure),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Generic non-2xx response produced by the default error parser.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// Request-specific error parsed from a non-2xx response.
	#[error("Request failed with HTTP status {status}.")]
	Application {
		/// HTTP status code of the response.
		status: StatusCode,
		/// Error produced by the request's error parser.
		#[source]
		source: BoxError,
	},
	/// A 2xx response body could not be parsed into the typed result.
	#[error("Response body could not be parsed.")]
	Parse {
		/// Underlying parsing failure.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps a request-specific error parsed from a non-2xx response.
	pub fn application(
		status: StatusCode,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Application { status, source: Box::new(src) }
	}

	/// Returns `true` when the call ended because it was cancelled.
	///
	/// Cancellation is user-initiated and usually should not be reported as a failure.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Transport(failure) if failure.is_cancelled())
	}
}

/// Failures raised while constructing a wire request from a typed request.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// The request path could not be joined onto the base URL.
	#[error("Request path `{path}` cannot be resolved against `{base}`.")]
	InvalidUrl {
		/// Client base URL.
		base: Url,
		/// Path or relative reference supplied by the request.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A header supplied by the request is not valid HTTP.
	#[error("Request header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name as supplied.
		name: String,
	},
	/// Request-specific construction failure.
	#[error("Request could not be constructed.")]
	Build {
		/// Underlying failure.
		#[source]
		source: BoxError,
	},
}
impl RequestError {
	/// Wraps a request-specific construction failure.
	pub fn build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Build { source: Box::new(src) }
	}
}

/// Configuration and validation failures raised while assembling transports.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A configured header name or value is not valid HTTP.
	#[error("Configured header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name as supplied.
		name: String,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures: the exchange did not produce a usable HTTP response.
#[derive(Debug, ThisError)]
pub enum TransportFailure {
	/// The request was cancelled before it completed.
	#[error("Request was cancelled.")]
	Cancelled,
	/// Underlying HTTP stack reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The peer answered with something that is not a usable HTTP response.
	#[error("Transport received an invalid response.")]
	InvalidResponse,
	/// Any other failure, including token acquisition errors.
	#[error("Request failed with an unexpected transport error.")]
	Unknown {
		/// Underlying failure.
		#[source]
		source: BoxError,
	},
}
impl TransportFailure {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps an arbitrary failure.
	pub fn unknown(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Unknown { source: Box::new(src) }
	}

	/// Returns `true` for [`TransportFailure::Cancelled`].
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

/// Default error for non-2xx responses, carrying the status and raw body.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Server responded with HTTP status {status}.")]
pub struct ApiError {
	/// HTTP status code of the response.
	pub status: StatusCode,
	/// Raw response body; empty when the server sent none.
	pub body: Vec<u8>,
}
impl ApiError {
	/// Creates a new error for the given status and body.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, body: body.into() }
	}
}

/// Failures reported while obtaining a bearer token.
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// The token provider failed; the error is passed through uninterpreted.
	#[error("Token provider failed.")]
	Provider {
		/// Provider-specific failure.
		#[source]
		source: BoxError,
	},
	/// Token endpoint returned an `expires_in` that cannot be represented.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl TokenError {
	/// Wraps a provider-specific failure.
	pub fn provider(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Provider { source: Box::new(src) }
	}
}
