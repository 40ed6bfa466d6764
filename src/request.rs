//! Wire requests and the typed request contract consumed by [`Client`](crate::client::Client).
//!
//! A [`WireRequest`] is the only value that travels down a transport chain. It is built fresh
//! for every call by an [`ApiRequest`] and dropped once the call finishes, so decorators can
//! take it by value and hand a modified copy to the next transport without aliasing.

// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, Method};
// self
use crate::{
	_prelude::*,
	error::{ApiError, BoxError, RequestError},
	transport::TransportResponse,
};

/// Fully constructed HTTP request handed to the head of a transport chain.
#[derive(Clone, Debug)]
pub struct WireRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Ordered header multimap; names are case-insensitive and may repeat.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl WireRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None }
	}

	/// Creates a `GET` request for `url`.
	pub fn get(url: Url) -> Self {
		Self::new(Method::GET, url)
	}

	/// Resolves `path` against `base` and creates a request for the result.
	///
	/// An empty `path` targets `base` itself.
	pub fn from_base(method: Method, base: &Url, path: &str) -> Result<Self, RequestError> {
		let url = base.join(path).map_err(|source| RequestError::InvalidUrl {
			base: base.clone(),
			path: path.to_owned(),
			source,
		})?;

		Ok(Self::new(method, url))
	}

	/// Appends a header value, keeping any values already present for `name`.
	pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
		let invalid = || RequestError::InvalidHeader { name: name.to_owned() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		self.headers.append(header_name, header_value);

		Ok(self)
	}

	/// Sets the request body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Returns every value recorded for `name`, in insertion order.
	///
	/// Values that are not visible ASCII are skipped.
	pub fn header_values(&self, name: &str) -> Vec<&str> {
		self.headers.get_all(name).iter().filter_map(|value| value.to_str().ok()).collect()
	}

	/// Converts the request into an [`http::Request`] for HTTP stacks built on the `http` crate.
	pub fn into_http(self) -> Result<http::Request<Vec<u8>>, http::Error> {
		let mut builder = http::Request::builder().method(self.method).uri(self.url.as_str());

		if let Some(headers) = builder.headers_mut() {
			*headers = self.headers;
		}

		builder.body(self.body.unwrap_or_default())
	}
}
impl Display for WireRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "[{}] {}", self.method, self.url)
	}
}

/// A typed unit of work understood by [`Client`](crate::client::Client).
///
/// Implementations describe how to build the wire request from the client's base URL and how
/// to turn the transport's response back into a typed value. Only responses with a 2xx status
/// reach [`parse_response`](ApiRequest::parse_response); every other status is routed to
/// [`parse_error`](ApiRequest::parse_error).
pub trait ApiRequest
where
	Self: Send + Sync,
{
	/// Decoded value produced by a successful call.
	type Output;

	/// Builds the wire request for this call.
	fn make_request(&self, base_url: &Url) -> Result<WireRequest, RequestError>;

	/// Parses a 2xx response into the typed result.
	fn parse_response(&self, response: TransportResponse) -> Result<Self::Output, BoxError>;

	/// Turns a non-2xx response into the error returned to the caller.
	///
	/// The default implementation returns a generic [`ApiError`] carrying the status and body.
	fn parse_error(&self, response: TransportResponse) -> Error {
		ApiError::new(response.status, response.body).into()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://test.somewhere.com").expect("Base URL fixture should parse.")
	}

	#[test]
	fn from_base_resolves_paths_and_keeps_base_for_empty_path() {
		let root = WireRequest::from_base(Method::GET, &base(), "")
			.expect("Empty path should resolve to the base URL.");
		let nested = WireRequest::from_base(Method::POST, &base(), "/v1/items?limit=5")
			.expect("Absolute path should resolve against the base URL.");

		assert_eq!(root.url.as_str(), "https://test.somewhere.com/");
		assert_eq!(nested.url.as_str(), "https://test.somewhere.com/v1/items?limit=5");
		assert_eq!(nested.to_string(), "[POST] https://test.somewhere.com/v1/items?limit=5");
	}

	#[test]
	fn from_base_reports_unresolvable_paths() {
		let err = WireRequest::from_base(Method::GET, &base(), "http://[::1")
			.expect_err("Malformed reference should not resolve.");

		assert!(matches!(err, RequestError::InvalidUrl { ref path, .. } if path == "http://[::1"));
	}

	#[test]
	fn with_header_appends_and_rejects_invalid_values() {
		let request = WireRequest::get(base())
			.with_header("x-trace", "a")
			.and_then(|request| request.with_header("X-Trace", "b"))
			.expect("Valid headers should be accepted.");

		assert_eq!(request.header_values("x-trace"), ["a", "b"]);

		let err = WireRequest::get(base())
			.with_header("bad header", "value")
			.expect_err("Header names with spaces should be rejected.");

		assert!(matches!(err, RequestError::InvalidHeader { .. }));
	}

	#[test]
	fn into_http_preserves_method_headers_and_body() {
		let request = WireRequest::new(Method::PUT, base())
			.with_header("content-type", "text/plain")
			.expect("Header fixture should be valid.")
			.with_body("payload");
		let http_request = request.into_http().expect("Conversion should succeed.");

		assert_eq!(http_request.method(), Method::PUT);
		assert_eq!(http_request.uri(), "https://test.somewhere.com/");
		assert_eq!(http_request.headers()["content-type"], "text/plain");
		assert_eq!(http_request.body(), b"payload");
	}
}
