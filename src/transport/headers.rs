//! Header injection decorator.

// crates.io
use http::{HeaderMap, HeaderName, HeaderValue};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	request::WireRequest,
	transport::{Transport, TransportFuture},
};

/// Conflict-resolution policy used when a request already carries a configured header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HeaderMode {
	/// Adds the configured value after any existing values.
	///
	/// Stacked `Append` decorators apply outer to inner, so the value of the decorator closest
	/// to the network ends up last.
	Append,
	/// Overwrites every existing value for the header.
	Replace,
	/// Sets the header only when the request does not carry it at all.
	#[default]
	Add,
}

/// Decorator that applies a fixed header set to every request before forwarding it.
pub struct AddHeaders {
	next: Arc<dyn Transport>,
	headers: Vec<(HeaderName, HeaderValue)>,
	mode: HeaderMode,
}
impl AddHeaders {
	/// Creates a decorator that applies `headers` under `mode`.
	///
	/// Headers are applied in the order given. Names and values are validated up front so
	/// sending never fails because of the decorator itself.
	pub fn new<I, K, V>(
		next: Arc<dyn Transport>,
		headers: I,
		mode: HeaderMode,
	) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let headers = headers
			.into_iter()
			.map(|(name, value)| {
				let (name, value) = (name.as_ref(), value.as_ref());
				let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };

				Ok((
					HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?,
					HeaderValue::from_str(value).map_err(|_| invalid())?,
				))
			})
			.collect::<Result<Vec<_>, ConfigError>>()?;

		Ok(Self::from_parts(next, headers, mode))
	}

	/// Creates a decorator from already validated header pairs.
	pub fn from_parts(
		next: Arc<dyn Transport>,
		headers: Vec<(HeaderName, HeaderValue)>,
		mode: HeaderMode,
	) -> Self {
		Self { next, headers, mode }
	}

	/// Conflict-resolution policy in use.
	pub fn mode(&self) -> HeaderMode {
		self.mode
	}

	/// Returns a copy of `request` with the configured headers applied.
	pub fn apply(&self, mut request: WireRequest) -> WireRequest {
		apply_headers(&mut request.headers, &self.headers, self.mode);

		request
	}
}
impl Transport for AddHeaders {
	fn send(&self, request: WireRequest) -> TransportFuture<'_> {
		self.next.send(self.apply(request))
	}

	fn next(&self) -> Option<&dyn Transport> {
		Some(self.next.as_ref())
	}
}
impl Debug for AddHeaders {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AddHeaders")
			.field("headers", &self.headers.iter().map(|(name, _)| name).collect::<Vec<_>>())
			.field("mode", &self.mode)
			.finish()
	}
}

pub(crate) fn apply_headers(
	target: &mut HeaderMap,
	headers: &[(HeaderName, HeaderValue)],
	mode: HeaderMode,
) {
	for (name, value) in headers {
		match mode {
			HeaderMode::Append => {
				target.append(name.clone(), value.clone());
			},
			HeaderMode::Replace => {
				target.insert(name.clone(), value.clone());
			},
			HeaderMode::Add =>
				if !target.contains_key(name) {
					target.insert(name.clone(), value.clone());
				},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn pairs(items: &[(&str, &str)]) -> Vec<(HeaderName, HeaderValue)> {
		items
			.iter()
			.map(|(name, value)| {
				(
					HeaderName::from_bytes(name.as_bytes()).expect("Header name fixture is valid."),
					HeaderValue::from_str(value).expect("Header value fixture is valid."),
				)
			})
			.collect()
	}

	fn existing() -> HeaderMap {
		let mut map = HeaderMap::new();

		map.append("h1", HeaderValue::from_static("request"));

		map
	}

	fn values<'a>(map: &'a HeaderMap, name: &str) -> Vec<&'a str> {
		map.get_all(name).iter().map(|value| value.to_str().unwrap_or_default()).collect()
	}

	#[test]
	fn append_keeps_existing_values() {
		let mut map = existing();

		apply_headers(&mut map, &pairs(&[("H1", "one"), ("H2", "two")]), HeaderMode::Append);

		assert_eq!(values(&map, "h1"), ["request", "one"]);
		assert_eq!(values(&map, "h2"), ["two"]);
	}

	#[test]
	fn replace_overwrites_every_value() {
		let mut map = existing();

		map.append("h1", HeaderValue::from_static("second"));
		apply_headers(&mut map, &pairs(&[("H1", "one")]), HeaderMode::Replace);

		assert_eq!(values(&map, "h1"), ["one"]);
	}

	#[test]
	fn add_only_fills_missing_headers() {
		let mut map = existing();

		apply_headers(&mut map, &pairs(&[("H1", "one"), ("H2", "two")]), HeaderMode::Add);

		assert_eq!(values(&map, "h1"), ["request"]);
		assert_eq!(values(&map, "h2"), ["two"]);
	}

	#[test]
	fn add_is_the_default_mode() {
		assert_eq!(HeaderMode::default(), HeaderMode::Add);
	}
}
