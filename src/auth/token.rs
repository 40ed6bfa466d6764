//! Immutable bearer tokens with redacted secrets and optional expiry.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Opaque credential issued by a [`TokenProvider`](crate::auth::TokenProvider).
///
/// A token without an expiry never goes stale on its own.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	secret: TokenSecret,
	expires_at: Option<OffsetDateTime>,
}
impl Token {
	/// Creates a token with an optional absolute expiry.
	pub fn new(raw: impl Into<String>, expires_at: Option<OffsetDateTime>) -> Self {
		Self { secret: TokenSecret::new(raw), expires_at }
	}

	/// Creates a token that never expires.
	pub fn never_expiring(raw: impl Into<String>) -> Self {
		Self::new(raw, None)
	}

	/// Creates a token that expires `lifetime` from now.
	pub fn expiring_in(raw: impl Into<String>, lifetime: Duration) -> Self {
		Self::new(raw, Some(OffsetDateTime::now_utc() + lifetime))
	}

	/// Raw token value. Callers must avoid logging this string.
	pub fn raw(&self) -> &str {
		self.secret.expose()
	}

	/// Redacted secret wrapper.
	pub fn secret(&self) -> &TokenSecret {
		&self.secret
	}

	/// Expiry instant, if the issuer supplied one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Returns `true` if the token stays valid for more than `leeway` after `now`.
	///
	/// A leeway that pushes `now` past the representable range makes every expiring token stale.
	pub fn is_fresh_at(&self, now: OffsetDateTime, leeway: Duration) -> bool {
		match self.expires_at {
			Some(expires_at) => now.checked_add(leeway).is_some_and(|edge| edge < expires_at),
			None => true,
		}
	}

	/// Convenience helper that checks freshness against the current UTC instant.
	pub fn is_fresh(&self, leeway: Duration) -> bool {
		self.is_fresh_at(OffsetDateTime::now_utc(), leeway)
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("secret", &self.secret)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Access and refresh tokens returned together by an initial fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Token attached to outgoing requests.
	pub access: Token,
	/// Token used to mint new access tokens.
	///
	/// `None` when the issuer does not hand out refresh tokens (typical for client credentials);
	/// a stale access token then triggers another full fetch.
	pub refresh: Option<Token>,
}
impl TokenPair {
	/// Creates a new pair.
	pub fn new(access: Token, refresh: Token) -> Self {
		Self { access, refresh: Some(refresh) }
	}

	/// Creates a pair without a refresh token.
	pub fn access_only(access: Token) -> Self {
		Self { access, refresh: None }
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let token = Token::never_expiring("super-secret");

		assert_eq!(format!("{:?}", token.secret()), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{}", token.secret()), "<redacted>");
		assert!(!format!("{token:?}").contains("super-secret"));
		assert_eq!(token.raw(), "super-secret");
	}

	#[test]
	fn freshness_honors_expiry_and_leeway() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = Token::new("abc", Some(macros::datetime!(2025-01-01 00:10 UTC)));

		assert!(token.is_fresh_at(now, Duration::ZERO));
		assert!(token.is_fresh_at(now, Duration::minutes(9)));
		assert!(!token.is_fresh_at(now, Duration::minutes(10)));
		assert!(!token.is_fresh_at(macros::datetime!(2025-01-01 00:10 UTC), Duration::ZERO));
	}

	#[test]
	fn oversized_leeway_makes_expiring_tokens_stale() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let expiring = Token::new("abc", Some(macros::datetime!(2025-01-01 01:00 UTC)));

		assert!(!expiring.is_fresh_at(now, Duration::MAX));
		assert!(Token::never_expiring("abc").is_fresh_at(now, Duration::MAX));
	}

	#[test]
	fn tokens_without_expiry_never_go_stale() {
		let token = Token::never_expiring("abc");

		assert!(token.is_fresh_at(macros::datetime!(2999-12-31 23:59 UTC), Duration::weeks(52)));
	}
}
