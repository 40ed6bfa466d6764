//! Token provider contract consumed by [`AuthState`](crate::auth::AuthState).

// self
use crate::{
	_prelude::*,
	auth::{Token, TokenPair},
	error::BoxError,
};

/// Boxed future returned by [`TokenProvider`] operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + 'a + Send>>;

/// External source of bearer tokens.
///
/// Errors are passed through to the caller wrapped in
/// [`TokenError::Provider`](crate::error::TokenError::Provider); the auth layer never
/// inspects them.
pub trait TokenProvider
where
	Self: Send + Sync,
{
	/// Obtains a fresh access/refresh token pair.
	fn fetch_token(&self) -> ProviderFuture<'_, TokenPair>;

	/// Mints a new access token from `refresh`.
	fn refresh_token<'a>(&'a self, refresh: &'a Token) -> ProviderFuture<'a, Token>;
}
