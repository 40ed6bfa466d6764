//! Bearer-token authentication decorator.
//!
//! [`TokenAuth`] asks its [`AuthState`] for a token before every send and forwards the request
//! through a one-off [`AddHeaders`] that sets `Authorization: Bearer <token>` in
//! [`HeaderMode::Replace`]. Token failures complete the send with
//! [`TransportFailure::Unknown`] and the next transport is never called.
//!
//! Cancellation only reaches the next transport. A provider that sends through its own leaf is
//! not aborted by [`Transport::cancel`]; dropping the send future is the only way to stop it.
//! A provider sharing the chain's leaf (the usual
//! [`OAuth2TokenProvider`](crate::auth::OAuth2TokenProvider) setup) has its token call aborted
//! with the rest of the leaf's sends, and the send completes as
//! [`TransportFailure::Cancelled`].

// std
use std::{error::Error as StdError, iter};
// crates.io
use http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{AuthState, Token, TokenProvider},
	error::{ConfigError, TokenError, TransportFailure},
	obs::{Stage, StageSpan},
	request::WireRequest,
	transport::{AddHeaders, HeaderMode, Transport, TransportFuture, TransportOutcome},
};

/// Decorator that authenticates every request with a bearer token.
pub struct TokenAuth {
	next: Arc<dyn Transport>,
	auth: AuthState,
	unauthorized_retries: u8,
}
impl TokenAuth {
	/// Creates a decorator with an empty token cache backed by `provider`.
	pub fn new(next: Arc<dyn Transport>, provider: Arc<dyn TokenProvider>) -> Self {
		Self { next, auth: AuthState::new(provider), unauthorized_retries: 0 }
	}

	/// Seeds the token cache.
	pub fn with_tokens(mut self, access: Option<Token>, refresh: Option<Token>) -> Self {
		self.auth = self.auth.with_tokens(access, refresh);

		self
	}

	/// Treats tokens expiring within `leeway` as stale.
	pub fn with_refresh_leeway(mut self, leeway: Duration) -> Self {
		self.auth = self.auth.with_refresh_leeway(leeway);

		self
	}

	/// Repeats a send rejected with `401 Unauthorized` up to `retries` times.
	///
	/// Each retry drops the rejected access token and obtains a new one first. Disabled (zero)
	/// by default.
	pub fn with_unauthorized_retries(mut self, retries: u8) -> Self {
		self.unauthorized_retries = retries;

		self
	}

	/// Token state owned by this decorator.
	pub fn auth_state(&self) -> &AuthState {
		&self.auth
	}

	async fn send_authorized(&self, token: &str, request: WireRequest) -> TransportOutcome {
		let mut value = match HeaderValue::from_str(&format!("Bearer {token}")) {
			Ok(value) => value,
			Err(_) =>
				return TransportFailure::unknown(ConfigError::InvalidHeader {
					name: AUTHORIZATION.to_string(),
				})
				.into(),
		};

		value.set_sensitive(true);

		let authorized = AddHeaders::from_parts(
			self.next.clone(),
			vec![(AUTHORIZATION, value)],
			HeaderMode::Replace,
		);

		authorized.send(request).await
	}
}
impl Transport for TokenAuth {
	fn send(&self, request: WireRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let span = StageSpan::new(Stage::TokenAcquire, &request);
			let mut request = request;
			let mut retries_left = self.unauthorized_retries;

			loop {
				let token = match span.instrument(self.auth.token()).await {
					Ok(token) => token,
					Err(e) if is_cancellation(&e) => return TransportFailure::Cancelled.into(),
					Err(e) => return TransportFailure::unknown(e).into(),
				};
				let retry = (retries_left > 0).then(|| request.clone());
				let outcome = self.send_authorized(&token, request).await;

				match (outcome, retry) {
					(TransportOutcome::ApplicationFailure(response), Some(copy))
						if response.status == StatusCode::UNAUTHORIZED =>
					{
						self.auth.invalidate(&token);

						retries_left -= 1;
						request = copy;
					},
					(outcome, _) => return outcome,
				}
			}
		})
	}

	fn next(&self) -> Option<&dyn Transport> {
		Some(self.next.as_ref())
	}
}
impl Debug for TokenAuth {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAuth")
			.field("auth", &self.auth)
			.field("unauthorized_retries", &self.unauthorized_retries)
			.finish()
	}
}

// Token calls routed through a cancelled leaf fail with `Cancelled` somewhere down the source
// chain; `oauth2` keeps it boxed inside `HttpClientError::Reqwest`.
fn is_cancellation(error: &TokenError) -> bool {
	iter::successors(Some(error as &(dyn StdError + 'static)), |e: &&(dyn StdError + 'static)| (*e).source()).any(|e| {
		let failure = e
			.downcast_ref::<TransportFailure>()
			.or_else(|| e.downcast_ref::<Box<TransportFailure>>().map(|boxed| &**boxed));

		failure.is_some_and(TransportFailure::is_cancelled)
	})
}
