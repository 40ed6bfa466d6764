//! Cached bearer-token state with single-flight acquisition.
//!
//! [`AuthState::token`] answers from the cached access token while it is fresh, otherwise it
//! refreshes with the cached refresh token, and only falls back to a full fetch when neither
//! token is usable. Token slots live behind a synchronous lock that is never held across an
//! `.await`; provider calls are serialized by a separate async guard so concurrent callers on a
//! stale state wait for the one in-flight call and then reuse its result instead of issuing
//! their own.

mod metrics;

pub use metrics::AuthMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Token, TokenProvider},
	error::TokenError,
	obs::{self, Stage},
};

/// Token state owned by one [`TokenAuth`](crate::transport::TokenAuth) transport.
pub struct AuthState {
	provider: Arc<dyn TokenProvider>,
	tokens: Mutex<CachedTokens>,
	singleflight: AsyncMutex<()>,
	refresh_leeway: Duration,
	metrics: Arc<AuthMetrics>,
}
impl AuthState {
	/// Creates an empty state backed by `provider`.
	pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
		Self {
			provider,
			tokens: Default::default(),
			singleflight: AsyncMutex::new(()),
			refresh_leeway: Duration::ZERO,
			metrics: Default::default(),
		}
	}

	/// Seeds the cache, e.g. with tokens persisted by a previous process.
	pub fn with_tokens(self, access: Option<Token>, refresh: Option<Token>) -> Self {
		*self.tokens.lock() = CachedTokens { access, refresh };

		self
	}

	/// Treats tokens expiring within `leeway` as already stale (defaults to zero).
	pub fn with_refresh_leeway(mut self, leeway: Duration) -> Self {
		self.refresh_leeway = if leeway.is_negative() { Duration::ZERO } else { leeway };

		self
	}

	/// Configured freshness leeway.
	pub fn refresh_leeway(&self) -> Duration {
		self.refresh_leeway
	}

	/// Counters describing how tokens were served.
	pub fn metrics(&self) -> &Arc<AuthMetrics> {
		&self.metrics
	}

	/// Returns a copy of the cached access token.
	pub fn access_token(&self) -> Option<Token> {
		self.tokens.lock().access.clone()
	}

	/// Returns a copy of the cached refresh token.
	pub fn refresh_token(&self) -> Option<Token> {
		self.tokens.lock().refresh.clone()
	}

	/// Returns a usable raw bearer token, refreshing or fetching as needed.
	///
	/// Provider failures are returned as-is and never retried here.
	pub async fn token(&self) -> Result<String, TokenError> {
		if let Some(raw) = self.fresh_access() {
			self.metrics.record_reuse();
			obs::record_stage_outcome(Stage::TokenAcquire, "reused");

			return Ok(raw);
		}

		let _singleflight = self.singleflight.lock().await;
		// Re-check: the caller that held the guard may have replaced the tokens.
		let plan = self.plan();
		let result = match plan {
			Plan::Reuse(raw) => {
				self.metrics.record_reuse();

				Ok(raw)
			},
			Plan::Refresh(refresh) => self.refresh_with(refresh).await,
			Plan::Fetch => self.fetch_pair().await,
		};

		match &result {
			Ok(_) => obs::record_stage_outcome(Stage::TokenAcquire, "success"),
			Err(_) => obs::record_stage_outcome(Stage::TokenAcquire, "failure"),
		}

		result
	}

	/// Drops the cached access token if it is still `raw`.
	///
	/// Returns `false` when another caller already replaced the token, in which case the
	/// replacement is kept.
	pub fn invalidate(&self, raw: &str) -> bool {
		let mut tokens = self.tokens.lock();

		if tokens.access.as_ref().is_some_and(|token| token.raw() == raw) {
			tokens.access = None;

			true
		} else {
			false
		}
	}

	fn fresh_access(&self) -> Option<String> {
		let now = OffsetDateTime::now_utc();

		self.tokens
			.lock()
			.access
			.as_ref()
			.filter(|token| token.is_fresh_at(now, self.refresh_leeway))
			.map(|token| token.raw().to_owned())
	}

	fn plan(&self) -> Plan {
		let now = OffsetDateTime::now_utc();
		let tokens = self.tokens.lock();

		if let Some(access) =
			tokens.access.as_ref().filter(|token| token.is_fresh_at(now, self.refresh_leeway))
		{
			return Plan::Reuse(access.raw().to_owned());
		}
		if let Some(refresh) =
			tokens.refresh.as_ref().filter(|token| token.is_fresh_at(now, self.refresh_leeway))
		{
			return Plan::Refresh(refresh.clone());
		}

		Plan::Fetch
	}

	async fn refresh_with(&self, refresh: Token) -> Result<String, TokenError> {
		obs::trace_event(&"Refreshing token");
		self.metrics.record_refresh();

		let access = self.provider.refresh_token(&refresh).await.map_err(|source| {
			self.metrics.record_failure();

			TokenError::Provider { source }
		})?;
		let raw = access.raw().to_owned();

		self.tokens.lock().access = Some(access);

		Ok(raw)
	}

	async fn fetch_pair(&self) -> Result<String, TokenError> {
		obs::trace_event(&"Fetching initial tokens");
		self.metrics.record_fetch();

		let pair = self.provider.fetch_token().await.map_err(|source| {
			self.metrics.record_failure();

			TokenError::Provider { source }
		})?;
		let raw = pair.access.raw().to_owned();

		*self.tokens.lock() = CachedTokens { access: Some(pair.access), refresh: pair.refresh };

		Ok(raw)
	}
}
impl Debug for AuthState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let tokens = self.tokens.lock();

		f.debug_struct("AuthState")
			.field("access_token_set", &tokens.access.is_some())
			.field("refresh_token_set", &tokens.refresh.is_some())
			.field("refresh_leeway", &self.refresh_leeway)
			.finish()
	}
}

#[derive(Default)]
struct CachedTokens {
	access: Option<Token>,
	refresh: Option<Token>,
}

enum Plan {
	Reuse(String),
	Refresh(Token),
	Fetch,
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	// crates.io
	use futures::future;
	// self
	use crate::{
		_preludet::StubTokenProvider,
		auth::{ProviderFuture, TokenPair},
		error::BoxError,
	};

	#[derive(Default)]
	struct CountingProvider {
		fetches: AtomicUsize,
		refreshes: AtomicUsize,
		fail: bool,
		fail_refresh: bool,
	}
	impl TokenProvider for CountingProvider {
		fn fetch_token(&self) -> ProviderFuture<'_, TokenPair> {
			let n = self.fetches.fetch_add(1, Ordering::SeqCst);
			let fail = self.fail;

			Box::pin(async move {
				if fail {
					return Err(BoxError::from("fetch rejected"));
				}

				Ok(TokenPair::new(
					Token::expiring_in(format!("access-{n}"), Duration::hours(1)),
					Token::expiring_in("refresh", Duration::days(1)),
				))
			})
		}

		fn refresh_token<'a>(&'a self, refresh: &'a Token) -> ProviderFuture<'a, Token> {
			self.refreshes.fetch_add(1, Ordering::SeqCst);

			let fail = self.fail_refresh;

			Box::pin(async move {
				if fail {
					return Err(BoxError::from("refresh rejected"));
				}

				Ok(Token::expiring_in(format!("from-{}", refresh.raw()), Duration::hours(1)))
			})
		}
	}

	#[tokio::test]
	async fn leeway_turns_soon_expiring_tokens_into_refreshes() {
		let provider = Arc::new(CountingProvider::default());
		let state = AuthState::new(provider.clone())
			.with_tokens(
				Some(Token::expiring_in("short", Duration::seconds(30))),
				Some(Token::never_expiring("long")),
			)
			.with_refresh_leeway(Duration::minutes(1));
		let token = state.token().await.expect("Refresh should succeed.");

		assert_eq!(token, "from-long");
		assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
		assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
		assert_eq!(state.refresh_token().map(|token| token.raw().to_owned()), Some("long".into()));
	}

	#[tokio::test]
	async fn provider_failures_propagate_without_retry() {
		let provider = Arc::new(CountingProvider { fail: true, ..Default::default() });
		let state = AuthState::new(provider.clone());
		let err = state.token().await.expect_err("Fetch failure should propagate.");

		assert!(matches!(err, TokenError::Provider { .. }));
		assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
		assert_eq!(state.metrics().failures(), 1);
		assert!(state.access_token().is_none());
	}

	#[tokio::test]
	async fn refresh_failures_propagate_without_fetch_fallback() {
		let provider = Arc::new(CountingProvider { fail_refresh: true, ..Default::default() });
		let state = AuthState::new(provider.clone()).with_tokens(
			Some(Token::expiring_in("stale", Duration::seconds(-1))),
			Some(Token::never_expiring("refresh")),
		);
		let err = state.token().await.expect_err("Refresh failure should propagate.");

		assert!(matches!(
			err,
			TokenError::Provider { ref source } if source.to_string() == "refresh rejected"
		));
		assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
		assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
		assert_eq!(state.metrics().failures(), 1);
		assert_eq!(state.access_token().map(|token| token.raw().to_owned()), Some("stale".into()));
		assert!(state.refresh_token().is_some());
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_refresh() {
		let provider = Arc::new(StubTokenProvider::new().with_yields(3));
		let state = AuthState::new(provider.clone()).with_tokens(
			Some(Token::expiring_in("stale", Duration::seconds(-1))),
			Some(Token::never_expiring("refresh")),
		);
		let tokens = future::join_all((0..8).map(|_| state.token())).await;

		for token in tokens {
			assert_eq!(token.expect("Refresh should succeed."), "refreshed-0");
		}

		assert_eq!(provider.refresh_count(), 1);
		assert_eq!(provider.fetch_count(), 0);
	}

	#[tokio::test]
	async fn oversized_leeway_fetches_instead_of_panicking() {
		let provider = Arc::new(CountingProvider::default());
		let state = AuthState::new(provider.clone())
			.with_tokens(Some(Token::expiring_in("fresh", Duration::hours(1))), None)
			.with_refresh_leeway(Duration::MAX);
		let token = state.token().await.expect("Fetch should succeed.");

		assert_eq!(token, "access-0");
		assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn invalidate_only_drops_the_matching_token() {
		let provider = Arc::new(CountingProvider::default());
		let state = AuthState::new(provider.clone());
		let first = state.token().await.expect("Fetch should succeed.");

		assert!(!state.invalidate("someone-else"));
		assert!(state.invalidate(&first));
		assert!(state.access_token().is_none());

		let second = state.token().await.expect("Refresh should succeed after invalidation.");

		assert_eq!(second, "from-refresh");
		assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
		assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn missing_refresh_token_falls_back_to_fetch() {
		let provider = Arc::new(CountingProvider::default());
		let state = AuthState::new(provider.clone())
			.with_tokens(Some(Token::expiring_in("stale", Duration::seconds(-1))), None);
		let token = state.token().await.expect("Fetch should succeed.");

		assert_eq!(token, "access-0");
		assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
		assert_eq!(provider.refreshes.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn negative_leeway_is_clamped() {
		let state = AuthState::new(Arc::new(CountingProvider::default()))
			.with_refresh_leeway(Duration::seconds(-5));

		assert_eq!(state.refresh_leeway(), Duration::ZERO);
	}

	#[test]
	fn debug_output_hides_tokens() {
		let state = AuthState::new(Arc::new(CountingProvider::default()))
			.with_tokens(Some(Token::never_expiring("secret-access")), None);
		let rendered = format!("{state:?}");

		assert!(rendered.contains("access_token_set: true"));
		assert!(!rendered.contains("secret-access"));
	}
}
