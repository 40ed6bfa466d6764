// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how [`AuthState`](crate::auth::AuthState) served tokens.
#[derive(Debug, Default)]
pub struct AuthMetrics {
	reuses: AtomicU64,
	refreshes: AtomicU64,
	fetches: AtomicU64,
	failures: AtomicU64,
}
impl AuthMetrics {
	/// Returns the number of calls answered from the cached access token.
	pub fn reuses(&self) -> u64 {
		self.reuses.load(Ordering::Relaxed)
	}

	/// Returns the number of provider refresh calls issued.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of provider fetch calls issued.
	pub fn fetches(&self) -> u64 {
		self.fetches.load(Ordering::Relaxed)
	}

	/// Returns the number of provider calls that failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_reuse(&self) {
		self.reuses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_fetch(&self) {
		self.fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
