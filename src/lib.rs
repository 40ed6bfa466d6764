//! Composable HTTP transport chains - header injection, single-flight bearer authentication,
//! and a typed request/response client in one crate.
//!
//! A [`Client`](client::Client) turns [`ApiRequest`](request::ApiRequest) values into
//! [`WireRequest`](request::WireRequest)s and hands them to the head of a chain of
//! [`Transport`](transport::Transport) decorators. The leaf performs the network call
//! ([`ReqwestTransport`](transport::ReqwestTransport) with the default `reqwest` feature), and
//! each decorator on the way down may rewrite the request or consume state:
//!
//! - [`AddHeaders`](transport::AddHeaders) applies a fixed header set under a
//!   [`HeaderMode`](transport::HeaderMode).
//! - [`TokenAuth`](transport::TokenAuth) attaches `Authorization: Bearer` tokens served by an
//!   [`AuthState`](auth::AuthState), which reuses, refreshes, or fetches tokens from a
//!   [`TokenProvider`](auth::TokenProvider) with at most one provider call in flight.
//! - [`BackgroundTask`](transport::BackgroundTask) keeps a host-granted activity alive while a
//!   send runs.

#![deny(clippy::all, missing_docs)]
#![cfg_attr(not(test), deny(unused_crate_dependencies))]

pub mod auth;
pub mod client;
pub mod error;
pub mod obs;
pub mod request;
pub mod transport;

#[cfg(any(test, feature = "test"))]
pub mod _preludet;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use http::StatusCode;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use http;
pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
