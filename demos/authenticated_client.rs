//! Builds an authenticated client and loads one typed request through it.
//!
//! 1. Create a [`ReqwestTransport`] leaf.
//! 2. Point an [`OAuth2TokenProvider`] at the token endpoint; it shares the leaf.
//! 3. Compose the chain with [`ChainBuilder`]: a header decorator, then bearer authentication.
//! 4. Hand the chain to a [`Client`] and load an [`ApiRequest`].
//!
//! Endpoints and credentials come from `API_BASE_URL`, `TOKEN_URL`, `CLIENT_ID`, and
//! `CLIENT_SECRET`.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
// self
use transport_chain::{
	auth::OAuth2TokenProvider,
	client::Client,
	error::{BoxError, RequestError},
	http::Method,
	request::{ApiRequest, WireRequest},
	transport::{ChainBuilder, HeaderMode, ReqwestTransport, Transport, TransportResponse},
	url::Url,
};

struct Profile;
impl ApiRequest for Profile {
	type Output = String;

	fn make_request(&self, base_url: &Url) -> Result<WireRequest, RequestError> {
		WireRequest::from_base(Method::GET, base_url, "/me")?.with_header("accept", "text/plain")
	}

	fn parse_response(&self, response: TransportResponse) -> Result<String, BoxError> {
		Ok(String::from_utf8(response.body)?)
	}
}

fn var(name: &str, default: &str) -> String {
	env::var(name).unwrap_or_else(|_| default.to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let leaf: Arc<dyn Transport> = Arc::new(ReqwestTransport::default());
	let provider = OAuth2TokenProvider::new(
		&var("TOKEN_URL", "https://auth.example.com/oauth/token"),
		var("CLIENT_ID", "demo-client"),
		leaf.clone(),
	)?
	.with_client_secret(var("CLIENT_SECRET", "demo-secret"))
	.with_scopes(["profile.read"]);
	let chain = ChainBuilder::from_arc(leaf)
		.headers([("user-agent", "transport-chain-demo")], HeaderMode::Add)?
		.token_auth(Arc::new(provider))
		.build();
	let base_url = Url::parse(&var("API_BASE_URL", "https://api.example.com"))?;
	let client = Client::new(base_url, chain);

	match client.load(&Profile).await {
		Ok(profile) => println!("Profile: {profile}"),
		Err(e) if e.is_cancelled() => println!("Request was cancelled."),
		Err(e) => println!("Request failed: {e}"),
	}

	Ok(())
}
