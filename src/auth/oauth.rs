//! OAuth 2.0 token provider that talks to the token endpoint through a [`Transport`].
//!
//! The initial fetch uses the client-credentials grant and refreshes use the refresh-token
//! grant. Token endpoint calls go through whatever transport the provider was built with, so
//! they get the same leaf (and any header decorators) as ordinary requests. Building the
//! provider on top of a chain that contains a [`TokenAuth`](crate::transport::TokenAuth) fed
//! by this very provider would recurse; give it a chain without one.

// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, HttpRequest, HttpResponse, RefreshToken, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{ProviderFuture, Token, TokenPair, TokenProvider},
	error::{BoxError, ConfigError, TokenError, TransportFailure},
	request::WireRequest,
	transport::{Transport, TransportOutcome},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// How client credentials are presented to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClientAuthStyle {
	/// HTTP Basic authentication (`client_secret_basic`).
	#[default]
	Basic,
	/// `client_id`/`client_secret` form fields (`client_secret_post`).
	RequestBody,
}

/// [`TokenProvider`] backed by an OAuth 2.0 token endpoint.
pub struct OAuth2TokenProvider {
	oauth_client: ConfiguredBasicClient,
	http_client: TransportHttpClient,
	scopes: Vec<String>,
}
impl OAuth2TokenProvider {
	/// Creates a provider for `token_url` that sends its exchanges through `transport`.
	pub fn new(
		token_url: &str,
		client_id: impl Into<String>,
		transport: Arc<dyn Transport>,
	) -> Result<Self, ConfigError> {
		let token_url = TokenUrl::new(token_url.to_owned())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		let oauth_client =
			BasicClient::new(ClientId::new(client_id.into())).set_token_uri(token_url);
		let http_client = TransportHttpClient { transport };

		Ok(Self { oauth_client, http_client, scopes: Vec::new() })
	}

	/// Authenticates the client with `secret`.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.oauth_client = self.oauth_client.set_client_secret(ClientSecret::new(secret.into()));

		self
	}

	/// Selects how the client credentials are sent.
	pub fn with_auth_style(mut self, style: ClientAuthStyle) -> Self {
		let auth_type = match style {
			ClientAuthStyle::Basic => AuthType::BasicAuth,
			ClientAuthStyle::RequestBody => AuthType::RequestBody,
		};

		self.oauth_client = self.oauth_client.set_auth_type(auth_type);

		self
	}

	/// Requests `scopes` on every exchange.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
		self.scopes.iter().map(|scope| Scope::new(scope.clone()))
	}
}
impl TokenProvider for OAuth2TokenProvider {
	fn fetch_token(&self) -> ProviderFuture<'_, TokenPair> {
		Box::pin(async move {
			let response = self
				.oauth_client
				.exchange_client_credentials()
				.add_scopes(self.scopes())
				.request_async(&self.http_client)
				.await?;
			let access = access_token(&response)?;

			let pair = match response.refresh_token() {
				Some(refresh) => TokenPair::new(access, Token::never_expiring(refresh.secret())),
				None => TokenPair::access_only(access),
			};

			Ok::<_, BoxError>(pair)
		})
	}

	fn refresh_token<'a>(&'a self, refresh: &'a Token) -> ProviderFuture<'a, Token> {
		Box::pin(async move {
			let refresh_secret = RefreshToken::new(refresh.raw().to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.add_scopes(self.scopes())
				.request_async(&self.http_client)
				.await?;

			Ok::<_, BoxError>(access_token(&response)?)
		})
	}
}
impl Debug for OAuth2TokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2TokenProvider")
			.field("client_id", self.oauth_client.client_id())
			.field("scopes", &self.scopes)
			.finish()
	}
}

// Adapts a transport chain to the HTTP client interface `oauth2` drives its exchanges with.
struct TransportHttpClient {
	transport: Arc<dyn Transport>,
}
impl<'c> AsyncHttpClient<'c> for TransportHttpClient {
	type Error = HttpClientError<TransportFailure>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			let request = wire_request(request)?;
			// Non-2xx token responses still carry the OAuth error body `oauth2` parses.
			let response = match self.transport.send(request).await {
				TransportOutcome::Success(response)
				| TransportOutcome::ApplicationFailure(response) => response,
				TransportOutcome::TransportFailure(failure) =>
					return Err(HttpClientError::Reqwest(Box::new(failure))),
			};
			let mut http_response = HttpResponse::new(response.body);

			*http_response.status_mut() = response.status;
			*http_response.headers_mut() = response.headers;

			Ok(http_response)
		})
	}
}

fn wire_request(request: HttpRequest) -> Result<WireRequest, HttpClientError<TransportFailure>> {
	let (parts, body) = request.into_parts();
	let url = Url::parse(&parts.uri.to_string())
		.map_err(|e| HttpClientError::Other(format!("Token endpoint URI is invalid: {e}.")))?;
	let mut wire = WireRequest::new(parts.method, url).with_body(body);

	wire.headers = parts.headers;

	Ok(wire)
}

fn access_token(response: &BasicTokenResponse) -> Result<Token, TokenError> {
	let raw = response.access_token().secret();
	let Some(expires_in) = response.expires_in() else {
		return Ok(Token::never_expiring(raw));
	};
	let expires_in = Duration::try_from(expires_in).map_err(|_| TokenError::ExpiresInOutOfRange)?;
	let expires_at = OffsetDateTime::now_utc()
		.checked_add(expires_in)
		.ok_or(TokenError::ExpiresInOutOfRange)?;

	Ok(Token::new(raw, Some(expires_at)))
}
