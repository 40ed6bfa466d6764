// crates.io
use futures::future;
// self
use transport_chain::{
	_preludet::*,
	auth::Token,
	client::Client,
	error::{TokenError, TransportFailure},
	transport::{TokenAuth, Transport},
};

const BASE_URL: &str = "https://test.somewhere.com";

fn client(chain: Arc<dyn Transport>) -> Client {
	Client::new(url(BASE_URL), chain)
}

#[tokio::test]
async fn fresh_access_token_is_reused_without_provider_calls() {
	let stub = Arc::new(StubTransport::default());
	let provider = Arc::new(StubTokenProvider::new());
	let auth = TokenAuth::new(stub.clone(), provider.clone()).with_tokens(
		Some(Token::expiring_in("cached", Duration::hours(1))),
		Some(Token::never_expiring("refresh")),
	);
	let client = client(Arc::new(auth));

	for _ in 0..2 {
		client.load(&TextRequest::get("")).await.expect("Load should succeed.");
	}

	assert_eq!(provider.fetch_count(), 0);
	assert_eq!(provider.refresh_count(), 0);

	for request in stub.history() {
		assert_eq!(request.header_values("authorization"), ["Bearer cached"]);
	}
}

#[tokio::test]
async fn expired_access_token_is_refreshed_once() {
	let stub = Arc::new(StubTransport::default());
	let provider = Arc::new(StubTokenProvider::new());
	let auth = TokenAuth::new(stub.clone(), provider.clone()).with_tokens(
		Some(Token::expiring_in("expired", Duration::seconds(-10))),
		Some(Token::expiring_in("refresh", Duration::hours(1))),
	);

	client(Arc::new(auth)).load(&TextRequest::get("")).await.expect("Load should succeed.");

	let request = stub.last_request().expect("Leaf should observe the request.");

	assert_eq!(provider.refresh_count(), 1);
	assert_eq!(provider.fetch_count(), 0);
	assert_eq!(request.header_values("authorization"), ["Bearer refreshed-0"]);
}

#[tokio::test]
async fn empty_state_fetches_once() {
	let stub = Arc::new(StubTransport::default());
	let provider = Arc::new(StubTokenProvider::new());
	let auth = Arc::new(TokenAuth::new(stub.clone(), provider.clone()));

	client(auth.clone()).load(&TextRequest::get("")).await.expect("Load should succeed.");

	assert_eq!(provider.fetch_count(), 1);
	assert_eq!(provider.refresh_count(), 0);
	assert_eq!(auth.auth_state().metrics().fetches(), 1);
	assert_eq!(
		auth.auth_state().refresh_token().map(|token| token.raw().to_owned()),
		Some("refresh-0".into())
	);
}

#[tokio::test]
async fn expired_refresh_token_falls_back_to_fetch() {
	let stub = Arc::new(StubTransport::default());
	let provider = Arc::new(StubTokenProvider::new());
	let auth = TokenAuth::new(stub.clone(), provider.clone()).with_tokens(
		Some(Token::expiring_in("expired", Duration::seconds(-10))),
		Some(Token::expiring_in("refresh", Duration::seconds(-10))),
	);

	client(Arc::new(auth)).load(&TextRequest::get("")).await.expect("Load should succeed.");

	assert_eq!(provider.refresh_count(), 0);
	assert_eq!(provider.fetch_count(), 1);
}

#[tokio::test]
async fn concurrent_loads_share_one_fetch() {
	let stub = Arc::new(StubTransport::default());
	let provider = Arc::new(StubTokenProvider::new().with_yields(3));
	let client = client(Arc::new(TokenAuth::new(stub.clone(), provider.clone())));
	let request = TextRequest::get("");
	let results = future::join_all((0..8).map(|_| client.load(&request))).await;

	assert!(results.iter().all(|result| result.is_ok()));
	assert_eq!(provider.fetch_count(), 1);
	assert_eq!(stub.history().len(), 8);

	for request in stub.history() {
		assert_eq!(request.header_values("authorization"), ["Bearer access-0"]);
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_share_one_fetch() {
	let stub = Arc::new(StubTransport::default());
	let provider = Arc::new(StubTokenProvider::new().with_yields(16));
	let client = client(Arc::new(TokenAuth::new(stub.clone(), provider.clone())));
	let handles = (0..16)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.load(&TextRequest::get("")).await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.await.expect("Task should not panic.").expect("Load should succeed.");
	}

	assert_eq!(provider.fetch_count(), 1);
	assert_eq!(stub.history().len(), 16);
}

#[tokio::test]
async fn provider_failure_is_unknown_and_never_reaches_the_leaf() {
	let stub = Arc::new(StubTransport::default());
	let provider = Arc::new(StubTokenProvider::new());

	provider.set_failing(true);

	let err = client(Arc::new(TokenAuth::new(stub.clone(), provider.clone())))
		.load(&TextRequest::get(""))
		.await
		.expect_err("Provider failure should fail the load.");

	match err {
		Error::Transport(TransportFailure::Unknown { source }) => {
			assert!(source.downcast_ref::<TokenError>().is_some());
		},
		other => panic!("Expected an unknown transport failure, got {other:?}."),
	}

	assert!(stub.history().is_empty());
	assert_eq!(provider.fetch_count(), 1);
}

#[tokio::test]
async fn unauthorized_responses_are_retried_with_a_new_token_when_enabled() {
	let stub = Arc::new(StubTransport::default());

	stub.push(StubReply::status(401, "expired"));

	let provider = Arc::new(StubTokenProvider::new());
	let auth = TokenAuth::new(stub.clone(), provider.clone()).with_unauthorized_retries(1);
	let body = client(Arc::new(auth))
		.load(&TextRequest::get(""))
		.await
		.expect("Retry should succeed.");
	let history = stub.history();

	assert_eq!(body, "Test");
	assert_eq!(history.len(), 2);
	assert_eq!(history[0].header_values("authorization"), ["Bearer access-0"]);
	assert_eq!(history[1].header_values("authorization"), ["Bearer refreshed-0"]);
	assert_eq!(provider.fetch_count(), 1);
	assert_eq!(provider.refresh_count(), 1);
}

#[tokio::test]
async fn unauthorized_responses_are_returned_as_is_by_default() {
	let stub = Arc::new(StubTransport::replying(StubReply::status(401, "expired")));
	let provider = Arc::new(StubTokenProvider::new());
	let err = client(Arc::new(TokenAuth::new(stub.clone(), provider.clone())))
		.load(&TextRequest::get(""))
		.await
		.expect_err("401 should surface.");

	assert!(matches!(
		err,
		Error::Api(ref api) if api.status == StatusCode::UNAUTHORIZED
	));
	assert_eq!(stub.history().len(), 1);
	assert_eq!(provider.fetch_count(), 1);
}
