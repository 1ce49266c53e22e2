// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use oidc_handlers::{
	cache::{MemoryTokenCache, TokenCache},
	error::{Error, FetchError},
	handler::{ReqwestTokenHandler, TokenHandler},
	http::ReqwestDispatcher,
	options::{DelegationOptions, InboundTokenRetriever, RetrieverFuture, TokenHandlerOptions},
	url::Url,
};

const CLIENT_SECRET: &str = "test-client secret key";

struct StaticInboundToken(Option<&'static str>);
impl InboundTokenRetriever for StaticInboundToken {
	fn retrieve(&self) -> RetrieverFuture<'_, Option<String>> {
		let value = self.0.map(str::to_owned);

		Box::pin(async move { value })
	}
}

fn build_handler(
	server: &MockServer,
	client_id: &str,
	inbound: Option<&'static str>,
) -> ReqwestTokenHandler {
	let cache: Arc<dyn TokenCache> = Arc::new(MemoryTokenCache::default());
	let options = TokenHandlerOptions::new()
		.with_token_endpoint(
			Url::parse(&server.url("/connect/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.with_client_id(client_id)
		.with_client_secret(CLIENT_SECRET)
		.with_scope("downstream-api");

	TokenHandler::delegation(
		DelegationOptions::new(options).with_inbound_token_retriever(StaticInboundToken(inbound)),
		ReqwestDispatcher::default(),
		ReqwestDispatcher::default(),
		Some(cache),
	)
	.expect("Handler construction should succeed.")
}

fn get_request(server: &MockServer) -> http::Request<Vec<u8>> {
	http::Request::builder()
		.method(http::Method::GET)
		.uri(server.url("/resource"))
		.body(Vec::new())
		.expect("Request construction should succeed.")
}

#[tokio::test]
async fn delegation_exchanges_the_inbound_token() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/connect/token")
				.form_urlencoded_tuple("grant_type", "delegation")
				.form_urlencoded_tuple("client_id", "delegation-grant")
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET)
				.form_urlencoded_tuple("scope", "downstream-api")
				.form_urlencoded_tuple("token", "inbound-token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"delegated-token\",\"token_type\":\"bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let resource_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/resource").header("authorization", "Bearer delegated-token");
			then.status(200).body("ok");
		})
		.await;
	let handler = build_handler(&server, "delegation-grant", Some("inbound-token"));
	let response = handler
		.send(get_request(&server))
		.await
		.expect("Decorated request should succeed.");

	assert_eq!(response.status(), http::StatusCode::OK);

	token_mock.assert_async().await;
	resource_mock.assert_async().await;
}

#[tokio::test]
async fn missing_inbound_token_fails_before_any_exchange() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/connect/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"unused\",\"token_type\":\"bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let handler = build_handler(&server, "delegation-missing", None);
	let err = handler
		.send(get_request(&server))
		.await
		.expect_err("A missing inbound token should fail the request.");

	assert!(matches!(err, Error::Fetch(FetchError::MissingInboundToken)));

	token_mock.assert_calls_async(0).await;
}
