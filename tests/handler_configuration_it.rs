// std
use std::sync::Arc;
// self
use oidc_handlers::{
	cache::{MemoryTokenCache, TokenCache},
	handler::{ReqwestTokenHandler, TokenHandler},
	http::ReqwestDispatcher,
	options::{
		ClientCredentialsOptions, DelegationOptions, InboundTokenRetriever, PasswordOptions,
		RefreshTokenOptions, RefreshTokenRetriever, RetrieverFuture, TokenHandlerOptions,
		UserCredentials, UserCredentialsRetriever,
	},
	url::Url,
};

struct StaticCredentials;
impl UserCredentialsRetriever for StaticCredentials {
	fn retrieve(&self) -> RetrieverFuture<'_, UserCredentials> {
		Box::pin(async { UserCredentials::new("some-username", "some-password") })
	}
}

struct StaticRefreshToken;
impl RefreshTokenRetriever for StaticRefreshToken {
	fn retrieve(&self) -> RetrieverFuture<'_, Option<String>> {
		Box::pin(async { Some("some-refresh-token".into()) })
	}
}

struct StaticInboundToken;
impl InboundTokenRetriever for StaticInboundToken {
	fn retrieve(&self) -> RetrieverFuture<'_, Option<String>> {
		Box::pin(async { Some("some-inbound-token".into()) })
	}
}

fn cache() -> Option<Arc<dyn TokenCache>> {
	Some(Arc::new(MemoryTokenCache::default()))
}

fn dispatcher() -> ReqwestDispatcher {
	ReqwestDispatcher::default()
}

fn expected_validation_error_message(validation_errors: &[&str]) -> String {
	format!("Options are not valid:\n\n{}", validation_errors.join("\n"))
}

fn valid_options() -> TokenHandlerOptions {
	TokenHandlerOptions::new()
		.with_token_endpoint(
			Url::parse("https://authority/connect/token")
				.expect("Token endpoint fixture should parse."),
		)
		.with_client_id("test-client")
		.with_client_secret("test-client secret key")
		.with_scope("downstream-api")
}

#[test]
fn empty_client_credentials_options_report_every_rule() {
	let err = ReqwestTokenHandler::client_credentials(
		ClientCredentialsOptions::new(TokenHandlerOptions::new()),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect_err("Empty options should fail construction.");

	assert_eq!(
		err.to_string(),
		expected_validation_error_message(&[
			"You must either set Authority or TokenEndpoint.",
			"You must set ClientId.",
			"You must set ClientSecret.",
			"You must set Scope.",
		]),
	);
}

#[test]
fn empty_password_options_report_every_rule() {
	let err = ReqwestTokenHandler::password(
		PasswordOptions::new(TokenHandlerOptions::new()),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect_err("Empty options should fail construction.");

	assert_eq!(
		err.to_string(),
		expected_validation_error_message(&[
			"You must either set Authority or TokenEndpoint.",
			"You must set ClientId.",
			"You must set ClientSecret.",
			"You must set Scope.",
			"You must set UserCredentialsRetriever.",
		]),
	);
}

#[test]
fn empty_refresh_options_report_every_rule() {
	let err = ReqwestTokenHandler::refresh_token(
		RefreshTokenOptions::new(TokenHandlerOptions::new()),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect_err("Empty options should fail construction.");

	assert_eq!(
		err.to_string(),
		expected_validation_error_message(&[
			"You must either set Authority or TokenEndpoint.",
			"You must set ClientId.",
			"You must set ClientSecret.",
			"You must set Scope.",
			"You must set RefreshTokenRetriever.",
		]),
	);
}

#[test]
fn empty_delegation_options_report_every_rule() {
	let err = ReqwestTokenHandler::delegation(
		DelegationOptions::new(TokenHandlerOptions::new()),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect_err("Empty options should fail construction.");

	assert_eq!(
		err.to_string(),
		expected_validation_error_message(&[
			"You must either set Authority or TokenEndpoint.",
			"You must set ClientId.",
			"You must set ClientSecret.",
			"You must set Scope.",
			"You must set InboundTokenRetriever.",
		]),
	);
}

#[test]
fn token_endpoint_without_authority_constructs() {
	TokenHandler::password(
		PasswordOptions::new(valid_options()).with_user_credentials_retriever(StaticCredentials),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect("TokenEndpoint alone should satisfy the endpoint rule.");

	TokenHandler::refresh_token(
		RefreshTokenOptions::new(valid_options()).with_refresh_token_retriever(StaticRefreshToken),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect("TokenEndpoint alone should satisfy the endpoint rule.");

	TokenHandler::delegation(
		DelegationOptions::new(valid_options()).with_inbound_token_retriever(StaticInboundToken),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect("TokenEndpoint alone should satisfy the endpoint rule.");
}

#[test]
fn enabled_caching_without_a_cache_service_fails() {
	let err = ReqwestTokenHandler::password(
		PasswordOptions::new(valid_options()).with_user_credentials_retriever(StaticCredentials),
		dispatcher(),
		dispatcher(),
		None,
	)
	.expect_err("Enabled caching without a cache service should fail construction.");

	assert_eq!(
		err.to_string(),
		"Caching is enabled, but no TokenCache is found in the services collection.",
	);
}

#[test]
fn enabled_caching_with_a_cache_service_constructs() {
	TokenHandler::password(
		PasswordOptions::new(valid_options()).with_user_credentials_retriever(StaticCredentials),
		dispatcher(),
		dispatcher(),
		cache(),
	)
	.expect("Enabled caching with a cache service should construct.");
}
