//! Transport primitives shared by the token provider and the request decorator.
//!
//! The module exposes [`RequestDispatcher`], the crate's only dependency on an
//! HTTP stack. The same capability serves two seams: the authority-side client
//! that reaches the token endpoint, and the downstream pipeline the decorated
//! request is forwarded into. The two must be distinct instances — routing the
//! token exchange through the decorated client would recurse into the handler.

// std
use std::ops::Deref;
// crates.io
use http::{Method, Request, Response, header};
use url::form_urlencoded;
// self
use crate::{_prelude::*, error::ConfigError};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

/// Boxed future returned by [`RequestDispatcher::dispatch`].
pub type DispatchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Response<Vec<u8>>>> + 'a + Send>>;

/// Capability to dispatch an outbound HTTP request and await its response.
///
/// Implementations must be `Send + Sync + 'static` so handlers can be shared
/// across tasks, and the returned future must be `Send` for the lifetime of
/// the in-flight operation. Decorators implement the trait themselves, so
/// pipelines compose by explicit chaining instead of framework middleware.
pub trait RequestDispatcher
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` and resolves with the complete buffered response.
	fn dispatch(&self, request: Request<Vec<u8>>) -> DispatchFuture<'_>;
}

/// Builds the `application/x-www-form-urlencoded` POST for a token exchange.
pub(crate) fn token_request(
	endpoint: &Url,
	form: &[(String, String)],
) -> Result<Request<Vec<u8>>, ConfigError> {
	let mut serializer = form_urlencoded::Serializer::new(String::new());

	for (key, value) in form {
		serializer.append_pair(key, value);
	}

	let body = serializer.finish().into_bytes();

	Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.header(header::ACCEPT, "application/json")
		.body(body)
		.map_err(ConfigError::from)
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token
/// endpoints return results directly instead of delegating to another URI. Configure
/// any custom [`ReqwestClient`] accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestDispatcher(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestDispatcher {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestDispatcher {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestDispatcher {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl RequestDispatcher for ReqwestDispatcher {
	fn dispatch(&self, request: Request<Vec<u8>>) -> DispatchFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client
				.execute(request.try_into().map_err(TransportError::from)?)
				.await
				.map_err(TransportError::from)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				Response::new(response.bytes().await.map_err(TransportError::from)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_request_posts_an_urlencoded_form() {
		let endpoint =
			Url::parse("https://authority/connect/token").expect("Endpoint should parse.");
		let form = vec![
			("grant_type".to_string(), "client_credentials".to_string()),
			("client_id".to_string(), "test-client".to_string()),
			("scope".to_string(), "downstream-api offline_access".to_string()),
		];
		let request = token_request(&endpoint, &form).expect("Request construction should succeed.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri(), "https://authority/connect/token");
		assert_eq!(
			request.headers().get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
			Some(b"application/x-www-form-urlencoded".as_slice()),
		);

		let body = String::from_utf8(request.body().clone()).expect("Body should be UTF-8.");

		assert_eq!(
			body,
			"grant_type=client_credentials&client_id=test-client&scope=downstream-api+offline_access",
		);
	}

	#[test]
	fn token_request_escapes_reserved_characters() {
		let endpoint =
			Url::parse("https://authority/connect/token").expect("Endpoint should parse.");
		let form = vec![("client_secret".to_string(), "s&cr=t".to_string())];
		let request = token_request(&endpoint, &form).expect("Request construction should succeed.");
		let body = String::from_utf8(request.body().clone()).expect("Body should be UTF-8.");

		assert_eq!(body, "client_secret=s%26cr%3Dt");
	}
}
