//! Request-decorating token handlers, one per configured outbound client.
//!
//! A handler wraps an inner [`RequestDispatcher`] with bearer-token
//! acquisition: obtain a valid token (cache-first), set the `Authorization`
//! header, and forward the request. When the downstream service rejects the
//! token with 401/403 the handler drops the cached entry, mints a fresh token,
//! and re-sends exactly once; a second rejection is returned to the caller
//! unchanged. Handlers implement [`RequestDispatcher`] themselves, so
//! decorators compose by explicit chaining.
//!
//! Options are validated eagerly in the constructors: every violated rule is
//! aggregated into one error before any network call is possible.

// crates.io
use http::{
	HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri, Version,
	header::AUTHORIZATION,
};
// self
use crate::{
	_prelude::*,
	cache::{HandlerCache, TokenCache},
	error::ConfigError,
	grants::{
		ClientCredentialsFlow, DelegationFlow, GrantFlow, GrantKind, PasswordFlow, RefreshTokenFlow,
	},
	http::{DispatchFuture, RequestDispatcher},
	options::{
		ClientCredentialsOptions, DelegationOptions, PasswordOptions, RefreshTokenOptions,
		TokenHandlerOptions,
	},
	provider::TokenProvider,
	token::AccessToken,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestDispatcher;

#[cfg(feature = "reqwest")]
/// Token handler specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenHandler = TokenHandler<ReqwestDispatcher, ReqwestDispatcher>;

/// Decorates outbound requests with bearer tokens for one grant strategy.
///
/// `C` is the authority-side transport used to reach the token endpoint and
/// `D` the downstream pipeline the decorated request is forwarded into. The
/// two must be distinct instances so token exchanges never recurse through
/// the handler itself.
pub struct TokenHandler<C, D>
where
	C: ?Sized + RequestDispatcher,
	D: ?Sized + RequestDispatcher,
{
	provider: TokenProvider<C>,
	inner: Arc<D>,
}
impl<C, D> TokenHandler<C, D>
where
	C: ?Sized + RequestDispatcher,
	D: ?Sized + RequestDispatcher,
{
	/// Creates a handler performing the `client_credentials` grant.
	pub fn client_credentials(
		options: ClientCredentialsOptions,
		authority_client: impl Into<Arc<C>>,
		inner: impl Into<Arc<D>>,
		cache: Option<Arc<dyn TokenCache>>,
	) -> Result<Self> {
		options.validate()?;

		let flow = Arc::new(ClientCredentialsFlow::new(&options));

		Self::with_flow(options.handler, GrantKind::ClientCredentials, flow, authority_client, inner, cache)
	}

	/// Creates a handler performing the resource-owner `password` grant.
	pub fn password(
		options: PasswordOptions,
		authority_client: impl Into<Arc<C>>,
		inner: impl Into<Arc<D>>,
		cache: Option<Arc<dyn TokenCache>>,
	) -> Result<Self> {
		let retriever = options.validate()?;
		let flow = Arc::new(PasswordFlow::new(&options, retriever));

		Self::with_flow(options.handler, GrantKind::Password, flow, authority_client, inner, cache)
	}

	/// Creates a handler performing the `refresh_token` grant.
	pub fn refresh_token(
		options: RefreshTokenOptions,
		authority_client: impl Into<Arc<C>>,
		inner: impl Into<Arc<D>>,
		cache: Option<Arc<dyn TokenCache>>,
	) -> Result<Self> {
		let retriever = options.validate()?;
		let flow = Arc::new(RefreshTokenFlow::new(&options, retriever));

		Self::with_flow(options.handler, GrantKind::RefreshToken, flow, authority_client, inner, cache)
	}

	/// Creates a handler performing the `delegation` (token exchange) grant.
	pub fn delegation(
		options: DelegationOptions,
		authority_client: impl Into<Arc<C>>,
		inner: impl Into<Arc<D>>,
		cache: Option<Arc<dyn TokenCache>>,
	) -> Result<Self> {
		let retriever = options.validate()?;
		let flow = Arc::new(DelegationFlow::new(&options, retriever));

		Self::with_flow(options.handler, GrantKind::Delegation, flow, authority_client, inner, cache)
	}

	fn with_flow(
		options: TokenHandlerOptions,
		grant: GrantKind,
		flow: Arc<dyn GrantFlow>,
		authority_client: impl Into<Arc<C>>,
		inner: impl Into<Arc<D>>,
		cache: Option<Arc<dyn TokenCache>>,
	) -> Result<Self> {
		let endpoint = options.resolved_token_endpoint()?;
		let cache = HandlerCache::resolve(&options, cache)?;
		let key = options.cache_key_for(grant);

		Ok(Self {
			provider: TokenProvider::new(authority_client, flow, endpoint, cache, key),
			inner: inner.into(),
		})
	}

	/// The token provider backing this handler.
	pub fn provider(&self) -> &TokenProvider<C> {
		&self.provider
	}

	/// Sends `request` with a bearer token attached, recovering once from a
	/// downstream 401/403 by invalidating the cached token and re-sending.
	pub async fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
		let (parts, body) = request.into_parts();
		let token = self.provider.access_token(false).await?;
		let first = self
			.dispatch_authorized(&parts.method, &parts.uri, parts.version, &parts.headers, &body, &token)
			.await?;

		if !is_auth_failure(first.status()) {
			return Ok(first);
		}

		self.provider.invalidate().await?;

		let fresh = self.provider.access_token(true).await?;

		self.dispatch_authorized(&parts.method, &parts.uri, parts.version, &parts.headers, &body, &fresh)
			.await
	}

	async fn dispatch_authorized(
		&self,
		method: &Method,
		uri: &Uri,
		version: Version,
		headers: &HeaderMap,
		body: &[u8],
		token: &AccessToken,
	) -> Result<Response<Vec<u8>>> {
		let mut request = Request::builder()
			.method(method.clone())
			.uri(uri.clone())
			.version(version)
			.body(body.to_vec())
			.map_err(ConfigError::from)?;

		*request.headers_mut() = headers.clone();

		request.headers_mut().insert(AUTHORIZATION, bearer_header(token)?);

		self.inner.dispatch(request).await
	}
}
impl<C, D> RequestDispatcher for TokenHandler<C, D>
where
	C: ?Sized + RequestDispatcher,
	D: ?Sized + RequestDispatcher,
{
	fn dispatch(&self, request: Request<Vec<u8>>) -> DispatchFuture<'_> {
		Box::pin(self.send(request))
	}
}
impl<C, D> Debug for TokenHandler<C, D>
where
	C: ?Sized + RequestDispatcher,
	D: ?Sized + RequestDispatcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenHandler").field("provider", &self.provider).finish()
	}
}

fn is_auth_failure(status: StatusCode) -> bool {
	matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

fn bearer_header(token: &AccessToken) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::try_from(format!("Bearer {}", token.access_token.expose()))
		.map_err(http::Error::from)
		.map_err(ConfigError::from)?;

	value.set_sensitive(true);

	Ok(value)
}
