//! Per-strategy handler options and the pure validation rules that guard them.
//!
//! Options are plain structs handed to the handler constructors; no late-bound
//! configuration container is involved. Each strategy exposes
//! `violations() -> Vec<String>`, a pure function returning every violated rule
//! in declared order (empty means valid). Constructors aggregate the result
//! into a single [`ConfigError::InvalidOptions`](crate::error::ConfigError) so
//! misconfiguration surfaces once, eagerly, with the complete rule set.

// self
use crate::{
	_prelude::*,
	cache::CacheKey,
	error::ConfigError,
	grants::GrantKind,
};

/// Boxed future returned by the fetch-time retriever capabilities.
pub type RetrieverFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Username/password pair produced by a [`UserCredentialsRetriever`].
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
	/// Resource-owner username presented in the password grant.
	pub username: String,
	/// Resource-owner password presented in the password grant.
	pub password: String,
}
impl UserCredentials {
	/// Creates a new credentials pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}
}
impl Debug for UserCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserCredentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Capability that produces resource-owner credentials once per fetch.
///
/// The password grant invokes this at fetch time, not configuration time, so
/// credentials may rotate underneath a long-lived handler.
pub trait UserCredentialsRetriever: Send + Sync {
	/// Returns the credentials to present in the next password grant.
	fn retrieve(&self) -> RetrieverFuture<'_, UserCredentials>;
}

/// Capability that produces the refresh token presented in the refresh grant.
///
/// Returning `None` fails the fetch; once the endpoint rotates the refresh
/// token the flow keeps the replacement and stops consulting this capability.
pub trait RefreshTokenRetriever: Send + Sync {
	/// Returns the refresh token to present, if one is available.
	fn retrieve(&self) -> RetrieverFuture<'_, Option<String>>;
}

/// Capability that surfaces the caller's inbound bearer token for delegation.
///
/// Implementations typically read the current request context. Returning
/// `None` fails the fetch, since delegation cannot proceed without a subject
/// token.
pub trait InboundTokenRetriever: Send + Sync {
	/// Returns the inbound token to exchange, if the caller presented one.
	fn retrieve(&self) -> RetrieverFuture<'_, Option<String>>;
}

/// Options shared by every token handler strategy.
#[derive(Clone)]
pub struct TokenHandlerOptions {
	/// Issuer base URL; the token endpoint is derived by joining `connect/token`.
	pub authority: Option<Url>,
	/// Explicit token endpoint; wins over [`authority`](Self::authority) when both are set.
	pub token_endpoint: Option<Url>,
	/// OAuth 2.0 client identifier presented in every grant.
	pub client_id: String,
	/// Client secret presented in every grant.
	pub client_secret: String,
	/// Space-delimited scope list requested from the token endpoint.
	pub scope: String,
	/// Toggles token caching; requires a cache service at construction when `true`.
	pub enable_caching: bool,
	/// Overrides the derived cache key.
	pub cache_key: Option<String>,
}
impl TokenHandlerOptions {
	/// Creates empty options with caching enabled.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the issuer authority URL.
	pub fn with_authority(mut self, authority: Url) -> Self {
		self.authority = Some(authority);

		self
	}

	/// Sets an explicit token endpoint.
	pub fn with_token_endpoint(mut self, endpoint: Url) -> Self {
		self.token_endpoint = Some(endpoint);

		self
	}

	/// Sets the client identifier.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the client secret.
	pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = client_secret.into();

		self
	}

	/// Sets the requested scope string.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Overrides the caching toggle.
	pub fn with_caching(mut self, enable_caching: bool) -> Self {
		self.enable_caching = enable_caching;

		self
	}

	/// Overrides the derived cache key.
	pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
		self.cache_key = Some(cache_key.into());

		self
	}

	/// Resolves the token endpoint from the explicit endpoint or the authority.
	pub fn resolved_token_endpoint(&self) -> Result<Url, ConfigError> {
		if let Some(endpoint) = &self.token_endpoint {
			return Ok(endpoint.clone());
		}

		let authority = self.authority.as_ref().ok_or_else(|| ConfigError::InvalidOptions {
			violations: vec![MSG_AUTHORITY_OR_TOKEN_ENDPOINT.into()],
		})?;
		let mut base = authority.clone();

		if !base.path().ends_with('/') {
			base.set_path(&format!("{}/", base.path()));
		}

		base.join("connect/token").map_err(|source| ConfigError::InvalidTokenEndpoint { source })
	}

	/// Cache key for this configuration: the explicit override or the derived key.
	pub fn cache_key_for(&self, grant: GrantKind) -> CacheKey {
		match &self.cache_key {
			Some(key) => CacheKey::new(key.clone()),
			None => CacheKey::derive(grant, &self.client_id, &self.scope),
		}
	}

	fn base_violations(&self) -> Vec<String> {
		let mut violations = Vec::new();

		if self.authority.is_none() && self.token_endpoint.is_none() {
			violations.push(MSG_AUTHORITY_OR_TOKEN_ENDPOINT.into());
		}
		if self.client_id.is_empty() {
			violations.push("You must set ClientId.".into());
		}
		if self.client_secret.is_empty() {
			violations.push("You must set ClientSecret.".into());
		}
		if self.scope.is_empty() {
			violations.push("You must set Scope.".into());
		}

		violations
	}
}
impl Default for TokenHandlerOptions {
	fn default() -> Self {
		Self {
			authority: None,
			token_endpoint: None,
			client_id: String::new(),
			client_secret: String::new(),
			scope: String::new(),
			enable_caching: true,
			cache_key: None,
		}
	}
}
impl Debug for TokenHandlerOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenHandlerOptions")
			.field("authority", &self.authority)
			.field("token_endpoint", &self.token_endpoint)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("scope", &self.scope)
			.field("enable_caching", &self.enable_caching)
			.field("cache_key", &self.cache_key)
			.finish()
	}
}

const MSG_AUTHORITY_OR_TOKEN_ENDPOINT: &str = "You must either set Authority or TokenEndpoint.";

/// Options for the client credentials strategy.
#[derive(Clone, Debug, Default)]
pub struct ClientCredentialsOptions {
	/// Shared handler options.
	pub handler: TokenHandlerOptions,
}
impl ClientCredentialsOptions {
	/// Wraps the shared handler options.
	pub fn new(handler: TokenHandlerOptions) -> Self {
		Self { handler }
	}

	/// Complete set of violated validation rules, in declared order.
	pub fn violations(&self) -> Vec<String> {
		self.handler.base_violations()
	}

	pub(crate) fn validate(&self) -> Result<(), ConfigError> {
		let violations = self.violations();

		if violations.is_empty() {
			Ok(())
		} else {
			Err(ConfigError::InvalidOptions { violations })
		}
	}
}

/// Options for the resource-owner password strategy.
#[derive(Clone, Default)]
pub struct PasswordOptions {
	/// Shared handler options.
	pub handler: TokenHandlerOptions,
	/// Fetch-time credentials source; required.
	pub user_credentials_retriever: Option<Arc<dyn UserCredentialsRetriever>>,
}
impl PasswordOptions {
	/// Wraps the shared handler options.
	pub fn new(handler: TokenHandlerOptions) -> Self {
		Self { handler, user_credentials_retriever: None }
	}

	/// Sets the fetch-time credentials source.
	pub fn with_user_credentials_retriever(
		mut self,
		retriever: impl 'static + UserCredentialsRetriever,
	) -> Self {
		self.user_credentials_retriever = Some(Arc::new(retriever));

		self
	}

	/// Complete set of violated validation rules, in declared order.
	pub fn violations(&self) -> Vec<String> {
		let mut violations = self.handler.base_violations();

		if self.user_credentials_retriever.is_none() {
			violations.push("You must set UserCredentialsRetriever.".into());
		}

		violations
	}

	pub(crate) fn validate(&self) -> Result<Arc<dyn UserCredentialsRetriever>, ConfigError> {
		let violations = self.violations();

		match (violations.is_empty(), self.user_credentials_retriever.clone()) {
			(true, Some(retriever)) => Ok(retriever),
			_ => Err(ConfigError::InvalidOptions { violations }),
		}
	}
}
impl Debug for PasswordOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordOptions")
			.field("handler", &self.handler)
			.field("user_credentials_retriever_set", &self.user_credentials_retriever.is_some())
			.finish()
	}
}

/// Options for the refresh-token strategy.
#[derive(Clone, Default)]
pub struct RefreshTokenOptions {
	/// Shared handler options.
	pub handler: TokenHandlerOptions,
	/// Fetch-time refresh token source; required.
	pub refresh_token_retriever: Option<Arc<dyn RefreshTokenRetriever>>,
}
impl RefreshTokenOptions {
	/// Wraps the shared handler options.
	pub fn new(handler: TokenHandlerOptions) -> Self {
		Self { handler, refresh_token_retriever: None }
	}

	/// Sets the fetch-time refresh token source.
	pub fn with_refresh_token_retriever(
		mut self,
		retriever: impl 'static + RefreshTokenRetriever,
	) -> Self {
		self.refresh_token_retriever = Some(Arc::new(retriever));

		self
	}

	/// Complete set of violated validation rules, in declared order.
	pub fn violations(&self) -> Vec<String> {
		let mut violations = self.handler.base_violations();

		if self.refresh_token_retriever.is_none() {
			violations.push("You must set RefreshTokenRetriever.".into());
		}

		violations
	}

	pub(crate) fn validate(&self) -> Result<Arc<dyn RefreshTokenRetriever>, ConfigError> {
		let violations = self.violations();

		match (violations.is_empty(), self.refresh_token_retriever.clone()) {
			(true, Some(retriever)) => Ok(retriever),
			_ => Err(ConfigError::InvalidOptions { violations }),
		}
	}
}
impl Debug for RefreshTokenOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshTokenOptions")
			.field("handler", &self.handler)
			.field("refresh_token_retriever_set", &self.refresh_token_retriever.is_some())
			.finish()
	}
}

/// Options for the delegation (token exchange) strategy.
#[derive(Clone, Default)]
pub struct DelegationOptions {
	/// Shared handler options.
	pub handler: TokenHandlerOptions,
	/// Source for the caller's inbound bearer token; required.
	pub inbound_token_retriever: Option<Arc<dyn InboundTokenRetriever>>,
}
impl DelegationOptions {
	/// Wraps the shared handler options.
	pub fn new(handler: TokenHandlerOptions) -> Self {
		Self { handler, inbound_token_retriever: None }
	}

	/// Sets the inbound token source.
	pub fn with_inbound_token_retriever(
		mut self,
		retriever: impl 'static + InboundTokenRetriever,
	) -> Self {
		self.inbound_token_retriever = Some(Arc::new(retriever));

		self
	}

	/// Complete set of violated validation rules, in declared order.
	pub fn violations(&self) -> Vec<String> {
		let mut violations = self.handler.base_violations();

		if self.inbound_token_retriever.is_none() {
			violations.push("You must set InboundTokenRetriever.".into());
		}

		violations
	}

	pub(crate) fn validate(&self) -> Result<Arc<dyn InboundTokenRetriever>, ConfigError> {
		let violations = self.violations();

		match (violations.is_empty(), self.inbound_token_retriever.clone()) {
			(true, Some(retriever)) => Ok(retriever),
			_ => Err(ConfigError::InvalidOptions { violations }),
		}
	}
}
impl Debug for DelegationOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DelegationOptions")
			.field("handler", &self.handler)
			.field("inbound_token_retriever_set", &self.inbound_token_retriever.is_some())
			.finish()
	}
}
