//! Token acquisition engine: cache-first fetches with single-flight guards.
//!
//! [`TokenProvider`] owns everything around a grant strategy — the cache
//! consultation, the per-key single-flight guard, the token endpoint POST, and
//! response parsing — so strategy implementations focus on grant-specific form
//! parameters. Concurrent callers for one cache key serialize on the guard;
//! waiters re-check the cache after acquiring it and reuse the winner's stored
//! token instead of issuing redundant exchanges. A failed exchange releases
//! the guard so a subsequent call may retry.

// std
use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	cache::{CacheKey, HandlerCache},
	grants::{GrantFlow, GrantKind},
	http::{RequestDispatcher, token_request},
	obs::{self, FetchOutcome, FetchSpan},
	token::{self, AccessToken},
};

type GuardMap = Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>;

/// Returns (and creates on demand) the process-wide singleflight guard for a cache key.
///
/// The registry spans handler instances, so two handlers configured with the
/// same cache key never overlap their exchanges either.
fn singleflight_guard(key: &CacheKey) -> Arc<AsyncMutex<()>> {
	static GUARDS: OnceLock<GuardMap> = OnceLock::new();

	let mut guards = GUARDS.get_or_init(Default::default).lock();

	guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Acquires access tokens for one configured grant strategy.
///
/// The provider consults the cache first, falls back to a live grant exchange
/// against the token endpoint, and stores the result under its cache key. The
/// authority-side HTTP client is deliberately separate from the decorated
/// client; routing exchanges through the decorated client would recurse into
/// the handler.
pub struct TokenProvider<C>
where
	C: ?Sized + RequestDispatcher,
{
	http_client: Arc<C>,
	flow: Arc<dyn GrantFlow>,
	token_endpoint: Url,
	cache: HandlerCache,
	cache_key: CacheKey,
}
impl<C> TokenProvider<C>
where
	C: ?Sized + RequestDispatcher,
{
	/// Creates a provider for the given strategy, endpoint, and cache state.
	pub fn new(
		http_client: impl Into<Arc<C>>,
		flow: Arc<dyn GrantFlow>,
		token_endpoint: Url,
		cache: HandlerCache,
		cache_key: CacheKey,
	) -> Self {
		Self { http_client: http_client.into(), flow, token_endpoint, cache, cache_key }
	}

	/// The grant kind served by this provider.
	pub fn grant(&self) -> GrantKind {
		self.flow.kind()
	}

	/// The cache key tokens are stored under.
	pub fn cache_key(&self) -> &CacheKey {
		&self.cache_key
	}

	/// Returns a valid access token, fetching one if the cache cannot serve it.
	///
	/// With `force` set the cache is bypassed (the fresh token still replaces
	/// the cached entry); the handler uses this for expired-token recovery
	/// after a downstream auth failure.
	pub async fn access_token(&self, force: bool) -> Result<AccessToken> {
		let kind = self.flow.kind();
		let span = FetchSpan::new(kind, "access_token");

		obs::record_fetch_outcome(kind, FetchOutcome::Attempt);

		let result = span.instrument(self.acquire(force)).await;

		match &result {
			Ok(_) => obs::record_fetch_outcome(kind, FetchOutcome::Success),
			Err(_) => obs::record_fetch_outcome(kind, FetchOutcome::Failure),
		}

		result
	}

	/// Drops the cached token for this provider's cache key.
	pub async fn invalidate(&self) -> Result<()> {
		self.cache.remove(&self.cache_key).await
	}

	async fn acquire(&self, force: bool) -> Result<AccessToken> {
		if !force {
			if let Some(hit) = self.cache.get(&self.cache_key, OffsetDateTime::now_utc()).await? {
				return Ok(hit);
			}
		}

		let guard = singleflight_guard(&self.cache_key);
		let _exchange_slot = guard.lock().await;

		if !force {
			if let Some(hit) = self.cache.get(&self.cache_key, OffsetDateTime::now_utc()).await? {
				return Ok(hit);
			}
		}

		let form = self.flow.form().await?;
		let request = token_request(&self.token_endpoint, &form)?;
		let response = self.http_client.dispatch(request).await?;
		let received_at = OffsetDateTime::now_utc();
		let token = token::parse_token_response(response.status(), response.body(), received_at)?;

		self.flow.on_token(&token);
		self.cache.store(&self.cache_key, &token, received_at).await?;

		Ok(token)
	}
}
impl<C> Debug for TokenProvider<C>
where
	C: ?Sized + RequestDispatcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("grant", &self.flow.kind())
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("cache_key", &self.cache_key)
			.field("cache", &self.cache)
			.finish()
	}
}
