//! Token cache contracts, key derivation, and the built-in memory backend.
//!
//! The cache service is a collaborator: backends implement [`TokenCache`] over
//! opaque serialized entries, while [`HandlerCache`] layers the token-aware
//! discipline on top — entry (de)serialization, the expiry safety skew, and a
//! first-class disabled variant so the no-cache path is an explicit state
//! rather than a null check.

pub mod memory;

pub use memory::MemoryTokenCache;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, grants::GrantKind, options::TokenHandlerOptions, token::AccessToken};

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Margin subtracted from a token's expiry so a cached token is never served
/// close enough to expiry to die mid-flight.
const EXPIRY_SKEW: Duration = Duration::seconds(30);

/// Storage contract implemented by token cache backends.
///
/// Entries are opaque byte payloads so external key-value services can be
/// wired in without knowing the token shape. All operations must be safe under
/// concurrent use.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Fetches the entry stored under `key`, if present and within its TTL.
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<Vec<u8>>>;

	/// Stores `entry` under `key` for at most `ttl`.
	fn set<'a>(&'a self, key: &'a CacheKey, entry: Vec<u8>, ttl: Duration) -> CacheFuture<'a, ()>;

	/// Removes the entry stored under `key`, if any.
	fn remove<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`TokenCache`] implementations and entry codecs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Entry (de)serialization failure.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the cache service.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Deterministic identifier for a cached token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);
impl CacheKey {
	/// Wraps an explicit cache key override.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Derives the default key from the grant kind, client identity, and scope.
	///
	/// The scope contributes as an unpadded base64 SHA-256 fingerprint so keys
	/// stay bounded regardless of scope-list length.
	pub fn derive(grant: GrantKind, client_id: &str, scope: &str) -> Self {
		let fingerprint = STANDARD_NO_PAD.encode(Sha256::digest(scope.as_bytes()));

		Self(format!("{}:{client_id}:{fingerprint}", grant.as_str()))
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Cache state resolved for one handler instance.
///
/// Either a shared [`TokenCache`] backend or an explicit no-op; with caching
/// disabled every fetch is a live grant exchange.
#[derive(Clone)]
pub enum HandlerCache {
	/// Caching is enabled and backed by the wrapped service.
	Enabled(Arc<dyn TokenCache>),
	/// Caching is disabled; get/store/remove are no-ops.
	Disabled,
}
impl HandlerCache {
	/// Resolves the cache state from the options and the optionally supplied service.
	///
	/// Fails when caching is enabled but no service was provided; this check
	/// belongs to construction rather than pure options validation because it
	/// depends on external wiring.
	pub fn resolve(
		options: &TokenHandlerOptions,
		cache: Option<Arc<dyn TokenCache>>,
	) -> Result<Self, crate::error::ConfigError> {
		if !options.enable_caching {
			return Ok(Self::Disabled);
		}

		cache.map(Self::Enabled).ok_or(crate::error::ConfigError::CachingUnavailable)
	}

	/// Returns the cached token under `key` if it stays valid past the safety skew.
	///
	/// A stored token whose adjusted expiry (`expires_at` minus the skew) has
	/// passed is treated as a miss even if the backend still holds it.
	pub async fn get(&self, key: &CacheKey, now: OffsetDateTime) -> Result<Option<AccessToken>> {
		let Self::Enabled(cache) = self else {
			return Ok(None);
		};
		let Some(entry) = cache.get(key).await? else {
			return Ok(None);
		};
		let token = decode_entry(&entry)?;

		if token.remaining_lifetime(now) <= EXPIRY_SKEW {
			return Ok(None);
		}

		Ok(Some(token))
	}

	/// Stores `token` under `key` with a TTL of its remaining lifetime minus the skew.
	///
	/// Tokens whose whole lifetime is inside the skew are not cached at all.
	pub async fn store(
		&self,
		key: &CacheKey,
		token: &AccessToken,
		now: OffsetDateTime,
	) -> Result<()> {
		let Self::Enabled(cache) = self else {
			return Ok(());
		};
		let ttl = token.remaining_lifetime(now) - EXPIRY_SKEW;

		if !ttl.is_positive() {
			return Ok(());
		}

		cache.set(key, encode_entry(token)?, ttl).await?;

		Ok(())
	}

	/// Removes the entry under `key`, if caching is enabled.
	pub async fn remove(&self, key: &CacheKey) -> Result<()> {
		let Self::Enabled(cache) = self else {
			return Ok(());
		};

		cache.remove(key).await?;

		Ok(())
	}
}
impl Debug for HandlerCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Enabled(_) => f.write_str("HandlerCache::Enabled(..)"),
			Self::Disabled => f.write_str("HandlerCache::Disabled"),
		}
	}
}

fn encode_entry(token: &AccessToken) -> Result<Vec<u8>, CacheError> {
	serde_json::to_vec(token)
		.map_err(|err| CacheError::Serialization { message: err.to_string() })
}

fn decode_entry(entry: &[u8]) -> Result<AccessToken, CacheError> {
	serde_json::from_slice(entry)
		.map_err(|err| CacheError::Serialization { message: err.to_string() })
}
