//! Thread-safe in-memory [`TokenCache`] implementation for in-process sharing and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheFuture, CacheKey, TokenCache},
};

struct MemoryEntry {
	payload: Vec<u8>,
	deadline: OffsetDateTime,
}

type EntryMap = Arc<RwLock<HashMap<CacheKey, MemoryEntry>>>;

/// Thread-safe cache backend that keeps entries in-process.
///
/// Entries past their TTL deadline are reported as misses; they are evicted
/// lazily on the next `get` for the same key.
#[derive(Clone, Default)]
pub struct MemoryTokenCache(EntryMap);
impl MemoryTokenCache {
	fn get_now(map: EntryMap, key: CacheKey) -> Option<Vec<u8>> {
		let now = OffsetDateTime::now_utc();

		{
			let guard = map.read();

			match guard.get(&key) {
				Some(entry) if entry.deadline > now => return Some(entry.payload.clone()),
				Some(_) => (),
				None => return None,
			}
		}

		map.write().remove(&key);

		None
	}

	fn set_now(map: EntryMap, key: CacheKey, payload: Vec<u8>, ttl: Duration) {
		let deadline = OffsetDateTime::now_utc() + ttl;

		map.write().insert(key, MemoryEntry { payload, deadline });
	}

	fn remove_now(map: EntryMap, key: CacheKey) {
		map.write().remove(&key);
	}
}
impl TokenCache for MemoryTokenCache {
	fn get<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, Option<Vec<u8>>> {
		let map = self.0.clone();
		let key = key.clone();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn set<'a>(&'a self, key: &'a CacheKey, entry: Vec<u8>, ttl: Duration) -> CacheFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.clone();

		Box::pin(async move {
			Self::set_now(map, key, entry, ttl);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a CacheKey) -> CacheFuture<'a, ()> {
		let map = self.0.clone();
		let key = key.clone();

		Box::pin(async move {
			Self::remove_now(map, key);

			Ok(())
		})
	}
}
impl Debug for MemoryTokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryTokenCache").field("entries", &self.0.read().len()).finish()
	}
}
