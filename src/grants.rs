//! Grant strategies sharing a common token-fetch contract.
//!
//! Each strategy builds the complete form parameter set for one OAuth 2.0
//! grant; the provider owns everything around it (caching, single-flight
//! guards, the POST itself, response parsing). Strategies invoke their
//! retriever capabilities at fetch time, never at configuration time, so
//! credentials and inbound tokens may rotate underneath a long-lived handler.

pub mod client_credentials;
pub mod delegation;
pub mod password;
pub mod refresh;

pub use client_credentials::*;
pub use delegation::*;
pub use password::*;
pub use refresh::*;

// self
use crate::{_prelude::*, token::AccessToken};

/// Boxed future returned by [`GrantFlow::form`].
pub type FlowFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Non-interactive grant kinds supported by the handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantKind {
	/// Client Credentials grant for app-only tokens.
	ClientCredentials,
	/// Resource Owner Password grant.
	Password,
	/// Refresh Token grant.
	RefreshToken,
	/// Delegation (token exchange) grant for acting on behalf of a caller.
	Delegation,
}
impl GrantKind {
	/// Returns the wire identifier used as the `grant_type` parameter.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantKind::ClientCredentials => "client_credentials",
			GrantKind::Password => "password",
			GrantKind::RefreshToken => "refresh_token",
			GrantKind::Delegation => "delegation",
		}
	}
}
impl Display for GrantKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Strategy contract implemented by the four grant variants.
pub trait GrantFlow: Send + Sync {
	/// The grant kind, used for cache keys and observability labels.
	fn kind(&self) -> GrantKind;

	/// Builds the complete form parameter set for one token exchange.
	///
	/// Invoked once per fetch, inside the single-flight guard; retrievers run
	/// here so their values are current at exchange time.
	fn form(&self) -> FlowFuture<'_, Vec<(String, String)>>;

	/// Observes each successfully fetched token.
	///
	/// The default implementation does nothing; the refresh strategy overrides
	/// the hook to rotate its stored refresh token.
	fn on_token(&self, _token: &AccessToken) {}
}
