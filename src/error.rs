//! Handler-level error types shared across options, grants, caches, and transports.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical handler error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache-layer failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem; fatal and never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Grant exchange failure at the token endpoint.
	#[error(transparent)]
	Fetch(#[from] FetchError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised at handler construction.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Aggregated options-validation failures, one violation per line.
	#[error("Options are not valid:\n\n{}", .violations.join("\n"))]
	InvalidOptions {
		/// Violation messages in declared-rule order.
		violations: Vec<String>,
	},
	/// Caching was requested but no cache service was supplied.
	#[error("Caching is enabled, but no TokenCache is found in the services collection.")]
	CachingUnavailable,
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// The token endpoint could not be derived from the authority URL.
	#[error("Token endpoint could not be derived from the authority.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Grant exchange failures surfaced through the request-result channel.
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or handler-supplied message summarizing the failure.
		message: String,
		/// HTTP status code returned by the token endpoint.
		status: u16,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the malformed response.
		status: u16,
	},
	/// Token endpoint response omitted `access_token`.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Token endpoint returned an `expires_in` outside the supported range.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// No refresh token is available for a refresh grant.
	#[error("No refresh token is available for the refresh_token grant.")]
	MissingRefreshToken,
	/// No inbound token is available for a delegation grant.
	#[error("No inbound token is available for the delegation grant.")]
	MissingInboundToken,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while dispatching the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while dispatching the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
