//! Access token value objects and token-endpoint wire parsing.

// crates.io
use http::StatusCode;
// self
use crate::{_prelude::*, error::FetchError};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Immutable access token produced by a successful grant exchange.
///
/// A token is created once from the token endpoint response (the relative
/// `expires_in` is converted to an absolute instant at receipt time) and is
/// superseded by the next successful fetch, never mutated. The struct is
/// serializable so cache backends can persist it as an opaque entry.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type reported by the endpoint, usually `Bearer`.
	pub token_type: Option<String>,
	/// Refresh token secret, if the endpoint issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry instant derived from `expires_in` at receipt time.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Remaining lifetime relative to the provided instant; negative once expired.
	pub fn remaining_lifetime(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[derive(Deserialize)]
struct WireTokenResponse {
	access_token: Option<String>,
	token_type: Option<String>,
	expires_in: Option<i64>,
	refresh_token: Option<String>,
}

#[derive(Default, Deserialize)]
struct WireErrorResponse {
	error: Option<String>,
	error_description: Option<String>,
}

/// Parses a token endpoint response body into an [`AccessToken`].
///
/// Non-success statuses fold the OAuth `error`/`error_description` payload into
/// the fetch error message; success bodies must carry `access_token` and a
/// positive `expires_in`.
pub(crate) fn parse_token_response(
	status: StatusCode,
	body: &[u8],
	received_at: OffsetDateTime,
) -> Result<AccessToken> {
	if !status.is_success() {
		return Err(token_endpoint_error(status, body).into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let wire: WireTokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| FetchError::ResponseParse { source, status: status.as_u16() })?;
	let access_token = match wire.access_token {
		Some(value) if !value.is_empty() => value,
		_ => return Err(FetchError::MissingAccessToken.into()),
	};
	let expires_in = wire.expires_in.ok_or(FetchError::MissingExpiresIn)?;

	if expires_in <= 0 {
		return Err(FetchError::NonPositiveExpiresIn.into());
	}

	let expires_at = received_at
		.checked_add(Duration::seconds(expires_in))
		.ok_or(FetchError::ExpiresInOutOfRange)?;

	Ok(AccessToken {
		access_token: TokenSecret::new(access_token),
		token_type: wire.token_type,
		refresh_token: wire.refresh_token.map(TokenSecret::new),
		expires_at,
	})
}

fn token_endpoint_error(status: StatusCode, body: &[u8]) -> FetchError {
	let wire: WireErrorResponse = serde_json::from_slice(body).unwrap_or_default();
	let message = match (wire.error_description, wire.error) {
		(Some(description), _) => format!("Token endpoint returned an OAuth error: {description}"),
		(None, Some(code)) => format!("Token endpoint returned an OAuth error: {code}"),
		(None, None) => format!("Token endpoint returned status {status}"),
	};

	FetchError::TokenEndpoint { message, status: status.as_u16() }
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::error::Error;

	const RECEIVED_AT: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

	#[test]
	fn success_response_converts_relative_expiry() {
		let body = br#"{"access_token":"token-1","token_type":"Bearer","expires_in":1800}"#;
		let token = parse_token_response(StatusCode::OK, body, RECEIVED_AT)
			.expect("Well-formed token response should parse.");

		assert_eq!(token.access_token.expose(), "token-1");
		assert_eq!(token.token_type.as_deref(), Some("Bearer"));
		assert!(token.refresh_token.is_none());
		assert_eq!(token.expires_at, macros::datetime!(2025-01-01 00:30 UTC));
	}

	#[test]
	fn success_response_carries_refresh_token() {
		let body = br#"{"access_token":"token-1","expires_in":60,"refresh_token":"refresh-1"}"#;
		let token = parse_token_response(StatusCode::OK, body, RECEIVED_AT)
			.expect("Token response with refresh token should parse.");

		assert_eq!(
			token.refresh_token.as_ref().map(TokenSecret::expose),
			Some("refresh-1"),
		);
	}

	#[test]
	fn missing_fields_map_to_fetch_errors() {
		let missing_token = parse_token_response(StatusCode::OK, br#"{"expires_in":60}"#, RECEIVED_AT)
			.expect_err("Missing access_token should be rejected.");

		assert!(matches!(missing_token, Error::Fetch(FetchError::MissingAccessToken)));

		let missing_expiry =
			parse_token_response(StatusCode::OK, br#"{"access_token":"t"}"#, RECEIVED_AT)
				.expect_err("Missing expires_in should be rejected.");

		assert!(matches!(missing_expiry, Error::Fetch(FetchError::MissingExpiresIn)));

		let non_positive = parse_token_response(
			StatusCode::OK,
			br#"{"access_token":"t","expires_in":0}"#,
			RECEIVED_AT,
		)
		.expect_err("Non-positive expires_in should be rejected.");

		assert!(matches!(non_positive, Error::Fetch(FetchError::NonPositiveExpiresIn)));
	}

	#[test]
	fn oauth_error_body_folds_into_message() {
		let err = parse_token_response(
			StatusCode::BAD_REQUEST,
			br#"{"error":"invalid_grant","error_description":"grant expired"}"#,
			RECEIVED_AT,
		)
		.expect_err("Non-success status should be rejected.");

		match err {
			Error::Fetch(FetchError::TokenEndpoint { message, status }) => {
				assert_eq!(status, 400);
				assert!(message.contains("grant expired"));
			},
			other => panic!("Expected a token endpoint error, got {other:?}."),
		}
	}

	#[test]
	fn non_json_error_body_reports_status() {
		let err = parse_token_response(StatusCode::SERVICE_UNAVAILABLE, b"upstream down", RECEIVED_AT)
			.expect_err("Non-success status should be rejected.");

		match err {
			Error::Fetch(FetchError::TokenEndpoint { message, status }) => {
				assert_eq!(status, 503);
				assert!(message.contains("503"));
			},
			other => panic!("Expected a token endpoint error, got {other:?}."),
		}
	}

	#[test]
	fn malformed_success_body_reports_parse_path() {
		let err = parse_token_response(StatusCode::OK, br#"{"access_token":7}"#, RECEIVED_AT)
			.expect_err("Malformed JSON should be rejected.");

		assert!(matches!(err, Error::Fetch(FetchError::ResponseParse { status: 200, .. })));
	}

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");

		let token = AccessToken {
			access_token: secret,
			token_type: Some("Bearer".into()),
			refresh_token: Some(TokenSecret::new("refresh")),
			expires_at: RECEIVED_AT,
		};
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("super-secret"));
		assert!(!rendered.contains("refresh"));
	}
}
