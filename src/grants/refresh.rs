//! Refresh Token grant strategy with rotation discipline.
//!
//! The token endpoint may answer a refresh exchange with a replacement refresh
//! token. Once that happens the old secret is dead: the flow keeps the rotated
//! secret in-process and presents it on every later exchange instead of
//! consulting the configured retriever again.

// self
use crate::{
	_prelude::*,
	error::FetchError,
	grants::{FlowFuture, GrantFlow, GrantKind},
	options::{RefreshTokenOptions, RefreshTokenRetriever},
	token::{AccessToken, TokenSecret},
};

/// Builds `grant_type=refresh_token` exchanges and tracks rotated secrets.
pub struct RefreshTokenFlow {
	client_id: String,
	client_secret: TokenSecret,
	retriever: Arc<dyn RefreshTokenRetriever>,
	rotated: RwLock<Option<TokenSecret>>,
}
impl RefreshTokenFlow {
	/// Creates the flow from validated options and the resolved retriever.
	pub fn new(options: &RefreshTokenOptions, retriever: Arc<dyn RefreshTokenRetriever>) -> Self {
		Self {
			client_id: options.handler.client_id.clone(),
			client_secret: TokenSecret::new(options.handler.client_secret.clone()),
			retriever,
			rotated: RwLock::new(None),
		}
	}

	async fn current_refresh_token(&self) -> Result<String> {
		if let Some(secret) = self.rotated.read().clone() {
			return Ok(secret.expose().into());
		}

		self.retriever.retrieve().await.ok_or_else(|| FetchError::MissingRefreshToken.into())
	}
}
impl GrantFlow for RefreshTokenFlow {
	fn kind(&self) -> GrantKind {
		GrantKind::RefreshToken
	}

	fn form(&self) -> FlowFuture<'_, Vec<(String, String)>> {
		Box::pin(async move {
			let refresh_token = self.current_refresh_token().await?;

			Ok(vec![
				("grant_type".into(), GrantKind::RefreshToken.as_str().into()),
				("refresh_token".into(), refresh_token),
				("client_id".into(), self.client_id.clone()),
				("client_secret".into(), self.client_secret.expose().into()),
			])
		})
	}

	fn on_token(&self, token: &AccessToken) {
		if let Some(refresh) = &token.refresh_token {
			*self.rotated.write() = Some(refresh.clone());
		}
	}
}
impl Debug for RefreshTokenFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshTokenFlow")
			.field("client_id", &self.client_id)
			.field("rotated", &self.rotated.read().is_some())
			.finish()
	}
}
