//! Delegation (token exchange) grant strategy.
//!
//! Trades the caller's inbound bearer token for a downstream-scoped token
//! minted on the caller's behalf. The exchange cannot proceed without a
//! subject token, so an absent inbound token fails the fetch.

// self
use crate::{
	_prelude::*,
	error::FetchError,
	grants::{FlowFuture, GrantFlow, GrantKind},
	options::{DelegationOptions, InboundTokenRetriever},
	token::TokenSecret,
};

/// Builds `grant_type=delegation` exchanges from the caller's inbound token.
pub struct DelegationFlow {
	client_id: String,
	client_secret: TokenSecret,
	scope: String,
	retriever: Arc<dyn InboundTokenRetriever>,
}
impl DelegationFlow {
	/// Creates the flow from validated options and the resolved retriever.
	pub fn new(options: &DelegationOptions, retriever: Arc<dyn InboundTokenRetriever>) -> Self {
		Self {
			client_id: options.handler.client_id.clone(),
			client_secret: TokenSecret::new(options.handler.client_secret.clone()),
			scope: options.handler.scope.clone(),
			retriever,
		}
	}
}
impl GrantFlow for DelegationFlow {
	fn kind(&self) -> GrantKind {
		GrantKind::Delegation
	}

	fn form(&self) -> FlowFuture<'_, Vec<(String, String)>> {
		Box::pin(async move {
			let inbound =
				self.retriever.retrieve().await.ok_or(FetchError::MissingInboundToken)?;

			Ok(vec![
				("grant_type".into(), GrantKind::Delegation.as_str().into()),
				("client_id".into(), self.client_id.clone()),
				("client_secret".into(), self.client_secret.expose().into()),
				("scope".into(), self.scope.clone()),
				("token".into(), inbound),
			])
		})
	}
}
impl Debug for DelegationFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DelegationFlow")
			.field("client_id", &self.client_id)
			.field("scope", &self.scope)
			.finish()
	}
}
