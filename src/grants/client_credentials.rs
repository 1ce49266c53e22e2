//! Client Credentials grant strategy.

// self
use crate::{
	_prelude::*,
	grants::{FlowFuture, GrantFlow, GrantKind},
	options::ClientCredentialsOptions,
	token::TokenSecret,
};

/// Builds `grant_type=client_credentials` exchanges for app-only tokens.
#[derive(Clone, Debug)]
pub struct ClientCredentialsFlow {
	client_id: String,
	client_secret: TokenSecret,
	scope: String,
}
impl ClientCredentialsFlow {
	/// Creates the flow from validated options.
	pub fn new(options: &ClientCredentialsOptions) -> Self {
		Self {
			client_id: options.handler.client_id.clone(),
			client_secret: TokenSecret::new(options.handler.client_secret.clone()),
			scope: options.handler.scope.clone(),
		}
	}
}
impl GrantFlow for ClientCredentialsFlow {
	fn kind(&self) -> GrantKind {
		GrantKind::ClientCredentials
	}

	fn form(&self) -> FlowFuture<'_, Vec<(String, String)>> {
		Box::pin(async move {
			Ok(vec![
				("grant_type".into(), GrantKind::ClientCredentials.as_str().into()),
				("client_id".into(), self.client_id.clone()),
				("client_secret".into(), self.client_secret.expose().into()),
				("scope".into(), self.scope.clone()),
			])
		})
	}
}
