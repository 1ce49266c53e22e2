//! Resource Owner Password grant strategy.

// self
use crate::{
	_prelude::*,
	grants::{FlowFuture, GrantFlow, GrantKind},
	options::{PasswordOptions, UserCredentialsRetriever},
	token::TokenSecret,
};

/// Builds `grant_type=password` exchanges from fetch-time user credentials.
pub struct PasswordFlow {
	client_id: String,
	client_secret: TokenSecret,
	scope: String,
	retriever: Arc<dyn UserCredentialsRetriever>,
}
impl PasswordFlow {
	/// Creates the flow from validated options and the resolved retriever.
	pub fn new(options: &PasswordOptions, retriever: Arc<dyn UserCredentialsRetriever>) -> Self {
		Self {
			client_id: options.handler.client_id.clone(),
			client_secret: TokenSecret::new(options.handler.client_secret.clone()),
			scope: options.handler.scope.clone(),
			retriever,
		}
	}
}
impl GrantFlow for PasswordFlow {
	fn kind(&self) -> GrantKind {
		GrantKind::Password
	}

	fn form(&self) -> FlowFuture<'_, Vec<(String, String)>> {
		Box::pin(async move {
			let credentials = self.retriever.retrieve().await;

			Ok(vec![
				("grant_type".into(), GrantKind::Password.as_str().into()),
				("username".into(), credentials.username),
				("password".into(), credentials.password),
				("client_id".into(), self.client_id.clone()),
				("client_secret".into(), self.client_secret.expose().into()),
				("scope".into(), self.scope.clone()),
			])
		})
	}
}
impl Debug for PasswordFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordFlow")
			.field("client_id", &self.client_id)
			.field("scope", &self.scope)
			.finish()
	}
}
