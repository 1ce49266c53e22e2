//! Non-interactive OIDC token handlers—decorate outbound HTTP clients with bearer tokens
//! minted through client-credentials, password, refresh-token, and delegation grants,
//! backed by cached, single-flight token acquisition.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod error;
pub mod grants;
pub mod handler;
pub mod http;
pub mod obs;
pub mod options;
pub mod provider;
pub mod token;

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
