//! TikTok login for Rust: a provider descriptor, the parameter rewrites TikTok expects, and a
//! normalizer that turns token + user-info responses into a canonical auth hash.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod provider;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::AuthOptions,
		flows::Authenticator,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{ProviderDescriptor, ProviderStrategy, TiktokStrategy},
	};

	/// Authenticator type alias used by reqwest-backed integration tests.
	pub type ReqwestTestAuthenticator = Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs an [`Authenticator`] backed by the TikTok strategy and the reqwest transport
	/// used across integration tests.
	pub fn build_reqwest_test_authenticator(
		descriptor: ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		options: AuthOptions,
	) -> ReqwestTestAuthenticator {
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(TiktokStrategy);
		let http_client = test_reqwest_http_client();
		let mapper = Arc::new(ReqwestTransportErrorMapper);

		Authenticator::with_http_client(descriptor, strategy, client_id, http_client, mapper)
			.with_client_secret(client_secret)
			.with_options(options)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, tokio as _};
