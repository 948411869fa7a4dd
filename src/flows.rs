//! Login flows driven by the [`Authenticator`]: the authorize redirect, the callback, and the
//! refresh token exchange.

pub mod authorize;
pub mod callback;
pub mod refresh;

mod common;

pub use authorize::*;
pub use callback::*;

// self
use crate::{
	_prelude::*,
	config::AuthOptions,
	http::ProviderHttpClient,
	oauth::{ClientFacade, TransportErrorMapper},
	provider::{ProviderDescriptor, ProviderStrategy},
};
#[cfg(feature = "reqwest")]
use crate::{
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{TiktokStrategy, tiktok},
};

#[cfg(feature = "reqwest")]
/// Authenticator specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthenticator = Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs the login flows against a single provider descriptor.
///
/// The authenticator owns the HTTP client, the descriptor, the strategy that rewrites
/// parameters, and the client credentials. It keeps no per-login state: the
/// [`AuthorizationSession`] returned by [`start_authorization`](Self::start_authorization) is
/// handed back by the host on the callback.
#[derive(Clone)]
pub struct Authenticator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for the token exchange and the user-info fetch.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor defining endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy applying the provider's parameter rewrites and error parsing.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier (TikTok's client key).
	pub client_id: String,
	/// Client secret used for token endpoint authentication.
	pub client_secret: Option<String>,
	/// Host options.
	pub options: AuthOptions,
}
impl<C, M> Authenticator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an authenticator that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy,
			client_id: client_id.into(),
			client_secret: None,
			options: AuthOptions::default(),
		}
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Replaces the host options.
	pub fn with_options(mut self, options: AuthOptions) -> Self {
		self.options = options;

		self
	}

	/// Redirect URI for this host: `options.callback_url`, or `full_host`'s origin followed by
	/// `script_name` and `options.callback_path`.
	pub fn callback_url(&self, full_host: &Url, script_name: &str) -> Result<Url> {
		self.options.resolve_callback_url(full_host, script_name)
	}

	pub(crate) fn facade(&self, token_url: &Url) -> Result<ClientFacade<C, M>> {
		ClientFacade::from_descriptor(
			&self.descriptor,
			token_url,
			&self.client_id,
			self.client_secret.as_deref(),
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)
	}
}
#[cfg(feature = "reqwest")]
impl Authenticator<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an authenticator for the provided descriptor backed by a redirect-free reqwest
	/// client.
	pub fn new(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
	) -> Result<Self> {
		Ok(Self::with_http_client(
			descriptor,
			strategy,
			client_id,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}

	/// Creates an authenticator wired to the stock TikTok descriptor and strategy.
	pub fn tiktok(client_key: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
		Ok(Self::new(tiktok::descriptor()?, Arc::new(TiktokStrategy), client_key)?
			.with_client_secret(client_secret))
	}
}
impl<C, M> Debug for Authenticator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("options", &self.options)
			.finish()
	}
}
