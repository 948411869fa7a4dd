//! Internal OAuth client facade abstractions.

pub use oauth2;

mod token_response;

pub use token_response::*;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken,
	RequestTokenError, StandardRevocableToken, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse,
	},
	http::{
		Method, Request, StatusCode,
		header::{ACCEPT, AUTHORIZATION},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{
		ClientAuthMethod, GrantType, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

/// Endpoint label used when the token endpoint fails.
pub const TOKEN_ENDPOINT: &str = "token";
/// Endpoint label used when the user-info endpoint fails.
pub const USER_INFO_ENDPOINT: &str = "user_info";

type ConfiguredClient = Client<
	BasicErrorResponse,
	EnvelopedTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into adapter [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an adapter error.
	///
	/// `endpoint` is either [`TOKEN_ENDPOINT`] or [`USER_INFO_ENDPOINT`].
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		grant: GrantType,
		endpoint: &'static str,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_strategy: &dyn ProviderStrategy,
		_grant: GrantType,
		endpoint: &'static str,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				endpoint_failure(endpoint, meta, format!("HTTP client error: {message}")),
			_ => endpoint_failure(endpoint, meta, "HTTP client error".into()),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a, 'strategy, 'code, 'pkce, 'scope, 'redirect, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		pkce_verifier: Option<&'pkce str>,
		requested_scope: &'scope ScopeSet,
		redirect_uri: Option<&'redirect Url>,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenRecord>
	where
		'strategy: 'a,
		'code: 'a,
		'pkce: 'a,
		'scope: 'a,
		'redirect: 'a,
		'params: 'a;

	fn refresh_token<'a, 'strategy, 'refresh, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenRecord>
	where
		'strategy: 'a,
		'refresh: 'a,
		'params: 'a;

	fn fetch_user_info<'a, 'strategy, 'token>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		url: Url,
		access_token: &'token str,
	) -> FacadeFuture<'a, JsonValue>
	where
		'strategy: 'a,
		'token: 'a;
}

pub(crate) struct ClientFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> ClientFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Configures the `oauth2` client against `token_url`, which is either the descriptor's
	/// token endpoint or its dedicated refresh endpoint.
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		token_url: &Url,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(token_url.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client: ConfiguredClient = Client::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}
}
impl<C, M> OAuth2Facade for ClientFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'strategy, 'code, 'pkce, 'scope, 'redirect, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		pkce_verifier: Option<&'pkce str>,
		requested_scope: &'scope ScopeSet,
		redirect_uri: Option<&'redirect Url>,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenRecord>
	where
		'strategy: 'a,
		'code: 'a,
		'pkce: 'a,
		'scope: 'a,
		'redirect: 'a,
		'params: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request =
				self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			if let Some(verifier) = pkce_verifier {
				request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
			}
			if let Some(redirect_uri) = redirect_uri {
				let redirect_url = RedirectUrl::new(redirect_uri.to_string())
					.map_err(|source| ConfigError::InvalidRedirect { source })?;

				request = request.set_redirect_uri(Cow::Owned(redirect_url));
			}
			for (key, value) in extra_params {
				request = request.add_extra_param(key.as_str(), value.as_str());
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::AuthorizationCode,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;

			map_token_response(requested_scope, response)
		})
	}

	fn refresh_token<'a, 'strategy, 'refresh, 'params>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
		extra_params: &'params [(String, String)],
	) -> FacadeFuture<'a, TokenRecord>
	where
		'strategy: 'a,
		'refresh: 'a,
		'params: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

			for (key, value) in extra_params {
				request = request.add_extra_param(key.as_str(), value.as_str());
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::RefreshToken,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;
			let mut record = map_token_response(&ScopeSet::default(), response)?;

			// Providers may omit the rotated refresh token; the caller's token stays valid then.
			if record.refresh_token.is_none() {
				record.refresh_token = Some(TokenSecret::new(refresh_token));
			}

			Ok(record)
		})
	}

	fn fetch_user_info<'a, 'strategy, 'token>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		url: Url,
		access_token: &'token str,
	) -> FacadeFuture<'a, JsonValue>
	where
		'strategy: 'a,
		'token: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let request = Request::builder()
				.method(Method::GET)
				.uri(url.as_str())
				.header(AUTHORIZATION, format!("Bearer {access_token}"))
				.header(ACCEPT, "application/json")
				.body(Vec::new())
				.map_err(ConfigError::from)?;
			let response = instrumented.call(request).await.map_err(|err| {
				self.error_mapper.map_transport_error(
					strategy,
					GrantType::AuthorizationCode,
					USER_INFO_ENDPOINT,
					meta.take().as_ref(),
					err,
				)
			})?;
			let status = response.status();

			if status == StatusCode::UNAUTHORIZED {
				return Err(Error::InvalidGrant {
					reason: "user info endpoint rejected the access token".into(),
				});
			}
			if !status.is_success() {
				return Err(TransientError::UserInfoEndpoint {
					message: format!("HTTP {}", status.as_u16()),
					status: Some(status.as_u16()),
				}
				.into());
			}

			parse_user_info(response.body(), status.as_u16())
		})
	}
}

fn parse_user_info(body: &[u8], status: u16) -> Result<JsonValue> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(JsonValue::Object(JsonMap::new()));
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| TransientError::UserInfoParse { source, status: Some(status) }.into())
}

fn map_token_response(
	requested_scope: &ScopeSet,
	response: EnvelopedTokenResponse,
) -> Result<TokenRecord> {
	let scope = match response.scopes() {
		Some(scopes) =>
			ScopeSet::new(scopes.iter().map(|scope| scope.as_str())).map_err(ConfigError::from)?,
		None => requested_scope.clone(),
	};
	let mut builder = TokenRecord::builder(scope)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.params(response.params().clone());

	// A zero lifetime means the provider attached no expiry.
	if let Some(expires_in) = response.expires_in().filter(|expires_in| !expires_in.is_zero()) {
		let expires_in = i64::try_from(expires_in.as_secs())
			.map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		builder = builder.expires_in(Duration::seconds(expires_in));
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| ConfigError::from(err).into())
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => {
			let mut ctx = ProviderErrorContext::new(grant)
				.with_oauth_error(response.error().as_ref().to_string());

			if let Some(description) = response.error_description() {
				ctx = ctx.with_error_description(description.clone());
			}

			classify_context(strategy, ctx, meta_ref)
		},
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(strategy, grant, TOKEN_ENDPOINT, meta_ref, error),
		RequestTokenError::Parse(error, body) => match strategy.parse_error_body(grant, &body) {
			Some(ctx) => classify_context(strategy, ctx, meta_ref),
			// Unstructured error bodies still carry hints such as `invalid_grant`.
			None if !matches!(meta_status(meta_ref), Some(200..=299)) && !body.is_empty() => {
				let ctx = ProviderErrorContext::new(grant)
					.with_body_preview(String::from_utf8_lossy(&body).into_owned());

				classify_context(strategy, ctx, meta_ref)
			},
			None =>
				TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
					.into(),
		},
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn classify_context(
	strategy: &dyn ProviderStrategy,
	mut ctx: ProviderErrorContext,
	meta: Option<&ResponseMetadata>,
) -> Error {
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let reason = ctx.summary();

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message: reason,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	endpoint: &'static str,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::Timeout {
			endpoint,
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn endpoint_failure(endpoint: &'static str, meta: Option<&ResponseMetadata>, message: String) -> Error {
	if endpoint == USER_INFO_ENDPOINT {
		TransientError::UserInfoEndpoint { message, status: meta_status(meta) }.into()
	} else {
		TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into()
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
