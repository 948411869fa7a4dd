//! Stock TikTok descriptor and the strategy that speaks TikTok's dialect of OAuth 2.0.
//!
//! TikTok deviates from RFC 6749 in three places the adapter has to paper over:
//!
//! - the client identifier travels as `client_key`, both on the authorize redirect and in the
//!   token request;
//! - the token endpoint wraps its payload in a `data` object and reports failures as a
//!   `data.error_code`/`data.description` pair, usually with a 200 status;
//! - scopes are comma-delimited.

// std
use std::collections::BTreeMap;
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
	error::ConfigError,
	provider::{
		ClientAuthMethod, DefaultProviderStrategy, GrantType, ProviderDescriptor,
		ProviderErrorContext, ProviderErrorKind, ProviderQuirks, ProviderStrategy,
		strategy::rfc_error_context,
	},
};

/// Provider name used as the descriptor id and the auth hash `provider` field.
pub const NAME: &str = "tiktok";
/// Base site of the legacy open API.
pub const SITE: &str = "https://open-api.tiktok.com";
/// Authorization endpoint the end-user is redirected to.
pub const AUTHORIZE_URL: &str = "https://www.tiktok.com/auth/authorize";
/// Token endpoint for the authorization code exchange.
pub const TOKEN_URL: &str = "https://open-api.tiktok.com/oauth/access_token";
/// Token endpoint for `grant_type=refresh_token`.
pub const REFRESH_URL: &str = "https://open-api.tiktok.com/oauth/refresh_token/";
/// User-info endpoint with the profile fields the adapter asks for.
pub const USER_INFO_URL: &str = "https://open.tiktokapis.com/v2/user/info/?fields=open_id,union_id,avatar_url,display_name,is_verified,follower_count,following_count,likes_count";
/// Scope requested when the host does not name one.
pub const DEFAULT_SCOPE: &str = "user.info.basic,video.list";
/// Query/form key TikTok expects in place of `client_id`.
pub const CLIENT_KEY_PARAM: &str = "client_key";
/// Delimiter TikTok uses between scopes.
pub const SCOPE_DELIMITER: char = ',';

/// Builds the stock TikTok descriptor.
pub fn descriptor() -> Result<ProviderDescriptor> {
	let parse =
		|raw: &str| Url::parse(raw).map_err(|source| ConfigError::InvalidDescriptor { source });
	let id = ProviderId::new(NAME).map_err(ConfigError::from)?;
	let descriptor = ProviderDescriptor::builder(id)
		.authorization_endpoint(parse(AUTHORIZE_URL)?)
		.token_endpoint(parse(TOKEN_URL)?)
		.refresh_endpoint(parse(REFRESH_URL)?)
		.user_info_endpoint(parse(USER_INFO_URL)?)
		.default_scope(ScopeSet::parse(DEFAULT_SCOPE, SCOPE_DELIMITER).map_err(ConfigError::from)?)
		.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretBasic)
		.quirks(quirks())
		.build()
		.map_err(ConfigError::from)?;

	Ok(descriptor)
}

/// Quirks applied by the stock descriptor.
pub fn quirks() -> ProviderQuirks {
	ProviderQuirks {
		pkce_required: false,
		scope_delimiter: SCOPE_DELIMITER,
		secret_in_token_body: true,
		redirect_uri_in_token_request: false,
	}
}

/// Strategy implementing TikTok's parameter renames and error envelope.
#[derive(Debug, Default)]
pub struct TiktokStrategy;
impl Display for TiktokStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("tiktok-provider-strategy")
	}
}
impl ProviderStrategy for TiktokStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		let kind = DefaultProviderStrategy.classify_token_error(ctx);
		let envelope_on_success =
			matches!(ctx.http_status, Some(200..=299)) && ctx.oauth_error.is_some();

		// A 2xx carrying an error envelope is a rejected code, not an outage.
		if envelope_on_success && kind == ProviderErrorKind::Transient {
			ProviderErrorKind::InvalidGrant
		} else {
			kind
		}
	}

	fn augment_authorize_params(&self, params: &mut BTreeMap<String, String>) {
		params.entry("scope".into()).or_insert_with(|| DEFAULT_SCOPE.into());
		params.insert("response_type".into(), "code".into());
		rename_client_id(params);
	}

	fn augment_token_request(&self, _grant: GrantType, form: &mut BTreeMap<String, String>) {
		rename_client_id(form);
	}

	fn parse_error_body(&self, grant: GrantType, body: &[u8]) -> Option<ProviderErrorContext> {
		let value = serde_json::from_slice::<JsonValue>(body).ok()?;

		envelope_error_context(grant, &value).or_else(|| rfc_error_context(grant, &value))
	}
}

fn rename_client_id(params: &mut BTreeMap<String, String>) {
	if let Some(client_id) = params.remove("client_id") {
		params.insert(CLIENT_KEY_PARAM.into(), client_id);
	}
}

fn envelope_error_context(grant: GrantType, value: &JsonValue) -> Option<ProviderErrorContext> {
	let data = value.get("data")?;
	let code = match data.get("error_code")? {
		JsonValue::Number(code) if code.as_i64() == Some(0) => return None,
		JsonValue::Number(code) => code.to_string(),
		JsonValue::String(code) if !code.is_empty() => code.clone(),
		_ => return None,
	};
	let mut ctx = ProviderErrorContext::new(grant).with_oauth_error(code);

	if let Some(description) = data.get("description").and_then(JsonValue::as_str) {
		ctx = ctx.with_error_description(description);
	}

	Some(ctx)
}
