//! Provider strategy hooks that rewrite outgoing parameters and classify token errors.
//!
//! Implementations work on plain `BTreeMap`s and primitive error contexts so flows stay
//! independent of any particular HTTP client.

// std
use std::collections::BTreeMap;
// self
use crate::{_prelude::*, provider::descriptor::GrantType};

/// Strategy hook that allows providers to rewrite requests and classify errors.
///
/// Implementors are required to be `Send + Sync`. Override only what you need; both
/// parameter hooks default to no-ops, which suits RFC 6749-compliant providers.
pub trait ProviderStrategy: Send + Sync {
	/// Maps low-level HTTP/JSON errors into the crate taxonomy for a token request.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Rewrites the authorize URL query parameters before the redirect is built.
	///
	/// The map arrives seeded with `response_type`, `client_id`, `redirect_uri`, `state`,
	/// and the optional `scope`, `display`, `auth_type`, and PKCE fields.
	fn augment_authorize_params(&self, _params: &mut BTreeMap<String, String>) {}

	/// Rewrites the token request form before dispatching.
	///
	/// The map arrives seeded with `grant_type`, `client_id`, and (when the descriptor asks
	/// for it) `client_secret`. `grant_type` and `client_id` are owned by the OAuth client
	/// and never forwarded as extra parameters; every other entry is.
	fn augment_token_request(&self, _grant: GrantType, _form: &mut BTreeMap<String, String>) {}

	/// Extracts structured error fields from a token response body the OAuth client could not
	/// parse as a token.
	///
	/// The default implementation understands the RFC 6749 `error`/`error_description`
	/// object.
	fn parse_error_body(&self, grant: GrantType, body: &[u8]) -> Option<ProviderErrorContext> {
		let value = serde_json::from_slice::<JsonValue>(body).ok()?;

		rfc_error_context(grant, &value)
	}
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization grant (bad code/refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the token covers.
	InsufficientScope,
	/// Failure is temporary and should be retried.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
///
/// Only primitive data (status codes, OAuth fields, body preview) is kept so strategies
/// stay decoupled from the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field (or provider error code).
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			body_preview: None,
		}
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}

	/// Human-readable summary used in error messages.
	pub fn summary(&self) -> String {
		match (self.oauth_error.as_deref(), self.error_description.as_deref()) {
			(_, Some(description)) if !description.is_empty() => description.to_owned(),
			(Some(error), _) => error.to_owned(),
			_ => self.body_preview.clone().unwrap_or_else(|| "no details".into()),
		}
	}
}

/// Default strategy that applies RFC-guided heuristics.
///
/// It prioritizes structured OAuth fields (`error`, `error_description`), then
/// falls back to body text hints, and finally the HTTP status code.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) =
			classify_oauth_error(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
		{
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

/// Reads an RFC 6749 error object (`error`, `error_description`) from a JSON value.
pub(crate) fn rfc_error_context(grant: GrantType, value: &JsonValue) -> Option<ProviderErrorContext> {
	let error = value.get("error")?.as_str()?;
	let mut ctx = ProviderErrorContext::new(grant).with_oauth_error(error);

	if let Some(description) = value.get("error_description").and_then(JsonValue::as_str) {
		ctx = ctx.with_error_description(description);
	}

	Some(ctx)
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= ProviderErrorContext::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ProviderErrorKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| classify_body(error_description))
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ProviderErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let body = body?;
	let lowered = body.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}
