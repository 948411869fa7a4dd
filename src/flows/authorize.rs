//! Request phase: state + optional PKCE generation and the authorize redirect URL.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	flows::{Authenticator, common},
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const STATE_LEN: usize = 48;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Per-request overrides for the authorize redirect; unset fields fall back to
/// [`AuthOptions`](crate::config::AuthOptions).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizeOverrides {
	/// Scope string (comma- or space-delimited).
	pub scope: Option<String>,
	/// TikTok `display` hint.
	pub display: Option<String>,
	/// TikTok `auth_type` hint.
	pub auth_type: Option<String>,
}
impl AuthorizeOverrides {
	/// Overrides the scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Overrides the `display` hint.
	pub fn display(mut self, display: impl Into<String>) -> Self {
		self.display = Some(display.into());

		self
	}

	/// Overrides the `auth_type` hint.
	pub fn auth_type(mut self, auth_type: impl Into<String>) -> Self {
		self.auth_type = Some(auth_type.into());

		self
	}
}

/// Handshake data produced by [`Authenticator::start_authorization`].
///
/// Hosts persist it (it is serde-serializable) between the redirect and the callback. The
/// PKCE verifier is secret and never shows up in `Debug` output.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizationSession {
	/// Scope requested on the authorize URL.
	pub scope: ScopeSet,
	/// Opaque state value that must round-trip via the redirect.
	pub state: String,
	/// Redirect URI placed on the authorize URL.
	pub redirect_uri: Url,
	/// Authorize URL the end-user should be sent to.
	pub authorize_url: Url,
	pkce: Option<PkcePair>,
}
impl AuthorizationSession {
	/// PKCE code challenge, when PKCE is in use.
	pub fn code_challenge(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.challenge.as_str())
	}

	/// PKCE challenge method, when PKCE is in use.
	pub fn code_challenge_method(&self) -> Option<PkceCodeChallengeMethod> {
		self.pkce.as_ref().map(|pkce| pkce.method)
	}

	/// Compares the returned `state` with the session's in constant time.
	pub fn state_matches(&self, returned: Option<&str>) -> bool {
		match returned {
			Some(returned) if !returned.is_empty() && returned.len() == self.state.len() =>
				returned.as_bytes().ct_eq(self.state.as_bytes()).into(),
			_ => false,
		}
	}

	pub(crate) fn pkce_verifier(&self) -> Option<&str> {
		self.pkce.as_ref().map(|pkce| pkce.verifier.as_str())
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.code_challenge())
			.field("code_challenge_method", &self.code_challenge_method())
			.finish()
	}
}

#[derive(Clone, Serialize, Deserialize)]
struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the authorize redirect for a new login.
	///
	/// Scope, `display`, and `auth_type` come from `overrides`, then from the host options,
	/// and the scope finally from the descriptor default. The strategy rewrites the query
	/// parameters last, which is where TikTok's `client_key` comes from.
	pub fn start_authorization(
		&self,
		redirect_uri: Url,
		overrides: AuthorizeOverrides,
	) -> Result<AuthorizationSession> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.in_scope(|| self.build_session(redirect_uri, overrides));

		obs::record_flow_outcome(KIND, span.record_result(&result));

		result
	}

	fn build_session(
		&self,
		redirect_uri: Url,
		overrides: AuthorizeOverrides,
	) -> Result<AuthorizationSession> {
		let scope = common::resolve_scope(
			&self.descriptor,
			[overrides.scope.as_deref(), self.options.scope.as_deref()],
		)?;
		let state = random_string(STATE_LEN);
		let pkce = (self.options.pkce || self.descriptor.quirks.pkce_required)
			.then(PkcePair::generate);
		let mut params = BTreeMap::new();

		params.insert("response_type".to_owned(), "code".to_owned());
		params.insert("client_id".to_owned(), self.client_id.clone());
		params.insert("redirect_uri".to_owned(), redirect_uri.to_string());
		params.insert("state".to_owned(), state.clone());

		if let Some(scope) = common::format_scope(&scope, self.descriptor.quirks.scope_delimiter) {
			params.insert("scope".to_owned(), scope);
		}
		if let Some(display) = overrides.display.or_else(|| self.options.display.clone()) {
			params.insert("display".to_owned(), display);
		}
		if let Some(auth_type) = overrides.auth_type.or_else(|| self.options.auth_type.clone()) {
			params.insert("auth_type".to_owned(), auth_type);
		}
		if let Some(pkce) = &pkce {
			params.insert("code_challenge".to_owned(), pkce.challenge.clone());
			params.insert("code_challenge_method".to_owned(), pkce.method.as_str().to_owned());
		}

		self.strategy.augment_authorize_params(&mut params);

		let mut authorize_url = self.descriptor.endpoints.authorization.clone();

		authorize_url.query_pairs_mut().extend_pairs(params.iter());

		Ok(AuthorizationSession { scope, state, redirect_uri, authorize_url, pkce })
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
