//! Host-facing options for the login flows.
//!
//! [`AuthOptions`] deserializes with defaults from any serde format, so hosts can keep it next
//! to the rest of their configuration:
//!
//! ```
//! use tiktok_oauth2::config::AuthOptions;
//!
//! let options: AuthOptions =
//! 	serde_json::from_str(r#"{"scope":"user.info.basic","skip_info":true}"#).unwrap();
//!
//! assert_eq!(options.callback_path, "/auth/tiktok/callback");
//! assert!(options.skip_info);
//! ```

// std
use std::borrow::Cow;
// self
use crate::{_prelude::*, error::ConfigError};

/// Path appended to the host when no callback URL is configured.
pub const DEFAULT_CALLBACK_PATH: &str = "/auth/tiktok/callback";

/// Options shaping the authorize redirect and the callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthOptions {
	/// Absolute callback URL; overrides `callback_path` resolution when set.
	pub callback_url: Option<Url>,
	/// Callback path joined onto the host and script name.
	pub callback_path: String,
	/// Scope requested when the request does not override it.
	pub scope: Option<String>,
	/// TikTok `display` hint forwarded to the authorize URL.
	pub display: Option<String>,
	/// TikTok `auth_type` hint forwarded to the authorize URL.
	pub auth_type: Option<String>,
	/// Skips `extra.raw_info` in the auth hash.
	pub skip_info: bool,
	/// Disables the `state` check on the callback.
	pub provider_ignores_state: bool,
	/// Sends a PKCE (S256) challenge even if the descriptor does not require one.
	pub pkce: bool,
}
impl AuthOptions {
	/// Sets an absolute callback URL.
	pub fn with_callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Sets the callback path used when no absolute URL is configured.
	pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
		self.callback_path = path.into();

		self
	}

	/// Sets the default scope string (comma- or space-delimited).
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the `display` hint.
	pub fn with_display(mut self, display: impl Into<String>) -> Self {
		self.display = Some(display.into());

		self
	}

	/// Sets the `auth_type` hint.
	pub fn with_auth_type(mut self, auth_type: impl Into<String>) -> Self {
		self.auth_type = Some(auth_type.into());

		self
	}

	/// Toggles `extra.raw_info`.
	pub fn with_skip_info(mut self, skip: bool) -> Self {
		self.skip_info = skip;

		self
	}

	/// Toggles the callback `state` check.
	pub fn with_provider_ignores_state(mut self, ignore: bool) -> Self {
		self.provider_ignores_state = ignore;

		self
	}

	/// Toggles PKCE.
	pub fn with_pkce(mut self, pkce: bool) -> Self {
		self.pkce = pkce;

		self
	}

	/// Resolves the redirect URI: the configured `callback_url`, or the origin of `full_host`
	/// followed by `script_name` and `callback_path`.
	pub fn resolve_callback_url(&self, full_host: &Url, script_name: &str) -> Result<Url> {
		if let Some(url) = &self.callback_url {
			return Ok(url.clone());
		}

		let origin = full_host.origin().ascii_serialization();
		let script_name = script_name.trim_end_matches('/');
		let path = if self.callback_path.starts_with('/') {
			Cow::Borrowed(self.callback_path.as_str())
		} else {
			Cow::Owned(format!("/{}", self.callback_path))
		};

		Url::parse(&format!("{origin}{script_name}{path}"))
			.map_err(|source| ConfigError::InvalidRedirect { source }.into())
	}
}
impl Default for AuthOptions {
	fn default() -> Self {
		Self {
			callback_url: None,
			callback_path: DEFAULT_CALLBACK_PATH.into(),
			scope: None,
			display: None,
			auth_type: None,
			skip_info: false,
			provider_ignores_state: false,
			pkce: false,
		}
	}
}
