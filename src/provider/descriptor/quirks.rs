// self
use crate::_prelude::*;

/// Provider-specific quirks that influence how flows shape their requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Indicates whether PKCE must be supplied even when the host did not ask for it.
	pub pkce_required: bool,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// Repeats `client_secret` in the token request body on top of the configured client
	/// authentication method.
	pub secret_in_token_body: bool,
	/// Sends `redirect_uri` with the authorization code exchange.
	pub redirect_uri_in_token_request: bool,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			pkce_required: false,
			scope_delimiter: ' ',
			secret_in_token_body: false,
			redirect_uri_in_token_request: true,
		}
	}
}
