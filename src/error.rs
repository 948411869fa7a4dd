//! Adapter-level error types shared across flows, providers, and the profile normalizer.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical adapter error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The provider redirect carried an error or failed validation.
	#[error(transparent)]
	Callback(#[from] CallbackError),

	/// Requested scopes exceed what was granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or adapter-supplied reason string.
		reason: String,
	},
	/// Provider rejected the grant (e.g., bad code or refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or adapter-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or adapter-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns the login failure key a host application should surface for this error.
	///
	/// Keys follow the conventional strategy vocabulary: `csrf_detected`,
	/// `no_authorization_code`, the provider's own error code for denied consent,
	/// `timeout`, `failed_to_connect`, and `invalid_credentials` for everything else.
	pub fn failure_key(&self) -> &str {
		match self {
			Error::Callback(CallbackError::StateMismatch) => "csrf_detected",
			Error::Callback(CallbackError::MissingAuthorizationCode) => "no_authorization_code",
			Error::Callback(CallbackError::Provider { error, .. }) => error.as_str(),
			Error::Transient(TransientError::Timeout { .. }) => "timeout",
			Error::Transport(_) => "failed_to_connect",
			_ => "invalid_credentials",
		}
	}
}

/// Failures detected while validating the provider redirect, before any token exchange.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum CallbackError {
	/// The provider redirected back with an `error`/`error_reason` parameter.
	#[error("Provider returned an error on the callback: {error}.")]
	Provider {
		/// Error code (`error_reason` takes precedence over `error`).
		error: String,
		/// Optional human-readable description.
		description: Option<String>,
		/// Optional URI documenting the error.
		uri: Option<String>,
	},
	/// The returned `state` was missing or did not match the session.
	#[error("Authorization state is missing or does not match the session.")]
	StateMismatch,
	/// The callback did not carry an authorization code.
	#[error("No authorization code was present in the callback.")]
	MissingAuthorizationCode,
}

/// Configuration and validation failures raised by the adapter.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},

	/// Descriptor does not enable the requested grant.
	#[error("Descriptor `{descriptor}` does not enable the {grant} grant.")]
	UnsupportedGrant {
		/// Provider identifier string.
		descriptor: String,
		/// Disabled grant label.
		grant: &'static str,
	},
	/// Provider identifier failed validation.
	#[error("Provider identifier is invalid.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Request scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal token response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or adapter-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// User-info endpoint answered with a non-success status.
	#[error("User info endpoint returned an unexpected response: {message}.")]
	UserInfoEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// User-info endpoint responded with a body that is not JSON.
	#[error("User info endpoint returned malformed JSON.")]
	UserInfoParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Request timed out before the provider answered.
	#[error("Request timed out while calling the {endpoint} endpoint.")]
	Timeout {
		/// Endpoint label (`token` or `user_info`).
		endpoint: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn failure_keys_follow_strategy_vocabulary() {
		assert_eq!(Error::from(CallbackError::StateMismatch).failure_key(), "csrf_detected");
		assert_eq!(
			Error::from(CallbackError::MissingAuthorizationCode).failure_key(),
			"no_authorization_code"
		);
		assert_eq!(
			Error::from(CallbackError::Provider {
				error: "access_denied".into(),
				description: None,
				uri: None,
			})
			.failure_key(),
			"access_denied"
		);
		assert_eq!(
			Error::from(TransientError::Timeout { endpoint: "token", status: None }).failure_key(),
			"timeout"
		);
		assert_eq!(
			Error::from(TransportError::Io(std::io::Error::other("reset"))).failure_key(),
			"failed_to_connect"
		);
		assert_eq!(
			Error::InvalidGrant { reason: "expired".into() }.failure_key(),
			"invalid_credentials"
		);
	}
}
