//! `credentials` section of the auth hash: token, expiry, and refresh token lifetime.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
};

/// Token response parameter carrying the refresh token lifetime in seconds.
pub const REFRESH_EXPIRES_IN_PARAM: &str = "refresh_expires_in";

/// `credentials` section of the auth hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Access token.
	pub token: TokenSecret,
	/// Refresh token; only present when the access token expires.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Access token expiry as unix seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	/// Whether the access token expires.
	pub expires: bool,
	/// Refresh token expiry as unix seconds, computed from `refresh_expires_in`.
	pub refresh_token_expires_at: i64,
}

/// Projects a token record onto [`Credentials`] relative to `now`.
///
/// A missing or non-integer `refresh_expires_in` counts as zero, which makes
/// `refresh_token_expires_at` equal to `now`.
pub fn credentials(record: &TokenRecord, now: OffsetDateTime) -> Credentials {
	let expires = record.expires();
	let refresh_token = record.refresh_token.clone().filter(|_| expires);
	let refresh_expires_in = record.param_i64(REFRESH_EXPIRES_IN_PARAM).unwrap_or(0);

	Credentials {
		token: record.access_token.clone(),
		refresh_token,
		expires_at: record.expires_at.map(OffsetDateTime::unix_timestamp),
		expires,
		refresh_token_expires_at: now.unix_timestamp().saturating_add(refresh_expires_in),
	}
}
