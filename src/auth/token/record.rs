//! Token record built from a token endpoint response, plus its builder.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// Immutable record describing an issued access token.
///
/// Besides the standard fields, TikTok returns `open_id`, `refresh_expires_in`, and
/// friends alongside the token; those stay available through [`params`](Self::params).
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Scopes the provider reported (falls back to the requested scopes).
	pub scope: ScopeSet,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the response was received.
	pub issued_at: OffsetDateTime,
	/// Expiry instant, when the provider supplied `expires_in`.
	pub expires_at: Option<OffsetDateTime>,
	/// Remaining non-standard fields from the token response.
	pub params: JsonMap<String, JsonValue>,
}
impl TokenRecord {
	/// Returns a builder for constructing records.
	pub fn builder(scope: ScopeSet) -> TokenRecordBuilder {
		TokenRecordBuilder::new(scope)
	}

	/// Returns true when the token carries an expiry.
	pub fn expires(&self) -> bool {
		self.expires_at.is_some()
	}

	/// Looks up a raw token response parameter.
	pub fn param(&self, key: &str) -> Option<&JsonValue> {
		self.params.get(key)
	}

	/// Looks up a parameter as a string; numbers are rendered in decimal.
	pub fn param_str(&self, key: &str) -> Option<String> {
		match self.params.get(key)? {
			JsonValue::String(value) => Some(value.clone()),
			JsonValue::Number(value) => Some(value.to_string()),
			_ => None,
		}
	}

	/// Looks up a parameter as an integer, accepting numeric strings. Fractional values are
	/// truncated toward zero.
	pub fn param_i64(&self, key: &str) -> Option<i64> {
		match self.params.get(key)? {
			JsonValue::Number(value) => value.as_i64().or_else(|| value.as_f64().and_then(truncate)),
			JsonValue::String(value) => {
				let value = value.trim();

				value.parse().ok().or_else(|| value.parse().ok().and_then(truncate))
			},
			_ => None,
		}
	}
}

impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("scope", &self.scope)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("params", &self.params.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	scope: ScopeSet,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	params: JsonMap<String, JsonValue>,
}
impl TokenRecordBuilder {
	fn new(scope: ScopeSet) -> Self {
		Self {
			scope,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
			params: JsonMap::new(),
		}
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Replaces the extra response parameters.
	pub fn params(mut self, params: JsonMap<String, JsonValue>) -> Self {
		self.params = params;

		self
	}

	/// Adds a single extra response parameter.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(issued_at + delta),
			(None, None) => None,
		};

		Ok(TokenRecord {
			scope: self.scope,
			access_token,
			refresh_token: self.refresh_token,
			issued_at,
			expires_at,
			params: self.params,
		})
	}
}

fn truncate(value: f64) -> Option<i64> {
	value.is_finite().then(|| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn scope() -> ScopeSet {
		ScopeSet::new(["user.info.basic"]).expect("Scope fixture should be valid.")
	}

	#[test]
	fn builder_handles_relative_expiry() {
		let record = TokenRecord::builder(scope())
			.access_token("act.1")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::hours(24))
			.build()
			.expect("Token record builder should support relative expiry calculations.");

		assert!(record.expires());
		assert_eq!(record.expires_at, Some(macros::datetime!(2025-01-02 00:00 UTC)));
	}

	#[test]
	fn records_without_expiry_do_not_expire() {
		let record = TokenRecord::builder(scope())
			.access_token("act.2")
			.build()
			.expect("Expiry is optional.");

		assert!(!record.expires());
		assert_eq!(record.expires_at, None);
	}

	#[test]
	fn builder_rejects_missing_or_empty_access_token() {
		assert_eq!(
			TokenRecord::builder(scope()).build().expect_err("Missing token must fail."),
			TokenRecordBuilderError::MissingAccessToken
		);
		assert!(TokenRecord::builder(scope()).access_token("").build().is_err());
	}

	#[test]
	fn params_accept_numbers_and_numeric_strings() {
		let record = TokenRecord::builder(scope())
			.access_token("act.3")
			.param("open_id", "open-123")
			.param("refresh_expires_in", 31_536_000)
			.param("expires_hint", "86400")
			.param("flag", true)
			.param("float_lifetime", 31_536_000.0)
			.param("float_string", "86400.9")
			.build()
			.expect("Record with params should build.");

		assert_eq!(record.param_str("open_id").as_deref(), Some("open-123"));
		assert_eq!(record.param_i64("refresh_expires_in"), Some(31_536_000));
		assert_eq!(record.param_i64("expires_hint"), Some(86_400));
		assert_eq!(record.param_i64("flag"), None);
		assert_eq!(record.param_i64("float_lifetime"), Some(31_536_000));
		assert_eq!(record.param_i64("float_string"), Some(86_400));
		assert_eq!(record.param_str("missing"), None);

		let debug = format!("{record:?}");

		assert!(debug.contains("<redacted>"));
		assert!(!debug.contains("act.3"));
	}
}
