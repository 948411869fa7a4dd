//! Token response type that tolerates a `data` envelope around the RFC 6749 fields.

// std
use std::time::Duration as StdDuration;
// crates.io
use oauth2::{AccessToken, RefreshToken, Scope, TokenResponse, basic::BasicTokenType};
use serde::{Deserializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// Token endpoint payload, unwrapped from an optional `data` object.
///
/// Fields outside the RFC 6749 set (`open_id`, `refresh_expires_in`, `union_id`, ...) are
/// kept in [`params`](Self::params). Numeric fields may arrive as strings and scopes may be
/// comma- or whitespace-delimited.
#[derive(Clone, Debug, Serialize)]
pub struct EnvelopedTokenResponse {
	access_token: AccessToken,
	token_type: BasicTokenType,
	#[serde(skip_serializing_if = "Option::is_none")]
	expires_in: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
	#[serde(rename = "scope", skip_serializing_if = "Option::is_none")]
	scopes: Option<Vec<Scope>>,
	#[serde(flatten)]
	params: JsonMap<String, JsonValue>,
}
impl EnvelopedTokenResponse {
	/// Non-standard response fields.
	pub fn params(&self) -> &JsonMap<String, JsonValue> {
		&self.params
	}

	fn from_value<E>(value: JsonValue) -> Result<Self, E>
	where
		E: DeError,
	{
		let JsonValue::Object(mut root) = value else {
			return Err(E::custom("token response must be a JSON object"));
		};
		let mut fields = match root.remove("data") {
			Some(JsonValue::Object(data)) => data,
			Some(other) => {
				root.insert("data".into(), other);

				root
			},
			None => root,
		};
		let access_token = match fields.remove("access_token") {
			Some(JsonValue::String(token)) if !token.is_empty() => AccessToken::new(token),
			_ => return Err(E::missing_field("access_token")),
		};
		let token_type = fields
			.remove("token_type")
			.and_then(|raw| serde_json::from_value::<BasicTokenType>(raw).ok())
			.unwrap_or(BasicTokenType::Bearer);
		let expires_in = match fields.remove("expires_in") {
			None | Some(JsonValue::Null) => None,
			Some(raw) => Some(
				lenient_u64(&raw)
					.ok_or_else(|| E::custom("expires_in must be a non-negative integer"))?,
			),
		};
		let refresh_token = match fields.remove("refresh_token") {
			Some(JsonValue::String(token)) if !token.is_empty() => Some(RefreshToken::new(token)),
			_ => None,
		};
		let scopes = fields.remove("scope").and_then(|raw| split_scopes(&raw));

		Ok(Self { access_token, token_type, expires_in, refresh_token, scopes, params: fields })
	}
}
impl<'de> Deserialize<'de> for EnvelopedTokenResponse {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = JsonValue::deserialize(deserializer)?;

		Self::from_value(value)
	}
}
impl TokenResponse for EnvelopedTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &Self::TokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<StdDuration> {
		self.expires_in.map(StdDuration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		self.scopes.as_ref()
	}
}

fn lenient_u64(value: &JsonValue) -> Option<u64> {
	match value {
		JsonValue::Number(number) => number.as_u64(),
		JsonValue::String(raw) => raw.trim().parse().ok(),
		_ => None,
	}
}

fn split_scopes(value: &JsonValue) -> Option<Vec<Scope>> {
	let scopes = match value {
		JsonValue::String(raw) => raw
			.split(|c: char| c == ',' || c.is_whitespace())
			.filter(|scope| !scope.is_empty())
			.map(|scope| Scope::new(scope.to_owned()))
			.collect::<Vec<_>>(),
		JsonValue::Array(items) => items
			.iter()
			.filter_map(JsonValue::as_str)
			.filter(|scope| !scope.is_empty())
			.map(|scope| Scope::new(scope.to_owned()))
			.collect(),
		_ => return None,
	};

	if scopes.is_empty() { None } else { Some(scopes) }
}
