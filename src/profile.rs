//! Normalization of token and user-info responses into the canonical auth hash.
//!
//! The auth hash mirrors the shape login middleware conventionally hands to applications:
//!
//! ```json
//! {
//!   "provider": "tiktok",
//!   "uid": "<open_id>",
//!   "info": { "nickname": "<display_name>" },
//!   "credentials": { "token": "...", "expires": true, "expires_at": 1735776000, ... },
//!   "extra": { "raw_info": { ... } }
//! }
//! ```

pub mod credentials;

mod prune;

pub use credentials::*;
pub use prune::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenRecord},
};

/// Token response parameter holding the TikTok user identifier.
pub const OPEN_ID_PARAM: &str = "open_id";

/// `info` section of the auth hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// TikTok display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nickname: Option<String>,
}

/// `extra` section of the auth hash.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extra {
	/// Pruned user-info payload; absent when skipped or empty.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub raw_info: Option<JsonValue>,
}

/// Canonical identity and credential record produced by a successful callback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthHash {
	/// Provider name.
	pub provider: String,
	/// Stable user identifier (`open_id`).
	pub uid: Option<String>,
	/// Profile fields.
	pub info: UserInfo,
	/// Token details.
	pub credentials: Credentials,
	/// Raw payloads.
	pub extra: Extra,
}

/// Reads `open_id` from the token response parameters.
pub fn uid(record: &TokenRecord) -> Option<String> {
	record.param_str(OPEN_ID_PARAM).filter(|value| !value.is_empty())
}

/// Extracts the nickname from a user-info payload.
///
/// The v2 user-info endpoint nests the profile under `data.user`; older payloads keep it
/// directly under `data`. Both are accepted, nested first.
pub fn info(raw_info: &JsonValue) -> UserInfo {
	let display_name = raw_info
		.pointer("/data/user/display_name")
		.filter(|value| !value.is_null())
		.or_else(|| raw_info.pointer("/data/display_name"))
		.cloned()
		.unwrap_or(JsonValue::Null);
	let mut map = JsonMap::new();

	map.insert("nickname".into(), display_name);
	prune(&mut map);

	let nickname = match map.remove("nickname") {
		Some(JsonValue::String(name)) => Some(name),
		Some(JsonValue::Number(number)) => Some(number.to_string()),
		_ => None,
	};

	UserInfo { nickname }
}

/// Builds the `extra` section; `raw_info` is omitted when `skip_info` is set.
pub fn extra(raw_info: JsonValue, skip_info: bool) -> Extra {
	if skip_info {
		return Extra::default();
	}

	Extra { raw_info: prune_value(raw_info) }
}

/// Assembles the full auth hash.
pub fn build_auth_hash(
	provider: &ProviderId,
	record: &TokenRecord,
	raw_info: JsonValue,
	skip_info: bool,
	now: OffsetDateTime,
) -> AuthHash {
	AuthHash {
		provider: provider.to_string(),
		uid: uid(record),
		info: info(&raw_info),
		credentials: credentials(record, now),
		extra: extra(raw_info, skip_info),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;
	use crate::auth::ScopeSet;

	fn record() -> TokenRecord {
		TokenRecord::builder(ScopeSet::default())
			.access_token("act.1")
			.refresh_token("rft.1")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::seconds(86_400))
			.param(OPEN_ID_PARAM, "open-123")
			.param(REFRESH_EXPIRES_IN_PARAM, 31_536_000)
			.build()
			.expect("Record fixture should build.")
	}

	#[test]
	fn nickname_prefers_nested_user_object() {
		let raw = json!({ "data": { "user": { "display_name": "Ada" }, "display_name": "Old" } });

		assert_eq!(info(&raw).nickname.as_deref(), Some("Ada"));

		let raw = json!({ "data": { "display_name": "Legacy" } });

		assert_eq!(info(&raw).nickname.as_deref(), Some("Legacy"));
	}

	#[test]
	fn blank_nicknames_are_pruned() {
		assert_eq!(info(&json!({ "data": { "user": { "display_name": "" } } })), UserInfo::default());
		assert_eq!(info(&json!({})), UserInfo::default());
		assert_eq!(
			serde_json::to_value(info(&json!({ "error": {} }))).expect("Should serialize."),
			json!({})
		);
	}

	#[test]
	fn extra_respects_skip_info_and_prunes() {
		let raw = json!({ "data": { "user": { "display_name": "Ada", "avatar_url": "" } }, "error": { "code": "ok", "message": "" } });

		assert_eq!(extra(raw.clone(), true), Extra::default());
		assert_eq!(
			extra(raw, false).raw_info,
			Some(json!({ "data": { "user": { "display_name": "Ada" } }, "error": { "code": "ok" } }))
		);
		assert_eq!(extra(json!({}), false).raw_info, None);
	}

	#[test]
	fn auth_hash_has_canonical_shape() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let provider = ProviderId::new("tiktok").expect("Provider fixture should be valid.");
		let raw = json!({ "data": { "user": { "open_id": "open-123", "display_name": "Ada" } } });
		let hash = build_auth_hash(&provider, &record(), raw.clone(), false, now);

		assert_eq!(
			serde_json::to_value(&hash).expect("Auth hash should serialize."),
			json!({
				"provider": "tiktok",
				"uid": "open-123",
				"info": { "nickname": "Ada" },
				"credentials": {
					"token": "act.1",
					"refresh_token": "rft.1",
					"expires_at": now.unix_timestamp() + 86_400,
					"expires": true,
					"refresh_token_expires_at": now.unix_timestamp() + 31_536_000,
				},
				"extra": { "raw_info": raw },
			})
		);
	}

	#[test]
	fn missing_open_id_leaves_uid_empty() {
		let record = TokenRecord::builder(ScopeSet::default())
			.access_token("act.2")
			.param(OPEN_ID_PARAM, "")
			.build()
			.expect("Record fixture should build.");

		assert_eq!(uid(&record), None);
	}
}
