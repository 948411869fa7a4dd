//! Shared helpers for the flows: scope resolution and token form assembly.

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ConfigError,
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor, ProviderStrategy},
};

/// Joins scopes with the provider's delimiter; `None` for an empty set.
pub(crate) fn format_scope(scope: &ScopeSet, delimiter: char) -> Option<String> {
	if scope.is_empty() { None } else { Some(scope.join(delimiter)) }
}

/// Picks the first configured scope string (request override, then host options) or falls
/// back to the descriptor default.
///
/// Strings holding only delimiters and whitespace count as unset.
pub(crate) fn resolve_scope(
	descriptor: &ProviderDescriptor,
	candidates: [Option<&str>; 2],
) -> Result<ScopeSet> {
	let delimiter = descriptor.quirks.scope_delimiter;
	let has_entries = |raw: &&str| {
		raw.split(|c: char| c == delimiter || c.is_whitespace()).any(|part| !part.is_empty())
	};

	match candidates.into_iter().flatten().find(has_entries) {
		Some(raw) => Ok(ScopeSet::parse(raw, delimiter).map_err(ConfigError::from)?),
		None => Ok(descriptor.default_scope.clone()),
	}
}

/// Builds the extra form parameters for a token request.
///
/// The form is seeded with `grant_type`, `client_id`, and (when the descriptor repeats the
/// secret in the body) `client_secret`, then handed to the strategy. The `oauth2` client sends
/// `grant_type` and its own client authentication, so those keys are not forwarded again.
pub(crate) fn token_form(
	descriptor: &ProviderDescriptor,
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	client_id: &str,
	client_secret: Option<&str>,
) -> Vec<(String, String)> {
	let mut form = BTreeMap::new();

	form.insert("grant_type".to_owned(), grant.as_str().to_owned());
	form.insert("client_id".to_owned(), client_id.to_owned());

	if let Some(secret) = client_secret.filter(|_| descriptor.quirks.secret_in_token_body) {
		form.insert("client_secret".to_owned(), secret.to_owned());
	}

	strategy.augment_token_request(grant, &mut form);

	let secret_owned_by_client = matches!(
		descriptor.preferred_client_auth_method,
		ClientAuthMethod::ClientSecretPost
	) && client_secret.is_some();

	form.into_iter()
		.filter(|(key, _)| match key.as_str() {
			"grant_type" | "client_id" => false,
			"client_secret" => !secret_owned_by_client,
			_ => true,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::{DefaultProviderStrategy, TiktokStrategy, tiktok};

	#[test]
	fn scope_formatting_handles_custom_delimiters() {
		let scope = ScopeSet::new(["user.info.basic", "video.list"]).expect("Scope should build.");

		assert_eq!(format_scope(&scope, ','), Some("user.info.basic,video.list".into()));
		assert_eq!(format_scope(&scope, ' '), Some("user.info.basic video.list".into()));
		assert_eq!(format_scope(&ScopeSet::default(), ','), None);
	}

	#[test]
	fn scope_resolution_prefers_overrides_then_options() {
		let descriptor = tiktok::descriptor().expect("Stock descriptor should build.");

		assert_eq!(
			resolve_scope(&descriptor, [Some("video.upload"), Some("user.info.basic")])
				.expect("Override should parse.")
				.join(','),
			"video.upload"
		);
		assert_eq!(
			resolve_scope(&descriptor, [None, Some("user.info.basic, user.info.profile")])
				.expect("Options scope should parse.")
				.join(','),
			"user.info.basic,user.info.profile"
		);
		assert_eq!(
			resolve_scope(&descriptor, [Some("  "), None]).expect("Default should apply."),
			descriptor.default_scope
		);
		assert_eq!(
			resolve_scope(&descriptor, [Some(","), None]).expect("Default should apply."),
			descriptor.default_scope
		);
		assert_eq!(
			resolve_scope(&descriptor, [Some(" , ,"), Some("video.list")])
				.expect("Options scope should apply.")
				.join(','),
			"video.list"
		);
	}

	#[test]
	fn tiktok_form_carries_client_key_and_secret() {
		let descriptor = tiktok::descriptor().expect("Stock descriptor should build.");
		let form = token_form(
			&descriptor,
			&TiktokStrategy,
			GrantType::AuthorizationCode,
			"aw-client",
			Some("shh"),
		);

		assert_eq!(
			form,
			vec![
				("client_key".to_owned(), "aw-client".to_owned()),
				("client_secret".to_owned(), "shh".to_owned()),
			]
		);
	}

	#[test]
	fn rfc_providers_get_no_extra_fields() {
		let mut descriptor = tiktok::descriptor().expect("Stock descriptor should build.");

		descriptor.quirks.secret_in_token_body = false;

		assert!(
			token_form(
				&descriptor,
				&DefaultProviderStrategy,
				GrantType::RefreshToken,
				"client",
				Some("secret")
			)
			.is_empty()
		);

		descriptor.quirks.secret_in_token_body = true;
		descriptor.preferred_client_auth_method = ClientAuthMethod::ClientSecretPost;

		let form = token_form(
			&descriptor,
			&DefaultProviderStrategy,
			GrantType::RefreshToken,
			"client",
			Some("secret"),
		);

		assert!(form.is_empty());
	}
}
