#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use tiktok_oauth2::{
	_preludet::*,
	auth::{ProviderId, ScopeSet},
	config::AuthOptions,
	error::{CallbackError, TransientError},
	flows::{AuthorizationSession, AuthorizeOverrides, CallbackParams},
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor, tiktok},
};

const CLIENT_KEY: &str = "aw-client";
const CLIENT_SECRET: &str = "shh";
// base64("aw-client:shh")
const BASIC_AUTH: &str = "Basic YXctY2xpZW50OnNoaA==";
const TOKEN_BODY: &str = r#"{
	"data": {
		"access_token": "act.example",
		"expires_in": 86400,
		"open_id": "open-123",
		"refresh_expires_in": 31536000,
		"refresh_token": "rft.example",
		"scope": "user.info.basic,video.list",
		"token_type": "Bearer"
	},
	"message": "success"
}"#;
const USER_INFO_BODY: &str = r#"{
	"data": {
		"user": {
			"open_id": "open-123",
			"display_name": "Aw Creator",
			"avatar_url": ""
		}
	},
	"error": { "code": "ok", "message": "", "log_id": "202501010000" }
}"#;

fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	let provider_id =
		ProviderId::new("tiktok").expect("Provider identifier should be valid for callback test.");
	let parse = |path: &str| {
		Url::parse(&server.url(path)).expect("Mock endpoint URL should parse successfully.")
	};

	ProviderDescriptor::builder(provider_id)
		.authorization_endpoint(parse("/auth/authorize"))
		.token_endpoint(parse("/oauth/access_token"))
		.refresh_endpoint(parse("/oauth/refresh_token/"))
		.user_info_endpoint(parse("/v2/user/info/?fields=open_id,display_name"))
		.default_scope(
			ScopeSet::parse(tiktok::DEFAULT_SCOPE, tiktok::SCOPE_DELIMITER)
				.expect("Default scope should parse successfully."),
		)
		.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
		.preferred_client_auth_method(ClientAuthMethod::ClientSecretBasic)
		.quirks(tiktok::quirks())
		.build()
		.expect("Provider descriptor should build successfully.")
}

fn redirect_uri() -> Url {
	Url::parse("https://app.example.com/auth/tiktok/callback")
		.expect("Redirect URI fixture should parse successfully.")
}

fn query_value(url: &Url, key: &str) -> Option<String> {
	url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
}

fn callback_params(session: &AuthorizationSession, code: &str) -> CallbackParams {
	let mut url = redirect_uri();

	url.query_pairs_mut().append_pair("code", code).append_pair("state", &session.state);

	CallbackParams::from_url(&url)
}

#[tokio::test]
async fn callback_exchanges_code_and_builds_auth_hash() {
	let server = MockServer::start_async().await;
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		AuthOptions::default(),
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");
	let authorize_url = &session.authorize_url;

	assert_eq!(query_value(authorize_url, "client_key").as_deref(), Some(CLIENT_KEY));
	assert_eq!(query_value(authorize_url, "client_id"), None);
	assert_eq!(query_value(authorize_url, "response_type").as_deref(), Some("code"));
	assert_eq!(
		query_value(authorize_url, "scope").as_deref(),
		Some("user.info.basic,video.list")
	);
	assert_eq!(
		query_value(authorize_url, "redirect_uri").as_deref(),
		Some("https://app.example.com/auth/tiktok/callback")
	);
	assert_eq!(query_value(authorize_url, "state").as_deref(), Some(session.state.as_str()));
	assert_eq!(session.state.len(), 48);
	assert_eq!(query_value(authorize_url, "code_challenge"), None);

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/access_token")
				.header("authorization", BASIC_AUTH)
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "code-123")
				.form_urlencoded_tuple("client_key", CLIENT_KEY)
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let user_info_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v2/user/info/")
				.query_param("fields", "open_id,display_name")
				.header("authorization", "Bearer act.example");
			then.status(200).header("content-type", "application/json").body(USER_INFO_BODY);
		})
		.await;
	let before = OffsetDateTime::now_utc().unix_timestamp();
	let hash = authenticator
		.callback(&session, callback_params(&session, "code-123"))
		.await
		.expect("Callback should complete successfully.");

	token_mock.assert_async().await;
	user_info_mock.assert_async().await;

	assert_eq!(hash.provider, "tiktok");
	assert_eq!(hash.uid.as_deref(), Some("open-123"));
	assert_eq!(hash.info.nickname.as_deref(), Some("Aw Creator"));
	assert_eq!(hash.credentials.token.expose(), "act.example");
	assert_eq!(
		hash.credentials.refresh_token.as_ref().map(|token| token.expose()),
		Some("rft.example")
	);
	assert!(hash.credentials.expires);

	let expires_at = hash.credentials.expires_at.expect("Expiring token should carry expires_at.");

	assert!(expires_at >= before + 86_400);
	assert!(hash.credentials.refresh_token_expires_at >= before + 31_536_000);

	let raw_info = hash.extra.raw_info.expect("Raw info should be kept without skip_info.");

	assert_eq!(raw_info.pointer("/data/user/open_id"), Some(&JsonValue::from("open-123")));
	assert_eq!(raw_info.pointer("/data/user/avatar_url"), None);
	assert_eq!(raw_info.pointer("/error/message"), None);
}

#[tokio::test]
async fn error_envelope_with_success_status_is_invalid_grant() {
	let server = MockServer::start_async().await;
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		AuthOptions::default(),
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(
				r#"{"data":{"captcha":"","description":"Authorization code is expired.","error_code":10007},"message":"error"}"#,
			);
		})
		.await;
	let user_info_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/user/info/");
			then.status(200).header("content-type", "application/json").body(USER_INFO_BODY);
		})
		.await;
	let err = authenticator
		.callback(&session, callback_params(&session, "stale-code"))
		.await
		.expect_err("Error envelope should fail the callback.");

	token_mock.assert_async().await;
	user_info_mock.assert_hits_async(0).await;

	match err {
		Error::InvalidGrant { reason } => assert_eq!(reason, "Authorization code is expired."),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn plain_text_rejections_are_classified_from_the_body() {
	let server = MockServer::start_async().await;
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		AuthOptions::default(),
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(400)
				.header("content-type", "text/plain")
				.body("invalid_grant: code was already used");
		})
		.await;
	let err = authenticator
		.callback(&session, callback_params(&session, "used-code"))
		.await
		.expect_err("Plain-text rejection should fail the callback.");

	token_mock.assert_async().await;

	assert_eq!(err.failure_key(), "invalid_credentials");

	match err {
		Error::InvalidGrant { reason } => assert!(reason.contains("already used")),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn state_mismatch_never_reaches_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		AuthOptions::default(),
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let params = CallbackParams {
		code: Some("code-123".into()),
		state: Some("forged".into()),
		..Default::default()
	};
	let err = authenticator
		.callback(&session, params)
		.await
		.expect_err("Mismatched state should be rejected.");

	token_mock.assert_hits_async(0).await;

	assert!(matches!(err, Error::Callback(CallbackError::StateMismatch)));
	assert_eq!(err.failure_key(), "csrf_detected");
}

#[tokio::test]
async fn ignored_state_and_skip_info_drop_raw_info() {
	let server = MockServer::start_async().await;
	let options = AuthOptions::default().with_provider_ignores_state(true).with_skip_info(true);
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		options,
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token").form_urlencoded_tuple("code", "code-9");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let user_info_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/user/info/");
			then.status(200).header("content-type", "application/json").body(USER_INFO_BODY);
		})
		.await;
	let params = CallbackParams { code: Some("code-9".into()), ..Default::default() };
	let hash = authenticator
		.callback(&session, params)
		.await
		.expect("Callback should ignore the missing state.");

	token_mock.assert_async().await;
	user_info_mock.assert_async().await;

	assert_eq!(hash.info.nickname.as_deref(), Some("Aw Creator"));
	assert_eq!(hash.extra.raw_info, None);
}

#[tokio::test]
async fn provider_errors_and_missing_codes_short_circuit() {
	let server = MockServer::start_async().await;
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		AuthOptions::default(),
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let denied = CallbackParams {
		error: Some("access_denied".into()),
		error_description: Some("The user cancelled the login.".into()),
		state: Some(session.state.clone()),
		..Default::default()
	};
	let err = authenticator
		.callback(&session, denied)
		.await
		.expect_err("Provider error should fail the callback.");

	assert_eq!(err.failure_key(), "access_denied");

	let missing_code = CallbackParams { state: Some(session.state.clone()), ..Default::default() };
	let err = authenticator
		.callback(&session, missing_code)
		.await
		.expect_err("Missing code should fail the callback.");

	assert!(matches!(err, Error::Callback(CallbackError::MissingAuthorizationCode)));
	assert_eq!(err.failure_key(), "no_authorization_code");

	token_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn rejected_access_token_on_user_info_is_invalid_grant() {
	let server = MockServer::start_async().await;
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		AuthOptions::default(),
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;

	let user_info_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/user/info/");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"error":{"code":"access_token_invalid"}}"#);
		})
		.await;
	let err = authenticator
		.callback(&session, callback_params(&session, "code-123"))
		.await
		.expect_err("Rejected access token should fail the callback.");

	user_info_mock.assert_async().await;

	assert!(matches!(err, Error::InvalidGrant { .. }));
	assert_eq!(err.failure_key(), "invalid_credentials");
}

#[tokio::test]
async fn user_info_outages_surface_as_transient() {
	let server = MockServer::start_async().await;
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		AuthOptions::default(),
	);
	let session = authenticator
		.start_authorization(redirect_uri(), AuthorizeOverrides::default())
		.expect("Authorization session should start successfully.");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/user/info/");
			then.status(502).body("bad gateway");
		})
		.await;

	let err = authenticator
		.callback(&session, callback_params(&session, "code-123"))
		.await
		.expect_err("User info outage should fail the callback.");

	match err {
		Error::Transient(TransientError::UserInfoEndpoint { status, .. }) =>
			assert_eq!(status, Some(502)),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn pkce_sessions_send_the_verifier() {
	let server = MockServer::start_async().await;
	let options = AuthOptions::default().with_pkce(true).with_scope("user.info.basic");
	let authenticator = build_reqwest_test_authenticator(
		build_descriptor(&server),
		CLIENT_KEY,
		CLIENT_SECRET,
		options,
	);
	let session = authenticator
		.start_authorization(
			redirect_uri(),
			AuthorizeOverrides::default().display("popup").auth_type("reauthenticate"),
		)
		.expect("Authorization session should start successfully.");
	let challenge =
		session.code_challenge().expect("PKCE session should carry a challenge.").to_owned();
	let authorize_url = &session.authorize_url;

	assert_eq!(query_value(authorize_url, "code_challenge").as_deref(), Some(challenge.as_str()));
	assert_eq!(query_value(authorize_url, "code_challenge_method").as_deref(), Some("S256"));
	assert_eq!(query_value(authorize_url, "scope").as_deref(), Some("user.info.basic"));
	assert_eq!(query_value(authorize_url, "display").as_deref(), Some("popup"));
	assert_eq!(query_value(authorize_url, "auth_type").as_deref(), Some("reauthenticate"));

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/access_token")
				.form_urlencoded_tuple_exists("code_verifier")
				.form_urlencoded_tuple("client_key", CLIENT_KEY);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v2/user/info/");
			then.status(200).header("content-type", "application/json").body(USER_INFO_BODY);
		})
		.await;

	let hash = authenticator
		.callback(&session, callback_params(&session, "code-123"))
		.await
		.expect("PKCE callback should complete successfully.");

	token_mock.assert_async().await;

	assert_eq!(hash.uid.as_deref(), Some("open-123"));
}
