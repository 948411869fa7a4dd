//! Interactive TikTok login walkthrough.
//!
//! The demo prints the authorize URL, waits for the user to paste the full redirect URL TikTok
//! sent them to, completes the callback, and prints the resulting auth hash. It can optionally
//! refresh the access token afterwards.

// std
use std::io::{self, Write};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use tiktok_oauth2::{
	config::AuthOptions,
	flows::{AuthorizeOverrides, CallbackParams, ReqwestAuthenticator},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_key = prompt_with_default("Enter your TikTok client key", Some("demo-client-key"))?;
	let client_secret = prompt_with_default("Enter your TikTok client secret", None)?;
	let full_host = Url::parse(&prompt_with_default(
		"Enter the public origin of your app",
		Some("https://app.example.com"),
	)?)?;
	let scope = prompt_optional("Scope override (leave blank for user.info.basic,video.list)")?;
	let mut options = AuthOptions::default();

	if let Some(scope) = scope {
		options = options.with_scope(scope);
	}

	let authenticator =
		ReqwestAuthenticator::tiktok(client_key, client_secret)?.with_options(options);
	let redirect_uri = authenticator.callback_url(&full_host, "")?;
	let session = authenticator.start_authorization(redirect_uri, AuthorizeOverrides::default())?;

	println!("Redirect URI: {}", session.redirect_uri);
	println!("Authorize URL: {}", session.authorize_url);
	println!("After TikTok redirects back, paste the full URL from the browser address bar.");

	let Some(returned) = prompt_optional("Redirect URL (leave blank to stop here)")? else {
		println!("Redirect URL not provided; skipping the callback.");

		return Ok(());
	};
	let params = CallbackParams::from_url(&Url::parse(&returned)?);
	let hash = match authenticator.callback(&session, params).await {
		Ok(hash) => hash,
		Err(err) => {
			println!("Login failed ({}): {err}", err.failure_key());

			return Ok(());
		},
	};

	println!("Auth hash: {}", serde_json::to_string_pretty(&hash)?);

	let Some(refresh_token) = hash.credentials.refresh_token.as_ref() else {
		println!("Provider did not return a refresh token.");

		return Ok(());
	};

	if prompt_optional("Refresh the access token now? (y/N)")?.as_deref() == Some("y") {
		let record = authenticator.refresh(refresh_token.expose()).await?;

		println!("New access token: {}", record.access_token.expose());
		println!("Expires at: {:?}", record.expires_at);
	}

	Ok(())
}

fn prompt_with_default(message: &str, default: Option<&str>) -> Result<String> {
	loop {
		if let Some(value) = default {
			print!("{message} [{value}]: ");
		} else {
			print!("{message}: ");
		}

		io::stdout().flush()?;

		let mut input = String::new();

		io::stdin().read_line(&mut input)?;

		let trimmed = input.trim();

		if trimmed.is_empty() {
			if let Some(value) = default {
				return Ok(value.to_owned());
			}
		} else {
			return Ok(trimmed.to_owned());
		}
	}
}

fn prompt_optional(message: &str) -> Result<Option<String>> {
	print!("{message}: ");

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let trimmed = input.trim();

	if trimmed.is_empty() { Ok(None) } else { Ok(Some(trimmed.to_owned())) }
}
