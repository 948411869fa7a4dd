//! Callback phase: redirect validation, code exchange, user info, and the auth hash.

// self
use crate::{
	_prelude::*,
	error::CallbackError,
	flows::{Authenticator, AuthorizationSession, common},
	http::ProviderHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	profile::{self, AuthHash},
	provider::GrantType,
};

/// Query parameters TikTok appends to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Echoed state value.
	pub state: Option<String>,
	/// RFC 6749 error code.
	pub error: Option<String>,
	/// Alternative error code some providers send instead of `error`.
	pub error_reason: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
	/// URI documenting the error.
	pub error_uri: Option<String>,
}
impl CallbackParams {
	/// Reads the callback parameters from a redirect URL's query string. Unknown keys are
	/// ignored and the first occurrence of a key wins.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_reason" => &mut params.error_reason,
				"error_description" => &mut params.error_description,
				"error_uri" => &mut params.error_uri,
				_ => continue,
			};

			if slot.is_none() {
				*slot = Some(value.into_owned());
			}
		}

		params
	}

	fn provider_error(&self) -> Option<CallbackError> {
		let error = non_empty(&self.error_reason).or_else(|| non_empty(&self.error))?;

		Some(CallbackError::Provider {
			error: error.to_owned(),
			description: non_empty(&self.error_description).map(str::to_owned),
			uri: non_empty(&self.error_uri).map(str::to_owned),
		})
	}
}

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Completes a login from the provider redirect.
	///
	/// Steps run in order and stop at the first failure: provider error parameters, the
	/// `state` check (skipped with `provider_ignores_state`), presence of `code`, the code
	/// exchange, the user-info fetch, and finally the auth hash.
	pub async fn callback(
		&self,
		session: &AuthorizationSession,
		params: CallbackParams,
	) -> Result<AuthHash> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.complete_callback(session, params)).await;

		obs::record_flow_outcome(KIND, span.record_result(&result));

		result
	}

	async fn complete_callback(
		&self,
		session: &AuthorizationSession,
		params: CallbackParams,
	) -> Result<AuthHash> {
		if let Some(err) = params.provider_error() {
			return Err(err.into());
		}
		if !self.options.provider_ignores_state && !session.state_matches(params.state.as_deref())
		{
			return Err(CallbackError::StateMismatch.into());
		}

		let code = non_empty(&params.code).ok_or(CallbackError::MissingAuthorizationCode)?;
		let form = common::token_form(
			&self.descriptor,
			self.strategy.as_ref(),
			GrantType::AuthorizationCode,
			&self.client_id,
			self.client_secret.as_deref(),
		);
		let redirect_uri = self
			.descriptor
			.quirks
			.redirect_uri_in_token_request
			.then_some(&session.redirect_uri);
		let facade = self.facade(&self.descriptor.endpoints.token)?;
		let record = facade
			.exchange_authorization_code(
				self.strategy.as_ref(),
				code,
				session.pkce_verifier(),
				&session.scope,
				redirect_uri,
				&form,
			)
			.await?;
		let raw_info = facade
			.fetch_user_info(
				self.strategy.as_ref(),
				self.descriptor.endpoints.user_info.clone(),
				record.access_token.expose(),
			)
			.await?;

		Ok(profile::build_auth_hash(
			&self.descriptor.id,
			&record,
			raw_info,
			self.options.skip_info,
			OffsetDateTime::now_utc(),
		))
	}
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|value| !value.is_empty())
}
