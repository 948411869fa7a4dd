//! Refresh token exchange against the descriptor's refresh endpoint.
//!
//! The adapter does not store or schedule anything: the caller passes the refresh token it
//! holds and receives a fresh [`TokenRecord`]. When the provider omits a rotated refresh token
//! the record carries the one that was sent.

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::ConfigError,
	flows::{Authenticator, common},
	http::ProviderHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

impl<C, M> Authenticator<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges `refresh_token` for a new access token.
	pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.exchange_refresh_token(refresh_token)).await;

		obs::record_flow_outcome(KIND, span.record_result(&result));

		result
	}

	async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenRecord> {
		self.ensure_refresh_supported()?;

		if refresh_token.is_empty() {
			return Err(Error::InvalidGrant { reason: "refresh token is empty".into() });
		}

		let form = common::token_form(
			&self.descriptor,
			self.strategy.as_ref(),
			GrantType::RefreshToken,
			&self.client_id,
			self.client_secret.as_deref(),
		);
		let facade = self.facade(self.descriptor.endpoints.refresh_or_token())?;

		facade.refresh_token(self.strategy.as_ref(), refresh_token, &form).await
	}

	fn ensure_refresh_supported(&self) -> Result<()> {
		if self.descriptor.supports(GrantType::RefreshToken) {
			Ok(())
		} else {
			Err(ConfigError::UnsupportedGrant {
				descriptor: self.descriptor.id.to_string(),
				grant: GrantType::RefreshToken.as_str(),
			}
			.into())
		}
	}
}
