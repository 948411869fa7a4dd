// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Future type returned by [`FlowSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future type returned by [`FlowSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Step of a login flow that a span covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// Building the authorize redirect and its session.
	AuthorizeRedirect,
	/// Validating the callback, exchanging the code, and fetching the profile.
	CodeExchange,
	/// Exchanging a refresh token against the refresh endpoint.
	RefreshExchange,
}
impl FlowStage {
	/// Stage that covers the whole of `kind`.
	pub const fn of(kind: FlowKind) -> Self {
		match kind {
			FlowKind::Authorize => Self::AuthorizeRedirect,
			FlowKind::Callback => Self::CodeExchange,
			FlowKind::Refresh => Self::RefreshExchange,
		}
	}

	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AuthorizeRedirect => "authorize_redirect",
			Self::CodeExchange => "code_exchange",
			Self::RefreshExchange => "refresh_exchange",
		}
	}
}

/// `tiktok_oauth2.flow` span wrapper.
///
/// The span carries `flow` and `stage` up front; `outcome` and `failure` are filled in by
/// [`FlowSpan::record_result`] once the flow returns.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at its stage.
	pub fn new(kind: FlowKind) -> Self {
		let stage = FlowStage::of(kind);

		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"tiktok_oauth2.flow",
				flow = kind.as_str(),
				stage = stage.as_str(),
				outcome = tracing::field::Empty,
				failure = tracing::field::Empty,
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Runs a synchronous section inside the span.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Records the terminal outcome and, for failures, the login-failure key.
	pub fn record_result<T>(&self, result: &Result<T>) -> FlowOutcome {
		let outcome = FlowOutcome::of(result);

		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());

			if let Err(err) = result {
				self.span.record("failure", err.failure_key());
				tracing::debug!(parent: &self.span, error = %err, "Login flow failed.");
			}
		}

		outcome
	}
}
