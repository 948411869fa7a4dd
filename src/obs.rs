//! Optional observability for the login flows.
//!
//! # Feature Flags
//!
//! - `tracing`: every flow runs inside an `info` span named `tiktok_oauth2.flow` carrying the
//!   `flow` and `stage` fields, plus `outcome` and `failure` once the flow returns.
//! - `metrics`: the `tiktok_oauth2_flow_total` counter is incremented per attempt, success, and
//!   failure, labeled by `flow` and `outcome`.
//!
//! Without the features both helpers compile down to no-ops.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Login phases observed by the adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Request phase: building the authorize redirect.
	Authorize,
	/// Callback phase: validation, code exchange, user info, and auth hash.
	Callback,
	/// Refresh token exchange.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::Callback => "callback",
			FlowKind::Refresh => "refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each flow invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// The flow was entered.
	Attempt,
	/// The flow completed.
	Success,
	/// The flow returned an error.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a flow result onto its terminal outcome.
	pub fn of<T>(result: &Result<T>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
