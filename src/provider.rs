//! Provider-facing descriptors (data), strategies (behavior), and the stock TikTok setup.
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only
//! endpoints, supported grant flags, client authentication preferences, and
//! provider quirks (PKCE requirement, scope delimiter, token request shape).
//! `strategy` defines [`ProviderStrategy`], the hook flows call to rewrite authorize and
//! token parameters and to classify token errors. `tiktok` wires both together for TikTok.

pub mod descriptor;
pub mod strategy;
pub mod tiktok;

pub use descriptor::*;
pub use strategy::*;
pub use tiktok::TiktokStrategy;
