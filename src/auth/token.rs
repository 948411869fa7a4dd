//! Token records returned by the token endpoint and the secret wrapper guarding them.

pub mod record;
pub mod secret;
