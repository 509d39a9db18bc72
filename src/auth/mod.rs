//! Authentication module
//!
//! This module provides:
//! - Caller identity extraction from bearer tokens
//! - Gateway access tokens (static or OAuth2 client credentials)

mod gateway;
mod identity;

pub use gateway::{resolve_gateway, AccessToken, GatewayAuth, GatewayTokenProvider};
pub use identity::user_id_from_token;
