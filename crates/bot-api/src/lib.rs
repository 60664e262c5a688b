//! # bot-api
//!
//! REST client for the bot platform: gateway bootstrap (`GET /gateway/bot`)
//! and the message endpoints bot handlers reply through.

pub mod client;
pub mod error;

pub use client::{GatewayApi, HttpApiClient};
pub use error::{ApiError, ApiResult};
