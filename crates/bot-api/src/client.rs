//! HTTP implementation of the bot REST API

use async_trait::async_trait;
use bot_common::{ApiConfig, API_BASE_URL, SANDBOX_API_BASE_URL};
use bot_core::{
    DirectMessage, DirectMessageToCreate, GatewayBootstrap, Message, MessageToCreate, Token,
};
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

const USER_AGENT: &str = concat!("bot-gateway/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// REST operations the gateway client and bot handlers depend on
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Fetch the WebSocket URL, recommended shard count, and start limits
    async fn gateway_bot(&self) -> ApiResult<GatewayBootstrap>;

    /// Post a message to a guild channel
    async fn post_message(&self, channel_id: &str, msg: &MessageToCreate) -> ApiResult<Message>;

    /// Open a direct-message session with a guild member
    async fn create_direct_message(&self, dm: &DirectMessageToCreate) -> ApiResult<DirectMessage>;

    /// Post a message inside a direct-message session
    async fn post_direct_message(
        &self,
        dm: &DirectMessage,
        msg: &MessageToCreate,
    ) -> ApiResult<Message>;
}

/// `reqwest`-backed [`GatewayApi`]
#[derive(Clone)]
pub struct HttpApiClient {
    http: Client,
    base_url: String,
    token: Token,
}

impl HttpApiClient {
    /// Create a client against an explicit base URL
    pub fn new(base_url: impl Into<String>, token: Token, timeout: Duration) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create a client against the production or sandbox endpoint
    pub fn for_environment(token: Token, sandbox: bool) -> ApiResult<Self> {
        let base = if sandbox {
            SANDBOX_API_BASE_URL
        } else {
            API_BASE_URL
        };
        Self::new(base, token, DEFAULT_TIMEOUT)
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &ApiConfig, token: Token) -> ApiResult<Self> {
        Self::new(config.base_url.clone(), token, config.timeout)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(header::AUTHORIZATION, self.token.authorization())
    }

    async fn send<T>(&self, builder: RequestBuilder) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let res = self.authorized(builder).send().await?;
        let status = res.status();

        if status.is_success() {
            let bytes = res.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "REST call failed");
            Err(ApiError::UnexpectedStatus { status, body })
        }
    }
}

#[async_trait]
impl GatewayApi for HttpApiClient {
    async fn gateway_bot(&self) -> ApiResult<GatewayBootstrap> {
        let bootstrap: GatewayBootstrap = self.send(self.http.get(self.url("/gateway/bot"))).await?;
        tracing::debug!(
            url = %bootstrap.url,
            shards = bootstrap.shards,
            max_concurrency = bootstrap.max_concurrency(),
            "Fetched gateway bootstrap"
        );
        Ok(bootstrap)
    }

    async fn post_message(&self, channel_id: &str, msg: &MessageToCreate) -> ApiResult<Message> {
        let url = self.url(&format!("/channels/{channel_id}/messages"));
        self.send(self.http.post(url).json(msg)).await
    }

    async fn create_direct_message(&self, dm: &DirectMessageToCreate) -> ApiResult<DirectMessage> {
        self.send(self.http.post(self.url("/users/@me/dms")).json(dm))
            .await
    }

    async fn post_direct_message(
        &self,
        dm: &DirectMessage,
        msg: &MessageToCreate,
    ) -> ApiResult<Message> {
        let url = self.url(&format!("/dms/{}/messages", dm.guild_id));
        self.send(self.http.post(url).json(msg)).await
    }
}
