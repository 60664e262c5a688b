//! Bot credentials
//!
//! A token is the credential value plus the authorization scheme it is presented with.
//! It is consumed read-only by the REST client and by every shard's handshake.

use crate::error::DomainError;
use std::fmt;
use std::str::FromStr;

/// Authorization scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenType {
    /// `Bot {app_id}.{secret}`
    #[default]
    Bot,
    /// `Bearer {secret}` (OAuth access token)
    Bearer,
}

impl TokenType {
    /// Scheme name as sent in the `Authorization` header
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bot => "Bot",
            Self::Bearer => "Bearer",
        }
    }
}

impl FromStr for TokenType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bot" => Ok(Self::Bot),
            "bearer" => Ok(Self::Bearer),
            _ => Err(DomainError::UnknownTokenType(s.to_string())),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bot credential
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    app_id: u64,
    secret: String,
    token_type: TokenType,
}

impl Token {
    /// Create a token, rejecting an empty secret
    pub fn new(
        token_type: TokenType,
        app_id: u64,
        secret: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(DomainError::EmptyToken);
        }
        Ok(Self {
            app_id,
            secret,
            token_type,
        })
    }

    /// Create a bot token
    pub fn bot(app_id: u64, secret: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(TokenType::Bot, app_id, secret)
    }

    /// Create a bearer token
    pub fn bearer(secret: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(TokenType::Bearer, 0, secret)
    }

    #[must_use]
    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    #[must_use]
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Credential without the scheme prefix
    #[must_use]
    pub fn credential(&self) -> String {
        match self.token_type {
            TokenType::Bot => format!("{}.{}", self.app_id, self.secret),
            TokenType::Bearer => self.secret.clone(),
        }
    }

    /// Full header value, e.g. `Bot 1024.abcdef`
    ///
    /// The gateway expects the same string in Identify and Resume payloads.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.credential())
    }
}

// The secret never appears in logs
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("app_id", &self.app_id)
            .field("token_type", &self.token_type)
            .field("secret", &"***")
            .finish()
    }
}
