use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_APPROVED_TOKEN: &str = "approved";
pub const DEFAULT_MESSAGE_NAME: &str = "managerApprovalResponse";
pub const DEFAULT_MESSAGE_TTL_MS: u64 = 60_000;
pub const DEFAULT_OAUTH_URL: &str = "https://login.cloud.camunda.io/oauth/token";
pub const DEFAULT_TOKEN_AUDIENCE: &str = "zeebe.camunda.io";

/// Which outbound transport delivers decisions to the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Authenticated POST to the engine's message-correlation endpoint.
    Correlate,
    /// GET to a pre-provisioned connector URL.
    Webhook,
    /// Message publication through the engine's client API (OAuth2).
    Publish,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Correlate => "correlate",
            TransportKind::Webhook => "webhook",
            TransportKind::Publish => "publish",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correlate" | "rest" => Ok(TransportKind::Correlate),
            "webhook" | "connector" => Ok(TransportKind::Webhook),
            "publish" | "zeebe" => Ok(TransportKind::Publish),
            other => anyhow::bail!(
                "unknown RELAY_TRANSPORT '{}'. Must be one of: correlate, webhook, publish",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Transport-specific endpoint and credential material.
#[derive(Clone)]
pub enum EngineConfig {
    Correlate {
        base_url: Url,
        api_token: String,
        message_name: String,
    },
    Webhook {
        url: Url,
    },
    Publish {
        api_url: Url,
        oauth_url: Url,
        audience: String,
        client_id: String,
        client_secret: String,
        message_name: String,
        ttl_ms: u64,
    },
}

impl EngineConfig {
    pub fn kind(&self) -> TransportKind {
        match self {
            EngineConfig::Correlate { .. } => TransportKind::Correlate,
            EngineConfig::Webhook { .. } => TransportKind::Webhook,
            EngineConfig::Publish { .. } => TransportKind::Publish,
        }
    }
}

// Credentials stay out of logs and panic messages.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineConfig::Correlate {
                base_url,
                message_name,
                ..
            } => f
                .debug_struct("Correlate")
                .field("base_url", &base_url.as_str())
                .field("api_token", &"<redacted>")
                .field("message_name", message_name)
                .finish(),
            EngineConfig::Webhook { url } => f
                .debug_struct("Webhook")
                .field(
                    "url",
                    &format!("{}://{}/<redacted>", url.scheme(), url.host_str().unwrap_or("")),
                )
                .finish(),
            EngineConfig::Publish {
                api_url,
                oauth_url,
                audience,
                client_id,
                message_name,
                ttl_ms,
                ..
            } => f
                .debug_struct("Publish")
                .field("api_url", &api_url.as_str())
                .field("oauth_url", &oauth_url.as_str())
                .field("audience", audience)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("message_name", message_name)
                .field("ttl_ms", ttl_ms)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Positive decision token. Compared exactly (case-sensitive).
    pub approved_token: String,
    /// Include the underlying transport error in 500 response bodies.
    pub expose_error_detail: bool,
    pub log_format: LogFormat,
    pub engine: EngineConfig,
}

impl Config {
    pub fn transport(&self) -> TransportKind {
        self.engine.kind()
    }

    /// Build a config from an arbitrary key lookup. `load()` feeds it the
    /// process environment; tests feed it a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values are treated as unset.
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str, transport: TransportKind| {
            get(key).with_context(|| {
                format!("{} must be set when RELAY_TRANSPORT={}", key, transport)
            })
        };

        let port = match get("RELAY_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid port: {}", raw))?,
            None => DEFAULT_PORT,
        };

        let approved_token = lookup("RELAY_APPROVED_TOKEN")
            .unwrap_or_else(|| DEFAULT_APPROVED_TOKEN.to_string());
        if approved_token.is_empty() {
            anyhow::bail!("RELAY_APPROVED_TOKEN must not be empty");
        }

        let expose_error_detail = get("RELAY_EXPOSE_ERROR_DETAIL")
            .map(|v| parse_bool(&v))
            .transpose()?
            .unwrap_or(false);

        let log_format = match get("RELAY_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => anyhow::bail!(
                "invalid RELAY_LOG_FORMAT '{}'. Must be 'text' or 'json'",
                other
            ),
        };

        let transport: TransportKind = match get("RELAY_TRANSPORT") {
            Some(raw) => raw.parse()?,
            None => TransportKind::Correlate,
        };

        let message_name =
            get("RELAY_MESSAGE_NAME").unwrap_or_else(|| DEFAULT_MESSAGE_NAME.to_string());

        let engine = match transport {
            TransportKind::Correlate => EngineConfig::Correlate {
                base_url: parse_url("CAMUNDA_BASE_URL", &require("CAMUNDA_BASE_URL", transport)?)?,
                api_token: require("CAMUNDA_API_TOKEN", transport)?,
                message_name,
            },
            TransportKind::Webhook => EngineConfig::Webhook {
                url: parse_url(
                    "CAMUNDA_WEBHOOK_URL",
                    &require("CAMUNDA_WEBHOOK_URL", transport)?,
                )?,
            },
            TransportKind::Publish => {
                let api_url = match get("CAMUNDA_ZEEBE_URL") {
                    Some(raw) => parse_url("CAMUNDA_ZEEBE_URL", &raw)?,
                    None => {
                        let region = require("CAMUNDA_REGION", transport)?;
                        let cluster_id = require("CAMUNDA_CLUSTER_ID", transport)?;
                        parse_url(
                            "CAMUNDA_REGION/CAMUNDA_CLUSTER_ID",
                            &format!("https://{}.zeebe.camunda.io/{}", region.trim(), cluster_id.trim()),
                        )?
                    }
                };
                let oauth_url = parse_url(
                    "CAMUNDA_OAUTH_URL",
                    &get("CAMUNDA_OAUTH_URL").unwrap_or_else(|| DEFAULT_OAUTH_URL.to_string()),
                )?;
                let ttl_ms = match get("RELAY_MESSAGE_TTL_MS") {
                    Some(raw) => raw
                        .trim()
                        .parse()
                        .with_context(|| format!("invalid RELAY_MESSAGE_TTL_MS: {}", raw))?,
                    None => DEFAULT_MESSAGE_TTL_MS,
                };

                EngineConfig::Publish {
                    api_url,
                    oauth_url,
                    audience: get("CAMUNDA_TOKEN_AUDIENCE")
                        .unwrap_or_else(|| DEFAULT_TOKEN_AUDIENCE.to_string()),
                    client_id: require("CAMUNDA_CLIENT_ID", transport)?,
                    client_secret: require("CAMUNDA_CLIENT_SECRET", transport)?,
                    message_name,
                    ttl_ms,
                }
            }
        };

        Ok(Config {
            port,
            approved_token,
            expose_error_detail,
            log_format,
            engine,
        })
    }
}

fn parse_url(key: &str, raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("{} is not a valid URL", key))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => anyhow::bail!("{} must be an http(s) URL, got scheme '{}'", key, other),
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean value: {}", other),
    }
}

/// Load configuration from `.env` (if present) and the process environment.
pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}
