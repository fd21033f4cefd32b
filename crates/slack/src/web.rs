use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::events::BotIdentity;
use crate::router::{ConversationDirectory, DirectoryError};

const API_BASE_URL: &str = "https://slack.com/api";

/// Directory lookups block the current event; keep them bounded.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack bot token is not set")]
    MissingToken,
    #[error("unable to create slack http client: {0}")]
    BuildClient(#[source] reqwest::Error),
    #[error("slack api request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("slack api returned status {status}")]
    Status { status: StatusCode },
    #[error("unable to decode slack api response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("slack api call `{method}` failed: {error}")]
    Api { method: &'static str, error: String },
}

/// Thin client over the three Slack Web API lookups schemawatch needs:
/// `auth.test` (bot identity, once at startup), `conversations.info`, and
/// `users.info`. Every call honors Slack's `ok`/`error` response envelope.
pub struct SlackWebClient {
    http: reqwest::Client,
    bot_token: SecretString,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AuthTestResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channel: Option<NamedObject>,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<NamedObject>,
}

#[derive(Debug, Deserialize)]
struct NamedObject {
    #[serde(default)]
    name: String,
}

fn api_failure(
    method: &'static str,
    ok: bool,
    error: Option<String>,
) -> Result<(), SlackApiError> {
    if ok {
        return Ok(());
    }
    Err(SlackApiError::Api {
        method,
        error: error.unwrap_or_else(|| "unknown error".to_owned()),
    })
}

impl SlackWebClient {
    pub fn new(bot_token: SecretString) -> Result<Self, SlackApiError> {
        Self::with_base_url(bot_token, API_BASE_URL.to_owned())
    }

    pub fn with_base_url(bot_token: SecretString, base_url: String) -> Result<Self, SlackApiError> {
        if bot_token.expose_secret().trim().is_empty() {
            return Err(SlackApiError::MissingToken);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("schemawatch/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SlackApiError::BuildClient)?;

        Ok(Self { http, bot_token, base_url })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, SlackApiError> {
        let url = format!("{}/{method}", self.base_url);
        debug!(method, "calling slack web api");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.bot_token.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(SlackApiError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Status { status });
        }

        response.json::<T>().await.map_err(SlackApiError::Decode)
    }

    /// Resolve the bot's own identity. Called once at startup; the result
    /// is held for the process lifetime.
    pub async fn auth_test(&self) -> Result<BotIdentity, SlackApiError> {
        let response: AuthTestResponse = self.call("auth.test", &[]).await?;
        api_failure("auth.test", response.ok, response.error)?;

        let bot_id = response.bot_id.unwrap_or_default();
        if bot_id.is_empty() {
            return Err(SlackApiError::Api {
                method: "auth.test",
                error: "response did not include a bot id".to_owned(),
            });
        }
        Ok(BotIdentity::new(bot_id))
    }

    pub async fn conversation_name(&self, channel_id: &str) -> Result<String, SlackApiError> {
        let response: ConversationInfoResponse =
            self.call("conversations.info", &[("channel", channel_id)]).await?;
        api_failure("conversations.info", response.ok, response.error)?;

        Ok(response.channel.map(|channel| channel.name).unwrap_or_default())
    }

    pub async fn user_display_name(&self, user_id: &str) -> Result<String, SlackApiError> {
        let response: UserInfoResponse = self.call("users.info", &[("user", user_id)]).await?;
        api_failure("users.info", response.ok, response.error)?;

        Ok(response.user.map(|user| user.name).unwrap_or_default())
    }
}

#[async_trait]
impl ConversationDirectory for SlackWebClient {
    async fn channel_name(&self, channel_id: &str) -> Result<String, DirectoryError> {
        self.conversation_name(channel_id)
            .await
            .map_err(|error| DirectoryError::Channel(error.to_string()))
    }

    async fn user_name(&self, user_id: &str) -> Result<String, DirectoryError> {
        self.user_display_name(user_id)
            .await
            .map_err(|error| DirectoryError::User(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{api_failure, SlackApiError, SlackWebClient};

    fn secret(value: &str) -> SecretString {
        value.to_string().into()
    }

    #[test]
    fn rejects_empty_bot_token() {
        let result = SlackWebClient::new(secret(""));
        assert!(matches!(result, Err(SlackApiError::MissingToken)));
    }

    #[test]
    fn ok_envelope_passes_through() {
        assert!(api_failure("auth.test", true, None).is_ok());
    }

    #[test]
    fn error_envelope_carries_method_and_reason() {
        let error = api_failure("users.info", false, Some("user_not_found".to_owned()))
            .expect_err("api error");
        assert_eq!(
            error.to_string(),
            "slack api call `users.info` failed: user_not_found"
        );
    }

    #[test]
    fn error_envelope_without_reason_is_still_an_error() {
        let error = api_failure("conversations.info", false, None).expect_err("api error");
        assert!(error.to_string().contains("unknown error"));
    }
}
