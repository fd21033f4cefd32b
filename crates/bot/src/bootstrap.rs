use std::sync::Arc;
use std::time::Duration;

use schemawatch_core::config::{AppConfig, ConfigError, LoadOptions};
use schemawatch_github::{Client as GitHubClient, GitHubError, Options as GitHubOptions};
use schemawatch_slack::router::MessageRouter;
use schemawatch_slack::socket::{
    NoopSocketTransport, ReconnectPolicy, SocketModeRunner, SocketTransport,
};
use schemawatch_slack::web::{SlackApiError, SlackWebClient};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unable to create github client: {0}")]
    GitHub(#[from] GitHubError),
    #[error("unable to determine bot identity: {0}")]
    Slack(#[from] SlackApiError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!("starting application bootstrap");

    let github = GitHubClient::new(GitHubOptions {
        token: config.github.token.clone(),
        timeout: Duration::from_secs(config.github.timeout_secs),
        base_url: None,
    })?;

    let web_client = Arc::new(SlackWebClient::new(config.slack.bot_token.clone())?);

    // Resolved once, before any event processing; read-only afterwards.
    let bot_identity = web_client.auth_test().await?;
    info!(bot_id = bot_identity.as_str(), "resolved bot identity");

    let router = Arc::new(MessageRouter::new(bot_identity, web_client, Arc::new(github)));

    // The Socket Mode session is wired by the deployment's session
    // collaborator behind the SocketTransport seam.
    let transport: Arc<dyn SocketTransport> = Arc::new(NoopSocketTransport);
    let runner = SocketModeRunner::new(transport, router, ReconnectPolicy::default());

    Ok(Application { runner })
}

#[cfg(test)]
mod tests {
    use schemawatch_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_app_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                slack_app_token: Some("invalid-token".to_string()),
                slack_bot_token: Some("xoxb-valid".to_string()),
                github_token: Some("ghp_valid".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("slack.app_token"));
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_github_token() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                slack_app_token: Some("xapp-valid".to_string()),
                slack_bot_token: Some("xoxb-valid".to_string()),
                github_token: Some(String::new()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("bootstrap should fail").to_string();
        assert!(message.contains("github.token"));
    }
}
