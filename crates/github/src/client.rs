use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Per-call deadline applied to every pull request lookup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_BASE_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Parameters to create a new GitHub client.
#[derive(Clone, Debug)]
pub struct Options {
    /// Token used as the bearer credential for every request.
    pub token: SecretString,
    /// Per-call request deadline.
    pub timeout: Duration,
    /// API base URL override; `None` uses the public GitHub API.
    pub base_url: Option<String>,
}

impl Options {
    pub fn new(token: SecretString) -> Self {
        Self { token, timeout: DEFAULT_TIMEOUT, base_url: None }
    }
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("github token is not set")]
    MissingToken,
    #[error("unable to create github http client: {0}")]
    BuildClient(#[source] reqwest::Error),
    #[error("unable to retrieve pull request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("pull request lookup failed with status {status}")]
    Status { status: StatusCode },
    #[error("unable to decode pull request response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Read seam consumed by the message router: fetch a pull request's
/// description text. Implemented by [`Client`] and by in-memory fakes in
/// tests.
#[async_trait]
pub trait PullRequestReader: Send + Sync {
    async fn pull_request_description(
        &self,
        organization: &str,
        repository: &str,
        pull_request: i64,
    ) -> Result<String, GitHubError>;
}

/// GitHub API client scoped to the single read operation schemawatch needs.
pub struct Client {
    http: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl Client {
    /// Validate options and construct a client with a bounded per-call
    /// timeout.
    pub fn new(options: Options) -> Result<Self, GitHubError> {
        if options.token.expose_secret().trim().is_empty() {
            return Err(GitHubError::MissingToken);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("schemawatch/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .build()
            .map_err(GitHubError::BuildClient)?;

        Ok(Self {
            http,
            token: options.token,
            base_url: options.base_url.unwrap_or_else(|| API_BASE_URL.to_string()),
        })
    }

    fn pull_request_url(&self, organization: &str, repository: &str, pull_request: i64) -> String {
        format!("{}/repos/{organization}/{repository}/pulls/{pull_request}", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    body: Option<String>,
}

#[async_trait]
impl PullRequestReader for Client {
    async fn pull_request_description(
        &self,
        organization: &str,
        repository: &str,
        pull_request: i64,
    ) -> Result<String, GitHubError> {
        let url = self.pull_request_url(organization, repository, pull_request);
        debug!(organization, repository, pull_request, "fetching pull request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(GitHubError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status { status });
        }

        let pull = response.json::<PullRequestResponse>().await.map_err(GitHubError::Decode)?;
        Ok(pull.body.unwrap_or_default())
    }
}
