use std::sync::Arc;

use async_trait::async_trait;
use schemawatch_github::{GitHubError, PullRequestReader};
use thiserror::Error;
use tracing::debug;

use crate::events::{BotIdentity, EventContext, MessageEvent, SlackEnvelope, SlackEvent};
use crate::extract::{extract_schema_change, SchemaChange};

/// Channel the automated change-feed integration posts to.
pub const SCHEMA_CHANGE_FEED_CHANNEL: &str = "gateway-schema-change-feed";

const BOT_MESSAGE_SUBTYPE: &str = "bot_message";

/// Lookup seam for Slack directory data. Implemented by the web API client
/// and by in-memory fakes in tests.
#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    async fn channel_name(&self, channel_id: &str) -> Result<String, DirectoryError>;
    async fn user_name(&self, user_id: &str) -> Result<String, DirectoryError>;
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("unable to get channel information: {0}")]
    Channel(String),
    #[error("unable to get user information: {0}")]
    User(String),
}

/// The routing decision for one envelope, observable by tests and logged by
/// the socket runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A feed message was extracted and its pull request looked up.
    SchemaChangeProcessed(SchemaChange),
    /// A human message was received and logged; no further processing.
    HumanMessageLogged,
    /// The event required no handling.
    Dropped(DropReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    NotMessageClass { event_type: String },
    UnsupportedSubtype { subtype: String },
    SelfAuthored,
    UnwatchedChannel { channel: String },
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("unable to handle gateway schema change event: {0}")]
    Extraction(#[from] crate::extract::ExtractionError),
    #[error("unable to get PR description for gateway schema change event: {0}")]
    PullRequestLookup(#[from] GitHubError),
}

/// Classifies inbound events and handles the qualifying ones. Stateless
/// between invocations except for the fixed [`BotIdentity`] captured at
/// startup, so concurrent invocations share only read-only state.
pub struct MessageRouter {
    bot_identity: BotIdentity,
    directory: Arc<dyn ConversationDirectory>,
    pull_requests: Arc<dyn PullRequestReader>,
}

impl MessageRouter {
    pub fn new(
        bot_identity: BotIdentity,
        directory: Arc<dyn ConversationDirectory>,
        pull_requests: Arc<dyn PullRequestReader>,
    ) -> Self {
        Self { bot_identity, directory, pull_requests }
    }

    /// Route one acknowledged envelope. Every error is local to the event:
    /// the caller logs it and moves on to the next envelope.
    pub async fn route(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<RouteOutcome, RouteError> {
        let message = match &envelope.event {
            SlackEvent::Message(message) => message,
            SlackEvent::Unsupported { event_type } => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    event_type,
                    "event ignored as it is not a message event"
                );
                return Ok(RouteOutcome::Dropped(DropReason::NotMessageClass {
                    event_type: event_type.clone(),
                }));
            }
        };

        // Only new messages and bot messages are processed.
        if !message.subtype.is_empty() && message.subtype != BOT_MESSAGE_SUBTYPE {
            debug!(
                correlation_id = %ctx.correlation_id,
                subtype = %message.subtype,
                "event ignored as the sub-type is not a new message"
            );
            return Ok(RouteOutcome::Dropped(DropReason::UnsupportedSubtype {
                subtype: message.subtype.clone(),
            }));
        }

        // Never react to our own messages; that way lies a feedback loop.
        if !message.bot_id.is_empty() && message.bot_id == self.bot_identity.as_str() {
            debug!(
                correlation_id = %ctx.correlation_id,
                bot_id = %message.bot_id,
                "event ignored as the message originated from our application"
            );
            return Ok(RouteOutcome::Dropped(DropReason::SelfAuthored));
        }

        let channel_name = self.directory.channel_name(&message.channel_id).await?;

        if message.subtype == BOT_MESSAGE_SUBTYPE {
            self.handle_bot_message(message, &channel_name, ctx).await
        } else {
            let username = self.directory.user_name(&message.user_id).await?;
            debug!(
                correlation_id = %ctx.correlation_id,
                channel = %channel_name,
                username = %username,
                message = %message.text,
                "message received"
            );
            Ok(RouteOutcome::HumanMessageLogged)
        }
    }

    async fn handle_bot_message(
        &self,
        message: &MessageEvent,
        channel_name: &str,
        ctx: &EventContext,
    ) -> Result<RouteOutcome, RouteError> {
        if channel_name != SCHEMA_CHANGE_FEED_CHANNEL {
            debug!(
                correlation_id = %ctx.correlation_id,
                bot_id = %message.bot_id,
                channel = %channel_name,
                "bot message received"
            );
            return Ok(RouteOutcome::Dropped(DropReason::UnwatchedChannel {
                channel: channel_name.to_owned(),
            }));
        }

        debug!(correlation_id = %ctx.correlation_id, ?message, "gateway change event received");
        let change = extract_schema_change(message)?;

        // The description is fetched so lookup failures surface, then
        // discarded: the downstream integration it feeds is not built yet.
        let _description = self
            .pull_requests
            .pull_request_description(
                &change.organization,
                &change.repository,
                change.pull_request,
            )
            .await?;

        Ok(RouteOutcome::SchemaChangeProcessed(change))
    }
}
