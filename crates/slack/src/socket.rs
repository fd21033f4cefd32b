use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::events::{EventContext, SlackEnvelope};
use crate::router::MessageRouter;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket mode connection failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: TransportError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Seam for the Socket Mode session: connection handshake, envelope stream,
/// and acknowledgment are the session library's concern; the runner only
/// consumes typed envelopes. Implementors turn raw Socket Mode frames into
/// envelopes with [`crate::events::parse_envelope`].
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Transport that yields no envelopes. Stands in where no Socket Mode
/// session is wired up, e.g. smoke-testing the bootstrap path.
#[derive(Default)]
pub struct NoopSocketTransport;

#[async_trait]
impl SocketTransport for NoopSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// The event-processing loop: acknowledges every envelope on receipt, then
/// routes it. Routing failures never cross the event boundary; transport
/// failures reconnect with bounded backoff and become fatal only once
/// retries are exhausted.
pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    router: Arc<MessageRouter>,
    reconnect_policy: ReconnectPolicy,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        router: Arc<MessageRouter>,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, router, reconnect_policy }
    }

    pub async fn start(&self) -> Result<(), SocketError> {
        let mut attempt = 0;
        loop {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        return Err(SocketError::RetriesExhausted {
                            attempts: attempt + 1,
                            last_error: transport_error,
                        });
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "connecting to slack with socket mode");
        self.transport.connect().await?;
        info!(attempt, "connected to slack with socket mode");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "socket mode envelope stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            debug!(
                envelope_id = %envelope.envelope_id,
                event_type = envelope.event.event_type(),
                "received slack envelope"
            );

            // Ack first, regardless of routing outcome: unacknowledged
            // envelopes are redelivered by the platform.
            if let Err(ack_error) = self.transport.acknowledge(&envelope.envelope_id).await {
                warn!(
                    envelope_id = %envelope.envelope_id,
                    error = %ack_error,
                    "failed to acknowledge slack envelope"
                );
            }

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };
            match self.router.route(&envelope, &context).await {
                Ok(outcome) => {
                    debug!(
                        envelope_id = %envelope.envelope_id,
                        ?outcome,
                        "slack envelope routed"
                    );
                }
                Err(route_error) => {
                    error!(
                        envelope_id = %envelope.envelope_id,
                        error = %route_error,
                        "unable to handle message event"
                    );
                }
            }
        }
    }
}
