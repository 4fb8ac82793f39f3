//! Publisher adapter and the MQTT connection behind it.
//!
//! The driver loop only sees the [`Publisher`] trait. [`MqttPublisher`]
//! implements it on top of a `rumqttc` client whose event loop is polled on
//! a spawned task.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::MqttSettings;
use crate::error::AgentError;

/// Capacity of the request channel between the client and its event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Back-off after an event loop error before polling (and reconnecting) again.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How long `disconnect` waits for the DISCONNECT packet to go out.
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

/// Delivers a serialized payload to a topic.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), AgentError>;
}

/// Serialize `value` as JSON and publish it.
pub async fn publish_json<P, T>(publisher: &P, topic: &str, value: &T) -> Result<String, AgentError>
where
    P: Publisher + ?Sized,
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_string(value)?;
    publisher.publish(topic, payload.clone()).await?;
    Ok(payload)
}

/// A live broker connection.
///
/// Created with [`MqttPublisher::connect`], which only returns once the
/// broker has accepted the session. Released with
/// [`MqttPublisher::disconnect`].
#[derive(Debug)]
pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
    event_loop: JoinHandle<()>,
}

impl MqttPublisher {
    /// Connect to the broker and wait for its CONNACK.
    ///
    /// Fails if the broker is unreachable, refuses the session, or does not
    /// answer within `settings.connect_timeout`.
    pub async fn connect(settings: &MqttSettings) -> Result<Self, AgentError> {
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(settings.keep_alive);
        options.set_clean_session(true);

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        tracing::info!(host = %settings.host, port = settings.port, "Connecting to MQTT broker");

        match tokio::time::timeout(settings.connect_timeout, wait_for_connack(&mut event_loop)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(AgentError::Connect(format!(
                    "no CONNACK from {}:{} within {}s",
                    settings.host,
                    settings.port,
                    settings.connect_timeout.as_secs(),
                )));
            }
        }

        tracing::info!("MQTT broker accepted connection");

        Ok(Self {
            client,
            qos: settings.qos,
            event_loop: tokio::spawn(drive_event_loop(event_loop)),
        })
    }

    /// Send DISCONNECT and stop the event loop task, waiting at most
    /// [`DISCONNECT_GRACE`].
    pub async fn disconnect(self) {
        self.disconnect_within(DISCONNECT_GRACE).await;
    }

    /// Send DISCONNECT and give the event loop `grace` to flush it.
    ///
    /// Never blocks on the request queue: with the broker gone the queue may
    /// already be full, in which case the event loop is aborted once `grace`
    /// runs out.
    pub async fn disconnect_within(mut self, grace: Duration) {
        if let Err(e) = self.client.try_disconnect() {
            tracing::warn!(error = %e, "Failed to queue MQTT disconnect");
        }

        if tokio::time::timeout(grace, &mut self.event_loop)
            .await
            .is_err()
        {
            tracing::warn!("MQTT event loop did not stop in time, aborting");
            self.event_loop.abort();
        }

        tracing::info!("MQTT connection released");
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), AgentError> {
        // Non-blocking: a full request queue surfaces as an error instead of
        // stalling the cadence.
        self.client.try_publish(topic, self.qos, false, payload)?;
        Ok(())
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<(), AgentError> {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(AgentError::Connect(format!(
                        "broker refused connection: {:?}",
                        ack.code
                    )))
                };
            }
            Ok(_) => {}
            Err(e) => return Err(AgentError::Connect(e.to_string())),
        }
    }
}

/// Poll the event loop until the client disconnects.
///
/// Errors are logged and polling resumes after [`RECONNECT_DELAY`];
/// `rumqttc` re-establishes the connection on the next poll.
async fn drive_event_loop(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("MQTT event loop stopping after disconnect");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "MQTT event loop error, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
