//! Shared fakes for the agent integration tests.

use std::sync::Mutex;
use std::time::Duration;

use airq_agent::error::AgentError;
use airq_agent::publisher::Publisher;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Records every publish in order.
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingPublisher {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// Payloads sent to `topic`, parsed as JSON.
    pub fn payloads(&self, topic: &str) -> Vec<serde_json::Value> {
        self.messages()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| serde_json::from_str(&p).expect("payload should be valid JSON"))
            .collect()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), AgentError> {
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

/// Rejects every publish but remembers the attempts.
#[derive(Default)]
pub struct FailingPublisher {
    attempts: Mutex<Vec<(String, String)>>,
}

impl FailingPublisher {
    pub fn attempts(&self, topic: &str) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), AgentError> {
        self.attempts
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Err(AgentError::Connect("broker went away".into()))
    }
}

/// Token that fires after `after` of (paused) runtime time.
pub fn cancel_after(after: Duration) -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        trigger.cancel();
    });
    cancel
}
