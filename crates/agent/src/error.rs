use airq_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Broker connection failed: {0}")]
    Connect(String),

    #[error("Publish failed: {0}")]
    Publish(#[from] rumqttc::ClientError),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
