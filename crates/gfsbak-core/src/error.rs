use thiserror::Error;

pub type Result<T> = std::result::Result<T, GfsbakError>;

#[derive(Debug, Error)]
pub enum GfsbakError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("disk usage {used}% is at or above the configured threshold of {threshold}%")]
    UsageGuard { used: u8, threshold: u8 },

    #[error("backup chain unresolvable: {0}")]
    ChainUnresolvable(String),

    #[error("{stage} failed: {message}")]
    Engine { stage: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl GfsbakError {
    /// Pre-flight failures happen before any store mutation is attempted.
    /// The CLI maps these to a distinct exit code so operators can tell
    /// "nothing happened" from "something happened but didn't finish".
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            GfsbakError::Config(_) | GfsbakError::UsageGuard { .. }
        )
    }

    pub(crate) fn engine(stage: impl Into<String>, message: impl Into<String>) -> Self {
        GfsbakError::Engine {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
