pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// A scenario description that cannot be played.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid scenario '{name}': {reason}")]
    Invalid { name: String, reason: String },
}
