use thiserror::Error;

#[derive(Debug, Error)]
pub enum WayfarerError {
    // Generation errors
    #[error("LLM request failed: {0}")]
    LlmRequest(String),

    #[error("LLM streaming error: {0}")]
    LlmStream(String),

    // Collaborator errors
    #[error("Place lookup failed: {0}")]
    Lookup(String),

    #[error("Search failed: {provider}: {message}")]
    Search { provider: String, message: String },

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Human input unavailable: {0}")]
    HumanInput(String),

    // Workflow errors
    #[error("Invalid state update for `{field}`: {reason}")]
    InvalidUpdate { field: &'static str, reason: String },

    #[error("Trip request has not been initialized")]
    MissingTripRequest,

    #[error("Node not found in graph: {0}")]
    NodeNotFound(String),

    #[error("Node `{0}` has no outgoing transition")]
    MissingTransition(String),

    #[error("Routing from `{node}` produced unmapped label `{label}`")]
    UnknownRoute { node: String, label: String },

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Workflow exceeded max steps ({0})")]
    StepLimitExceeded(usize),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WayfarerError>;
