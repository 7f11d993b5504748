use thiserror::Error;

/// Failure of the extractor call itself (network, service, or empty reply)
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("API key not found. Set {env_var} environment variable.")]
    MissingApiKey { env_var: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error (HTTP {status_code}): {message}")]
    Api { status_code: u16, message: String },

    #[error("No text content in response")]
    EmptyResponse,
}

/// Errors raised while turning chunks into a merged dialogue sequence
#[derive(Error, Debug)]
pub enum DialogueError {
    #[error("extractor call failed: {0}")]
    Transport(#[from] ExtractError),

    #[error("response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("response does not match the dialogue schema: {0}")]
    Schema(#[source] serde_json::Error),

    #[error("dialogue {global_id} references speaker {speaker:?} missing from the character set")]
    Consistency { global_id: u64, speaker: String },

    #[error("chunk {index}/{total} failed: {source}")]
    ChunkFailed {
        /// 1-based position of the chunk in source order
        index: usize,
        total: usize,
        #[source]
        source: Box<DialogueError>,
    },
}

impl DialogueError {
    /// Whether a caller-level retry of the same chunk could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DialogueError::Transport(_) | DialogueError::Parse(_) | DialogueError::Schema(_)
        )
    }

    /// Source-order position of the failed chunk, if this error is chunk-scoped
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            DialogueError::ChunkFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DialogueError>;
