//! Error types for speech output

use thiserror::Error;

/// Speech synthesis error types
#[derive(Error, Debug)]
pub enum TtsError {
    /// Engine is not available or not installed
    #[error("Speech engine not available: {0}")]
    EngineNotAvailable(String),

    /// Synthesis failed
    #[error("Synthesis failed: {0}")]
    SynthesisError(String),

    /// The engine cannot pause an utterance in place
    #[error("Engine does not support pausing mid-utterance")]
    PauseUnsupported,

    /// Invalid text input
    #[error("Invalid text input: {0}")]
    InvalidInput(String),

    /// IO error (process spawning, pipes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for speech output operations
pub type TtsResult<T> = Result<T, TtsError>;
