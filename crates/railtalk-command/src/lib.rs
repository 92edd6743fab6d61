//! Voice command interpretation for railtalk
//!
//! Maps free-text transcripts from the recognizer onto the closed set of
//! application actions. The primary interpreter may be a remote AI call;
//! `KeywordInterpreter` is the local deterministic matcher the application
//! falls back to when the primary errors out or comes back empty, so the
//! user is never left stuck.

use async_trait::async_trait;
use thiserror::Error;

pub mod fallback;
pub mod keyword;

pub use fallback::FallbackInterpreter;
pub use keyword::KeywordInterpreter;

/// Screens of the ticketing client a voice command can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    IntercityBooking,
    CommuterLine,
    Lrt,
    AirportTrain,
    MyTickets,
    TripPlanner,
    Settings,
}

/// Closed set of actions a transcript can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Navigate to a screen
    Navigate(Screen),
    /// Go back to the previous screen
    Back,
    /// Re-read the current page announcement
    ReadPage,
    /// Narrate the help text
    Help,
    /// Immediately silence all narration and reset the audio channel
    StopAllSound,
}

#[derive(Error, Debug)]
pub enum InterpretError {
    /// The interpreter backend failed (network, model, ...)
    #[error("Interpreter backend failed: {0}")]
    Backend(String),

    /// The transcript was empty or unusable
    #[error("Unusable transcript")]
    EmptyTranscript,
}

/// Transcript-to-command boundary.
///
/// `Ok(None)` means the transcript was understood to match nothing; errors
/// mean the backend itself failed. Callers decide what to do with either
/// (typically: fall back to `KeywordInterpreter`).
#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    async fn interpret(&self, transcript: &str) -> Result<Option<AppCommand>, InterpretError>;
}
