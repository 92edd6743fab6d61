//! Speech engine boundary

use crate::error::TtsResult;
use crate::types::UtteranceParams;
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Handle to an utterance accepted by an engine.
pub struct UtteranceHandle {
    /// Unique utterance id assigned by the engine
    pub utterance_id: u64,
    /// Resolves when the platform reports the utterance is over (finished
    /// or cancelled). `None` when the platform has no completion signal;
    /// callers then fall back to estimating the duration.
    pub completion: Option<oneshot::Receiver<()>>,
}

/// Platform speech-synthesis boundary.
///
/// Implementations produce audible speech (espeak, a platform API, ...).
/// Engines play at most one utterance; `speak` on a busy engine replaces
/// the current utterance.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Engine name/identifier
    fn name(&self) -> &str;

    /// Check if the engine can actually produce audio on this host
    async fn is_available(&self) -> bool;

    /// Start synthesizing `text` with the given parameters
    async fn speak(&mut self, text: &str, params: &UtteranceParams) -> TtsResult<UtteranceHandle>;

    /// Cancel the active utterance, if any. Idempotent.
    async fn stop(&mut self) -> TtsResult<()>;

    /// Pause the active utterance in place.
    ///
    /// Engines that cannot pause return `TtsError::PauseUnsupported`; the
    /// controller then falls back to stop-and-restart semantics.
    async fn pause(&mut self) -> TtsResult<()>;

    /// Resume an utterance paused with `pause`
    async fn resume(&mut self) -> TtsResult<()>;
}

/// Engine used when the host exposes no speech-synthesis capability.
///
/// Every operation is a silent no-op so callers can keep their state
/// transitions without branching on support everywhere.
#[derive(Debug, Default)]
pub struct NullEngine;

impl NullEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpeechEngine for NullEngine {
    fn name(&self) -> &str {
        "null"
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn speak(&mut self, _text: &str, _params: &UtteranceParams) -> TtsResult<UtteranceHandle> {
        Ok(UtteranceHandle {
            utterance_id: crate::next_utterance_id(),
            completion: None,
        })
    }

    async fn stop(&mut self) -> TtsResult<()> {
        Ok(())
    }

    async fn pause(&mut self) -> TtsResult<()> {
        Ok(())
    }

    async fn resume(&mut self) -> TtsResult<()> {
        Ok(())
    }
}
