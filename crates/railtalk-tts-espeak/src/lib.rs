//! eSpeak speech engine for railtalk
//!
//! Plays narration through the espeak / espeak-ng command-line synthesizer,
//! one child process per utterance. Stopping kills the child; the child's
//! exit doubles as a genuine utterance-completion event, so callers do not
//! need the duration heuristic when this engine is in use. eSpeak has no
//! way to pause a running process, so `pause` reports unsupported and the
//! controller falls back to restart-from-the-beginning semantics.

use async_trait::async_trait;
use railtalk_tts::{
    next_utterance_id, SpeechEngine, TtsError, TtsResult, UtteranceHandle, UtteranceParams,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};


/// Baseline espeak speaking rate in words per minute (rate multiplier 1.0).
const BASE_WPM: f32 = 175.0;

pub struct EspeakEngine {
    /// Resolved command name (espeak or espeak-ng), probed on first use
    command: Mutex<Option<String>>,
    /// The child playing the active utterance, tagged with its utterance id
    active: Arc<Mutex<Option<(u64, Child)>>>,
}

impl EspeakEngine {
    pub fn new() -> Self {
        Self {
            command: Mutex::new(None),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Probe for the espeak command (espeak, then espeak-ng).
    async fn probe_command() -> Option<String> {
        for candidate in ["espeak", "espeak-ng"] {
            if Command::new(candidate)
                .arg("--version")
                .output()
                .await
                .is_ok()
            {
                return Some(candidate.to_string());
            }
        }
        None
    }

    async fn resolve_command(&self) -> Option<String> {
        let mut cached = self.command.lock().await;
        if cached.is_none() {
            *cached = Self::probe_command().await;
        }
        cached.clone()
    }

    /// Map a language tag to an espeak voice id ("id-ID" -> "id").
    fn voice_for(params: &UtteranceParams) -> String {
        if let Some(voice) = &params.voice {
            return voice.clone();
        }
        params
            .language
            .split(['-', '_'])
            .next()
            .unwrap_or("en")
            .to_ascii_lowercase()
    }

    /// Build espeak command arguments for an utterance.
    fn build_args(text: &str, params: &UtteranceParams) -> Vec<String> {
        let wpm = (BASE_WPM * params.rate).round().clamp(80.0, 450.0) as u32;
        // espeak pitch is 0-99 with 50 as normal; ours is 0.0-2.0 with 1.0
        let pitch = ((params.pitch * 50.0) as u32).min(99);
        // espeak amplitude is 0-200 with 100 as normal
        let volume = ((params.volume * 200.0) as u32).min(200);

        vec![
            "-v".to_string(),
            Self::voice_for(params),
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            volume.to_string(),
            text.to_string(),
        ]
    }

    /// Kill the active child, if any. The reaper task notices the slot was
    /// emptied and fires the completion event.
    async fn kill_active(&self) {
        let mut slot = self.active.lock().await;
        if let Some((_, mut child)) = slot.take() {
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill espeak process: {}", e);
            }
        }
    }
}

impl Default for EspeakEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    fn name(&self) -> &str {
        "espeak"
    }

    async fn is_available(&self) -> bool {
        self.resolve_command().await.is_some()
    }

    async fn speak(&mut self, text: &str, params: &UtteranceParams) -> TtsResult<UtteranceHandle> {
        if text.trim().is_empty() {
            return Err(TtsError::InvalidInput("empty text".to_string()));
        }
        let cmd = self
            .resolve_command()
            .await
            .ok_or_else(|| TtsError::EngineNotAvailable("espeak not found".to_string()))?;

        self.kill_active().await;

        let args = Self::build_args(text, params);
        debug!("Running espeak: {} {:?}", cmd, args);
        let child = Command::new(&cmd)
            .args(&args)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()?;

        let utterance_id = next_utterance_id();
        *self.active.lock().await = Some((utterance_id, child));

        // Reap the child and report completion. The slot no longer holding
        // this utterance means it was stopped or preempted, which counts as
        // over too.
        let (done_tx, done_rx) = oneshot::channel();
        let slot = Arc::clone(&self.active);
        tokio::spawn(async move {
            loop {
                {
                    let mut guard = slot.lock().await;
                    match guard.as_mut() {
                        Some((id, child)) if *id == utterance_id => {
                            match child.try_wait() {
                                Ok(Some(_)) | Err(_) => {
                                    *guard = None;
                                    break;
                                }
                                Ok(None) => {}
                            }
                        }
                        _ => break,
                    }
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            let _ = done_tx.send(());
        });

        Ok(UtteranceHandle {
            utterance_id,
            completion: Some(done_rx),
        })
    }

    async fn stop(&mut self) -> TtsResult<()> {
        self.kill_active().await;
        Ok(())
    }

    async fn pause(&mut self) -> TtsResult<()> {
        // A playing espeak process cannot be suspended portably
        Err(TtsError::PauseUnsupported)
    }

    async fn resume(&mut self) -> TtsResult<()> {
        debug!("Resume requested on espeak engine (no-op)");
        Ok(())
    }
}
