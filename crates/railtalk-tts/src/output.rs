//! Speech output controller
//!
//! `SpeechOutput` owns the platform engine and enforces the playback
//! contract: at most one utterance at a time, new utterances preempt the
//! old one, and the narration language is always the application locale.
//! When the host has no synthesis capability every operation degrades to a
//! silent no-op; callers branch UI affordances on `is_supported`.

use crate::engine::SpeechEngine;
use crate::error::TtsError;
use crate::types::{AccessibilitySettings, SynthesisOptions, UtteranceParams};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

#[derive(Default)]
struct Playback {
    utterance_id: u64,
    speaking: bool,
    paused: bool,
    /// The engine paused in place; false means the utterance was silenced
    /// and `resume` must restart it from the beginning.
    resume_in_place: bool,
    /// Completion withheld during a stop-based pause. Engines that kill
    /// their playback to pause report the kill as the utterance ending;
    /// the narration is not actually over, so the signal is held here and
    /// re-attached to the restarted utterance on resume.
    pending_done: Option<oneshot::Sender<()>>,
    text: String,
    params: Option<UtteranceParams>,
}

pub struct SpeechOutput {
    engine: tokio::sync::Mutex<Box<dyn SpeechEngine>>,
    settings: RwLock<AccessibilitySettings>,
    playback: Arc<Mutex<Playback>>,
    locale: String,
    supported: bool,
}

impl SpeechOutput {
    /// Wrap an engine, probing its availability once up front.
    pub async fn new(
        engine: Box<dyn SpeechEngine>,
        locale: impl Into<String>,
        settings: AccessibilitySettings,
    ) -> Self {
        let supported = engine.is_available().await;
        if !supported {
            warn!(
                "Speech engine {:?} unavailable; narration will be silent",
                engine.name()
            );
        }
        Self {
            engine: tokio::sync::Mutex::new(engine),
            settings: RwLock::new(settings.clamped()),
            playback: Arc::new(Mutex::new(Playback::default())),
            locale: locale.into(),
            supported,
        }
    }

    /// True only if the host exposes a working synthesis capability.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn settings(&self) -> AccessibilitySettings {
        self.settings.read().clone()
    }

    pub fn set_settings(&self, settings: AccessibilitySettings) {
        *self.settings.write() = settings.clamped();
    }

    /// Merge a partial update onto the current settings and return the result.
    pub fn apply_patch(&self, patch: &crate::types::SettingsPatch) -> AccessibilitySettings {
        let mut guard = self.settings.write();
        *guard = guard.clone().apply(patch);
        guard.clone()
    }

    /// Whether an utterance is audibly playing right now.
    pub fn is_speaking(&self) -> bool {
        let pb = self.playback.lock();
        pb.speaking && !pb.paused
    }

    pub fn is_paused(&self) -> bool {
        self.playback.lock().paused
    }

    /// Start narrating `text`, preempting any active utterance.
    ///
    /// No-op (returns `None`) when unsupported, when narration is disabled
    /// in settings, or when the text is blank. The returned receiver
    /// resolves when the engine reports the utterance over; `None` also
    /// means the engine has no completion signal and the caller should
    /// estimate the duration instead.
    pub async fn speak(
        &self,
        text: &str,
        overrides: &SynthesisOptions,
    ) -> Option<oneshot::Receiver<()>> {
        if !self.supported {
            return None;
        }
        let settings = self.settings.read().clone();
        if !settings.enabled {
            debug!("Narration disabled; dropping utterance");
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let params = self.effective_params(&settings, overrides);

        let mut engine = self.engine.lock().await;
        let preempting = self.playback.lock().speaking;
        if preempting {
            if let Err(e) = engine.stop().await {
                warn!("Failed to preempt active utterance: {}", e);
            }
        }
        self.start_utterance(&mut **engine, text, params).await
    }

    /// Cancel the active utterance. Idempotent.
    pub async fn stop(&self) {
        if !self.supported {
            return;
        }
        let mut engine = self.engine.lock().await;
        if let Err(e) = engine.stop().await {
            warn!("Engine stop failed: {}", e);
        }
        let mut pb = self.playback.lock();
        pb.speaking = false;
        pb.paused = false;
        // A withheld completion is over now; dropping the sender reports it
        pb.pending_done = None;
    }

    /// Pause the active utterance. No-op if nothing is playing.
    ///
    /// Engines without in-place pause have the utterance silenced instead;
    /// `resume` then restarts it from the beginning (platform limitation).
    pub async fn pause(&self) {
        if !self.supported {
            return;
        }
        {
            let pb = self.playback.lock();
            if !pb.speaking || pb.paused {
                return;
            }
        }
        let mut engine = self.engine.lock().await;
        match engine.pause().await {
            Ok(()) => {
                let mut pb = self.playback.lock();
                pb.paused = true;
                pb.resume_in_place = true;
            }
            Err(TtsError::PauseUnsupported) => {
                // Flags go first so the completion watcher sees the stop as
                // a pause, not as the utterance ending
                {
                    let mut pb = self.playback.lock();
                    pb.paused = true;
                    pb.resume_in_place = false;
                }
                if let Err(e) = engine.stop().await {
                    warn!("Failed to silence utterance for pause: {}", e);
                }
            }
            Err(e) => warn!("Engine pause failed: {}", e),
        }
    }

    /// Resume a paused utterance. No-op if nothing is paused.
    pub async fn resume(&self) {
        if !self.supported {
            return;
        }
        let (in_place, text, params) = {
            let pb = self.playback.lock();
            if !pb.paused {
                return;
            }
            (pb.resume_in_place, pb.text.clone(), pb.params.clone())
        };
        let mut engine = self.engine.lock().await;
        if in_place {
            if let Err(e) = engine.resume().await {
                warn!("Engine resume failed: {}", e);
                return;
            }
            self.playback.lock().paused = false;
        } else if let Some(params) = params {
            let withheld = self.playback.lock().pending_done.take();
            let restarted = self.start_utterance(&mut **engine, &text, params).await;
            if let Some(done_tx) = withheld {
                match restarted {
                    // The original utterance is over when its restart is
                    Some(next) => {
                        tokio::spawn(async move {
                            let _ = next.await;
                            let _ = done_tx.send(());
                        });
                    }
                    None => drop(done_tx),
                }
            }
        }
    }

    fn effective_params(
        &self,
        settings: &AccessibilitySettings,
        overrides: &SynthesisOptions,
    ) -> UtteranceParams {
        UtteranceParams {
            // The locale is never overridable per utterance
            language: self.locale.clone(),
            voice: overrides.voice.clone(),
            rate: overrides.rate.unwrap_or(settings.voice_rate).clamp(0.1, 10.0),
            pitch: overrides
                .pitch
                .unwrap_or(settings.voice_pitch)
                .clamp(0.0, 2.0),
            volume: overrides
                .volume
                .unwrap_or(settings.voice_volume)
                .clamp(0.0, 1.0),
        }
    }

    async fn start_utterance(
        &self,
        engine: &mut dyn SpeechEngine,
        text: &str,
        params: UtteranceParams,
    ) -> Option<oneshot::Receiver<()>> {
        match engine.speak(text, &params).await {
            Ok(handle) => {
                let id = handle.utterance_id;
                {
                    let mut pb = self.playback.lock();
                    pb.utterance_id = id;
                    pb.speaking = true;
                    pb.paused = false;
                    pb.resume_in_place = false;
                    // Preempting ends whatever utterance was silenced
                    pb.pending_done = None;
                    pb.text = text.to_string();
                    pb.params = Some(params);
                }
                handle.completion.map(|rx| {
                    let (done_tx, done_rx) = oneshot::channel();
                    let playback = Arc::clone(&self.playback);
                    tokio::spawn(async move {
                        // Resolves on finish or cancellation; a dropped
                        // sender counts as over too.
                        let _ = rx.await;
                        let mut done_tx = Some(done_tx);
                        {
                            let mut pb = playback.lock();
                            if pb.utterance_id == id {
                                if pb.paused && !pb.resume_in_place {
                                    // The stop behind a pause fired this;
                                    // hold the signal for the resumed run
                                    pb.pending_done = done_tx.take();
                                } else if !pb.paused {
                                    pb.speaking = false;
                                }
                            }
                        }
                        if let Some(tx) = done_tx {
                            let _ = tx.send(());
                        }
                    });
                    done_rx
                })
            }
            Err(e) => {
                warn!("Synthesis failed: {}", e);
                None
            }
        }
    }
}
