//! Arbiter state and timing policy

use railtalk_tts::SynthesisOptions;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Observable phase of the arbitration state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterPhase {
    /// Neither capturing nor narrating
    Idle,
    /// A voice-command capture session is open
    Listening,
    /// Narration is playing
    Speaking,
    /// Both requested: narration paused, listening continues
    ListeningWhileSpeechPaused,
}

/// Tunable delays of the arbitration policy.
#[derive(Debug, Clone)]
pub struct ArbiterTimings {
    /// Settling delay between a voice command ending and the first queued
    /// announcement, so narration does not overlap mic teardown
    pub drain_settle: Duration,
    /// Cool-down after narration ends before the microphone is re-enabled,
    /// so the mic does not capture the synthesizer's audio tail
    pub mic_cooldown: Duration,
    /// Floor for estimated utterance durations
    pub min_estimate: Duration,
    /// Speaking speed assumed when estimating utterance durations
    pub words_per_second: f32,
}

impl Default for ArbiterTimings {
    fn default() -> Self {
        Self {
            drain_settle: Duration::from_millis(500),
            mic_cooldown: Duration::from_secs(1),
            min_estimate: Duration::from_secs(2),
            words_per_second: 2.5,
        }
    }
}

/// Estimate how long narrating `text` will take.
///
/// Used only when the engine has no completion event; the word-count
/// heuristic stands in for it.
pub fn estimate_speech_duration(text: &str, timings: &ArbiterTimings) -> Duration {
    let words = text.split_whitespace().count().max(1);
    let estimated = Duration::from_secs_f32(words as f32 / timings.words_per_second);
    estimated.max(timings.min_estimate)
}

/// A narration deferred because a voice command was active.
pub(crate) struct QueuedAnnouncement {
    pub text: String,
    pub options: SynthesisOptions,
}

/// Outstanding timer tasks, retained so a reset can actually cancel them
/// instead of merely masking their effects.
#[derive(Default)]
pub(crate) struct TimerSet {
    pub speech_end: Option<JoinHandle<()>>,
    pub cooldown: Option<JoinHandle<()>>,
    pub drain: Option<JoinHandle<()>>,
    pub page_delay: Option<JoinHandle<()>>,
}

impl TimerSet {
    pub fn abort_all(&mut self) {
        for handle in [
            self.speech_end.take(),
            self.cooldown.take(),
            self.drain.take(),
            self.page_delay.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

#[derive(Default)]
pub(crate) struct ArbiterState {
    pub voice_command_active: bool,
    pub accessibility_speaking: bool,
    pub paused_by_voice: bool,
    pub pending: VecDeque<QueuedAnnouncement>,
    /// A drain timer is outstanding; guards against double drains
    pub drain_scheduled: bool,
    /// Bumped on every hard reset; timer callbacks from an older epoch
    /// must not touch state
    pub epoch: u64,
    pub timers: TimerSet,
}

impl ArbiterState {
    pub fn phase(&self) -> ArbiterPhase {
        match (
            self.voice_command_active,
            self.paused_by_voice,
            self.accessibility_speaking,
        ) {
            (true, true, _) => ArbiterPhase::ListeningWhileSpeechPaused,
            (true, false, _) => ArbiterPhase::Listening,
            (false, _, true) => ArbiterPhase::Speaking,
            _ => ArbiterPhase::Idle,
        }
    }
}
