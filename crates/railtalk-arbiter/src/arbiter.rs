//! The arbitration manager
//!
//! Best-effort mutual exclusion over the audio channel. All transitions
//! are synchronous flag updates; the only asynchrony is the set of timer
//! tasks (speech end, mic cool-down, queue drain, page delay), every one
//! of which is retained as an abortable handle and double-guarded by an
//! epoch check so a reset can never be undone by a stale callback.

use crate::state::{
    estimate_speech_duration, ArbiterPhase, ArbiterState, ArbiterTimings, QueuedAnnouncement,
};
use parking_lot::Mutex;
use railtalk_tts::{SpeechOutput, SynthesisOptions};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

pub(crate) struct Inner {
    pub speech: Arc<SpeechOutput>,
    pub state: Mutex<ArbiterState>,
    pub timings: ArbiterTimings,
    suppressed_tx: watch::Sender<bool>,
}

/// Process-wide arbitration between narration output and voice-command
/// capture. Construct exactly one at bootstrap and share it by cloning.
#[derive(Clone)]
pub struct VoiceArbiter {
    pub(crate) inner: Arc<Inner>,
}

impl VoiceArbiter {
    pub fn new(speech: Arc<SpeechOutput>) -> Self {
        Self::with_timings(speech, ArbiterTimings::default())
    }

    pub fn with_timings(speech: Arc<SpeechOutput>, timings: ArbiterTimings) -> Self {
        let (suppressed_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                speech,
                state: Mutex::new(ArbiterState::default()),
                timings,
                suppressed_tx,
            }),
        }
    }

    pub fn speech(&self) -> &Arc<SpeechOutput> {
        &self.inner.speech
    }

    pub fn phase(&self) -> ArbiterPhase {
        self.inner.state.lock().phase()
    }

    pub fn voice_command_active(&self) -> bool {
        self.inner.state.lock().voice_command_active
    }

    /// Whether narration currently owns the audio channel from the
    /// arbiter's perspective.
    pub fn is_app_speaking(&self) -> bool {
        self.inner.state.lock().accessibility_speaking
    }

    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    pub fn pending_texts(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .pending
            .iter()
            .map(|q| q.text.clone())
            .collect()
    }

    /// Current value of the mic-suppression flag.
    pub fn is_suppressed(&self) -> bool {
        *self.inner.suppressed_tx.borrow()
    }

    /// Subscribe to mic-suppression changes. The recognizer-owning UI
    /// disables its microphone affordance while the value is true.
    pub fn subscribe_suppressed(&self) -> watch::Receiver<bool> {
        self.inner.suppressed_tx.subscribe()
    }

    /// A speech-to-text capture session opened.
    ///
    /// Idempotent. If narration is playing it is paused (not cancelled)
    /// and resumed when the command ends.
    pub async fn start_voice_command(&self) {
        if !self.inner.speech.settings().voice_enabled {
            debug!("Voice commands disabled in settings");
            return;
        }
        let pause_narration = {
            let mut st = self.inner.state.lock();
            if st.voice_command_active {
                return;
            }
            st.voice_command_active = true;
            if st.accessibility_speaking {
                st.paused_by_voice = true;
            }
            st.paused_by_voice
        };
        debug!(pause_narration, "Voice command session opened");
        if pause_narration {
            self.inner.speech.pause().await;
        }
    }

    /// The capture session closed (recognizer finished or was dismissed).
    ///
    /// Resumes narration paused for the command, then drains any queued
    /// announcements FIFO after a settling delay. Idempotent: calling it
    /// without a matching start is a no-op.
    pub async fn end_voice_command(&self) {
        let (resume_narration, drain) = {
            let mut st = self.inner.state.lock();
            if !st.voice_command_active {
                return;
            }
            st.voice_command_active = false;
            let resume = st.paused_by_voice;
            st.paused_by_voice = false;
            let drain = !st.pending.is_empty() && !st.drain_scheduled;
            if drain {
                st.drain_scheduled = true;
            }
            (resume, drain)
        };
        debug!(resume_narration, drain, "Voice command session closed");
        if resume_narration {
            self.inner.speech.resume().await;
        }
        if drain {
            Inner::schedule_drain(&self.inner);
        }
    }

    /// Request an accessibility narration.
    ///
    /// Queued (FIFO) while a voice command is active, spoken immediately
    /// otherwise. Never errors: with no usable speech capability the
    /// state flags still move through the same transitions.
    pub async fn announce(&self, text: impl Into<String>, options: SynthesisOptions) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        Inner::enqueue_or_speak(&self.inner, text, options).await;
    }

    /// Hard reset: abort every outstanding timer, clear all flags and the
    /// pending queue, cut off audio, and re-enable the microphone.
    pub async fn force_stop_all(&self) {
        info!("Force-stopping all narration and voice capture");
        {
            let mut st = self.inner.state.lock();
            st.epoch += 1;
            st.timers.abort_all();
            st.voice_command_active = false;
            st.accessibility_speaking = false;
            st.paused_by_voice = false;
            st.drain_scheduled = false;
            st.pending.clear();
        }
        self.inner.speech.stop().await;
        self.inner.set_suppressed(false);
    }

    /// Drop queued announcements without touching anything else.
    pub fn clear_pending(&self) {
        self.inner.state.lock().pending.clear();
    }
}

impl Inner {
    pub(crate) fn set_suppressed(&self, suppressed: bool) {
        self.suppressed_tx.send_if_modified(|current| {
            if *current != suppressed {
                *current = suppressed;
                true
            } else {
                false
            }
        });
    }

    /// Queue the announcement if a command is being captured, else speak it.
    pub(crate) async fn enqueue_or_speak(
        inner: &Arc<Inner>,
        text: String,
        options: SynthesisOptions,
    ) {
        {
            let mut st = inner.state.lock();
            if st.voice_command_active {
                debug!("Deferring announcement behind voice command: {:?}", text);
                st.pending.push_back(QueuedAnnouncement { text, options });
                return;
            }
        }
        Inner::announce_now(inner, text, options).await;
    }

    /// Speak immediately, preempting any current narration, and arm the
    /// end-of-speech timer. Prefers the engine's real completion event;
    /// without one the word-count estimate stands in.
    async fn announce_now(inner: &Arc<Inner>, text: String, options: SynthesisOptions) {
        let epoch = {
            let mut st = inner.state.lock();
            st.accessibility_speaking = true;
            if let Some(old) = st.timers.speech_end.take() {
                old.abort();
            }
            st.epoch
        };
        inner.set_suppressed(true);

        let completion = inner.speech.speak(&text, &options).await;
        let estimate = estimate_speech_duration(&text, &inner.timings);
        debug!(?estimate, has_completion = completion.is_some(), "Narrating: {:?}", text);

        let task_inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            match completion {
                Some(done) => {
                    let _ = done.await;
                }
                None => tokio::time::sleep(estimate).await,
            }
            Inner::end_accessibility_speech(&task_inner, epoch).await;
        });
        Inner::store_timer(inner, epoch, |timers| &mut timers.speech_end, handle);
    }

    /// Narration is over: drop the speaking flag, give the microphone back
    /// after the cool-down, and continue draining the queue.
    async fn end_accessibility_speech(inner: &Arc<Inner>, epoch: u64) {
        let drain = {
            let mut st = inner.state.lock();
            if st.epoch != epoch {
                return;
            }
            st.accessibility_speaking = false;
            let drain =
                !st.pending.is_empty() && !st.voice_command_active && !st.drain_scheduled;
            if drain {
                st.drain_scheduled = true;
            }
            drain
        };

        let task_inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(task_inner.timings.mic_cooldown).await;
            let clear = {
                let st = task_inner.state.lock();
                // A newer narration may own the channel again by now
                st.epoch == epoch && !st.accessibility_speaking
            };
            if clear {
                task_inner.set_suppressed(false);
            }
        });
        Inner::store_timer(inner, epoch, |timers| &mut timers.cooldown, handle);

        if drain {
            Inner::schedule_drain(inner);
        }
    }

    /// Arm the drain timer: after the settle delay, pop the oldest queued
    /// announcement and speak it under the usual arbitration.
    pub(crate) fn schedule_drain(inner: &Arc<Inner>) {
        let epoch = inner.state.lock().epoch;
        let task_inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(task_inner.timings.drain_settle).await;
            let next = {
                let mut st = task_inner.state.lock();
                if st.epoch != epoch {
                    return;
                }
                st.drain_scheduled = false;
                if st.voice_command_active {
                    // A new capture session grabbed the channel; the queue
                    // waits for its end_voice_command
                    return;
                }
                st.pending.pop_front()
            };
            if let Some(queued) = next {
                Inner::announce_now(&task_inner, queued.text, queued.options).await;
            }
        });
        Inner::store_timer(inner, epoch, |timers| &mut timers.drain, handle);
    }

    /// Retain a timer handle, aborting the one it replaces. If a reset
    /// happened since `epoch` was read the new timer is dead on arrival.
    pub(crate) fn store_timer(
        inner: &Arc<Inner>,
        epoch: u64,
        slot: impl FnOnce(&mut crate::state::TimerSet) -> &mut Option<tokio::task::JoinHandle<()>>,
        handle: tokio::task::JoinHandle<()>,
    ) {
        let mut st = inner.state.lock();
        if st.epoch != epoch {
            handle.abort();
            return;
        }
        if let Some(old) = slot(&mut st.timers).replace(handle) {
            old.abort();
        }
    }
}
