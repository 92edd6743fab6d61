//! Announcement helpers
//!
//! Thin wrappers that format a narration string and funnel it through the
//! arbiter. Errors are read slower, confirmations slightly faster, and
//! page announcements wait out the configured delay so a freshly
//! navigated screen can finish rendering first.

use crate::arbiter::{Inner, VoiceArbiter};
use railtalk_tts::{PageAnnouncement, SynthesisOptions};
use std::sync::Arc;

/// Rate multiplier applied to error narrations.
const ERROR_RATE_FACTOR: f32 = 0.8;
/// Rate multiplier applied to success narrations.
const SUCCESS_RATE_FACTOR: f32 = 1.15;

impl VoiceArbiter {
    fn scaled_rate(&self, factor: f32) -> f32 {
        (self.inner.speech.settings().voice_rate * factor).clamp(0.1, 10.0)
    }

    /// Narrate a focused UI element.
    pub async fn announce_element(&self, label: &str) {
        self.announce(label, SynthesisOptions::default()).await;
    }

    /// Narrate an action the user just triggered.
    pub async fn announce_action(&self, action: &str) {
        self.announce(action, SynthesisOptions::default()).await;
    }

    /// Narrate an error, slowed down for clarity.
    pub async fn announce_error(&self, message: &str) {
        let options = SynthesisOptions {
            rate: Some(self.scaled_rate(ERROR_RATE_FACTOR)),
            ..Default::default()
        };
        self.announce(format!("Terjadi kesalahan. {}", message), options)
            .await;
    }

    /// Narrate a success confirmation, slightly sped up.
    pub async fn announce_success(&self, message: &str) {
        let options = SynthesisOptions {
            rate: Some(self.scaled_rate(SUCCESS_RATE_FACTOR)),
            ..Default::default()
        };
        self.announce(message, options).await;
    }

    /// Narrate a page after the configured announcement delay.
    ///
    /// A newer navigation supersedes a pending one; `force_stop_all`
    /// cancels it outright.
    pub fn announce_page(&self, page: &PageAnnouncement) {
        let text = page.narration();
        if text.is_empty() {
            return;
        }
        let delay = self.inner.speech.settings().announcement_delay();
        let epoch = self.inner.state.lock().epoch;
        let task_inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let st = task_inner.state.lock();
                if st.epoch != epoch {
                    return;
                }
            }
            Inner::enqueue_or_speak(&task_inner, text, SynthesisOptions::default()).await;
        });
        Inner::store_timer(&self.inner, epoch, |timers| &mut timers.page_delay, handle);
    }
}
