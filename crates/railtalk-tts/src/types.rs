//! Core types for the accessibility speech layer

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Well-known persistence key for the accessibility settings blob.
pub const SETTINGS_KEY: &str = "accessibility_settings";

/// Accessibility narration and voice-command settings.
///
/// Always available: the application starts from `Default` and merges the
/// persisted blob on top, so there is no "unset" state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilitySettings {
    /// Master switch for talkback narration
    pub enabled: bool,
    /// Master switch for voice-command capture
    pub voice_enabled: bool,
    /// Delay before a freshly navigated page is announced, in milliseconds
    pub announcement_delay_ms: u64,
    /// Speaking rate multiplier (0.1-10.0, 1.0 is normal)
    pub voice_rate: f32,
    /// Voice pitch (0.0-2.0, 1.0 is normal)
    pub voice_pitch: f32,
    /// Volume (0.0-1.0)
    pub voice_volume: f32,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            voice_enabled: true,
            announcement_delay_ms: 1000,
            voice_rate: 1.0,
            voice_pitch: 1.0,
            voice_volume: 1.0,
        }
    }
}

impl AccessibilitySettings {
    /// Clamp numeric fields into their supported ranges.
    pub fn clamped(mut self) -> Self {
        self.voice_rate = self.voice_rate.clamp(0.1, 10.0);
        self.voice_pitch = self.voice_pitch.clamp(0.0, 2.0);
        self.voice_volume = self.voice_volume.clamp(0.0, 1.0);
        self
    }

    /// Merge a partial update onto these settings, clamping the result.
    pub fn apply(mut self, patch: &SettingsPatch) -> Self {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(voice_enabled) = patch.voice_enabled {
            self.voice_enabled = voice_enabled;
        }
        if let Some(delay) = patch.announcement_delay_ms {
            self.announcement_delay_ms = delay;
        }
        if let Some(rate) = patch.voice_rate {
            self.voice_rate = rate;
        }
        if let Some(pitch) = patch.voice_pitch {
            self.voice_pitch = pitch;
        }
        if let Some(volume) = patch.voice_volume {
            self.voice_volume = volume;
        }
        self.clamped()
    }

    pub fn announcement_delay(&self) -> Duration {
        Duration::from_millis(self.announcement_delay_ms)
    }
}

/// Partial settings update coming from the settings UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub voice_enabled: Option<bool>,
    pub announcement_delay_ms: Option<u64>,
    pub voice_rate: Option<f32>,
    pub voice_pitch: Option<f32>,
    pub voice_volume: Option<f32>,
}

/// Per-utterance overrides for individual announcements
#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    /// Override speaking rate for this utterance
    pub rate: Option<f32>,
    /// Override pitch for this utterance
    pub pitch: Option<f32>,
    /// Override volume for this utterance
    pub volume: Option<f32>,
    /// Preferred engine voice id (the language is still forced to the
    /// application locale)
    pub voice: Option<String>,
}

/// Fully resolved parameters handed to a `SpeechEngine`.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceParams {
    /// BCP-47-ish language tag, always the application locale
    pub language: String,
    /// Engine voice id, if the caller requested one
    pub voice: Option<String>,
    /// Speaking rate multiplier (clamped to 0.1-10.0)
    pub rate: f32,
    /// Pitch (clamped to 0.0-2.0)
    pub pitch: f32,
    /// Volume (clamped to 0.0-1.0)
    pub volume: f32,
}

/// Narration payload built by a screen when it becomes active.
///
/// Consumed once: formatted into a single narration string and discarded.
#[derive(Debug, Clone, Default)]
pub struct PageAnnouncement {
    pub page_title: String,
    pub page_description: String,
    pub available_actions: Vec<String>,
    pub voice_instructions: String,
}

impl PageAnnouncement {
    /// Flatten the announcement into the text actually narrated.
    pub fn narration(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.page_title.is_empty() {
            parts.push(self.page_title.clone());
        }
        if !self.page_description.is_empty() {
            parts.push(self.page_description.clone());
        }
        if !self.available_actions.is_empty() {
            // Narration language is the application locale (Indonesian)
            parts.push(format!(
                "Tindakan yang tersedia: {}",
                self.available_actions.join(", ")
            ));
        }
        if !self.voice_instructions.is_empty() {
            parts.push(self.voice_instructions.clone());
        }
        parts.join(". ")
    }
}
