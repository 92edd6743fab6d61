//! Speech output abstraction layer for railtalk
//!
//! This crate provides the accessibility settings model, the `SpeechEngine`
//! trait implemented by platform synthesizers, and the `SpeechOutput`
//! controller that enforces the one-utterance-at-a-time playback contract.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod engine;
pub mod error;
pub mod output;
pub mod types;

pub use engine::{NullEngine, SpeechEngine, UtteranceHandle};
pub use error::{TtsError, TtsResult};
pub use output::SpeechOutput;
pub use types::{
    AccessibilitySettings, PageAnnouncement, SettingsPatch, SynthesisOptions, UtteranceParams,
    SETTINGS_KEY,
};

/// Generates unique utterance IDs
static UTTERANCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique utterance ID
pub fn next_utterance_id() -> u64 {
    UTTERANCE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}
