//! Voice/accessibility arbitration for railtalk
//!
//! One `VoiceArbiter` instance per running application owns the audio
//! channel policy: the microphone is never left listening to the device's
//! own narration, and narration never interrupts an in-progress voice
//! command. Narration requested while a command is being captured is
//! queued and drained in order afterwards.

pub mod announce;
pub mod arbiter;
pub mod state;

pub use arbiter::VoiceArbiter;
pub use state::{estimate_speech_duration, ArbiterPhase, ArbiterTimings};
