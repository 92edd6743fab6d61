//! Arbitration integration tests
//!
//! Run under tokio's paused clock so every timer (speech-end estimate,
//! drain settle, mic cool-down, page delay) fires deterministically.

use async_trait::async_trait;
use parking_lot::Mutex;
use railtalk_arbiter::{ArbiterPhase, VoiceArbiter};
use railtalk_tts::{
    AccessibilitySettings, SpeechEngine, SpeechOutput, SynthesisOptions, TtsError, TtsResult,
    UtteranceHandle, UtteranceParams,
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{sleep, Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Speak { text: String, rate: f32, at: Instant },
    Stop,
    Pause,
    Resume,
}

/// Recording engine with no completion event, so the arbiter must rely on
/// the word-count duration estimate.
struct RecordingEngine {
    calls: Arc<Mutex<Vec<Call>>>,
    available: bool,
    can_pause: bool,
}

#[async_trait]
impl SpeechEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn speak(&mut self, text: &str, params: &UtteranceParams) -> TtsResult<UtteranceHandle> {
        self.calls.lock().push(Call::Speak {
            text: text.to_string(),
            rate: params.rate,
            at: Instant::now(),
        });
        Ok(UtteranceHandle {
            utterance_id: railtalk_tts::next_utterance_id(),
            completion: None,
        })
    }

    async fn stop(&mut self) -> TtsResult<()> {
        self.calls.lock().push(Call::Stop);
        Ok(())
    }

    async fn pause(&mut self) -> TtsResult<()> {
        if !self.can_pause {
            return Err(TtsError::PauseUnsupported);
        }
        self.calls.lock().push(Call::Pause);
        Ok(())
    }

    async fn resume(&mut self) -> TtsResult<()> {
        self.calls.lock().push(Call::Resume);
        Ok(())
    }
}

/// Engine that reports real completion events under the espeak contract:
/// stopping kills the playback and resolves the event, and pause is
/// unsupported, so the controller silences and later restarts instead.
struct KillToStopEngine {
    calls: Arc<Mutex<Vec<Call>>>,
    current: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[async_trait]
impl SpeechEngine for KillToStopEngine {
    fn name(&self) -> &str {
        "kill-to-stop"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn speak(&mut self, text: &str, params: &UtteranceParams) -> TtsResult<UtteranceHandle> {
        self.calls.lock().push(Call::Speak {
            text: text.to_string(),
            rate: params.rate,
            at: Instant::now(),
        });
        let (tx, rx) = oneshot::channel();
        *self.current.lock() = Some(tx);
        Ok(UtteranceHandle {
            utterance_id: railtalk_tts::next_utterance_id(),
            completion: Some(rx),
        })
    }

    async fn stop(&mut self) -> TtsResult<()> {
        self.calls.lock().push(Call::Stop);
        if let Some(tx) = self.current.lock().take() {
            let _ = tx.send(());
        }
        Ok(())
    }

    async fn pause(&mut self) -> TtsResult<()> {
        Err(TtsError::PauseUnsupported)
    }

    async fn resume(&mut self) -> TtsResult<()> {
        Ok(())
    }
}

type CurrentUtterance = Arc<Mutex<Option<oneshot::Sender<()>>>>;

async fn arbiter_with_completion() -> (VoiceArbiter, Arc<Mutex<Vec<Call>>>, CurrentUtterance) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let current: CurrentUtterance = Arc::new(Mutex::new(None));
    let engine = KillToStopEngine {
        calls: Arc::clone(&calls),
        current: Arc::clone(&current),
    };
    let speech = Arc::new(
        SpeechOutput::new(
            Box::new(engine),
            "id-ID",
            AccessibilitySettings::default(),
        )
        .await,
    );
    (VoiceArbiter::new(speech), calls, current)
}

/// The playback finished on its own.
fn finish_playback(current: &CurrentUtterance) {
    if let Some(tx) = current.lock().take() {
        let _ = tx.send(());
    }
}

async fn arbiter_with(available: bool, can_pause: bool) -> (VoiceArbiter, Arc<Mutex<Vec<Call>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let engine = RecordingEngine {
        calls: Arc::clone(&calls),
        available,
        can_pause,
    };
    let speech = Arc::new(
        SpeechOutput::new(
            Box::new(engine),
            "id-ID",
            AccessibilitySettings::default(),
        )
        .await,
    );
    (VoiceArbiter::new(speech), calls)
}

fn speak_times(calls: &[Call]) -> Vec<(String, Instant)> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Speak { text, at, .. } => Some((text.clone(), *at)),
            _ => None,
        })
        .collect()
}

fn speak_rates(calls: &[Call]) -> Vec<f32> {
    calls
        .iter()
        .filter_map(|c| match c {
            Call::Speak { rate, .. } => Some(*rate),
            _ => None,
        })
        .collect()
}

fn count(calls: &[Call], probe: &Call) -> usize {
    calls.iter().filter(|c| *c == probe).count()
}

#[tokio::test(start_paused = true)]
async fn voice_command_pauses_narration_and_resumes_after() {
    let (arbiter, calls) = arbiter_with(true, true).await;

    arbiter
        .announce("Selamat datang di aplikasi kereta", SynthesisOptions::default())
        .await;
    assert!(arbiter.is_app_speaking());
    assert_eq!(arbiter.phase(), ArbiterPhase::Speaking);

    arbiter.start_voice_command().await;
    assert_eq!(arbiter.phase(), ArbiterPhase::ListeningWhileSpeechPaused);
    // Idempotent: a second start must not double-pause
    arbiter.start_voice_command().await;
    assert_eq!(count(&calls.lock(), &Call::Pause), 1);

    arbiter.end_voice_command().await;
    assert_eq!(count(&calls.lock(), &Call::Resume), 1);
    assert_eq!(arbiter.phase(), ArbiterPhase::Speaking);
    assert!(!arbiter.voice_command_active());
}

#[tokio::test(start_paused = true)]
async fn announcements_queue_while_listening_and_drain_fifo() {
    let (arbiter, calls) = arbiter_with(true, true).await;

    arbiter.start_voice_command().await;
    arbiter.announce("Halaman beranda", SynthesisOptions::default()).await;
    arbiter.announce("Tiket ditemukan", SynthesisOptions::default()).await;
    arbiter.announce("Silakan pilih jadwal", SynthesisOptions::default()).await;

    // Nothing is narrated while the capture session is open
    assert!(speak_times(&calls.lock()).is_empty());
    assert_eq!(arbiter.pending_len(), 3);

    arbiter.end_voice_command().await;
    sleep(Duration::from_secs(9)).await;

    let spoken = speak_times(&calls.lock());
    let texts: Vec<&str> = spoken.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(
        texts,
        ["Halaman beranda", "Tiket ditemukan", "Silakan pilih jadwal"]
    );
    // One at a time: each narration gets at least its 2-second floor
    for pair in spoken.windows(2) {
        let gap = pair[1].1.duration_since(pair[0].1);
        assert!(gap >= Duration::from_secs(2), "overlap window: {:?}", gap);
    }
    assert_eq!(arbiter.pending_len(), 0);
    assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn double_success_announcement_queues_twice_then_plays_both() {
    let (arbiter, calls) = arbiter_with(true, true).await;

    arbiter.start_voice_command().await;
    arbiter.announce("Berhasil", SynthesisOptions::default()).await;
    arbiter.announce("Berhasil", SynthesisOptions::default()).await;
    assert_eq!(arbiter.pending_texts(), ["Berhasil", "Berhasil"]);

    arbiter.end_voice_command().await;
    sleep(Duration::from_secs(6)).await;

    let spoken = speak_times(&calls.lock());
    assert_eq!(spoken.len(), 2);
    let gap = spoken[1].1.duration_since(spoken[0].1);
    assert!(gap >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn completion_event_ends_narration_before_the_estimate() {
    let (arbiter, _calls, current) = arbiter_with_completion().await;

    // Ten words would be estimated at four seconds
    arbiter
        .announce(
            "satu dua tiga empat lima enam tujuh delapan sembilan sepuluh",
            SynthesisOptions::default(),
        )
        .await;
    sleep(Duration::from_millis(100)).await;
    assert!(arbiter.is_app_speaking());

    finish_playback(&current);
    sleep(Duration::from_millis(50)).await;
    assert!(!arbiter.is_app_speaking());
    assert!(arbiter.is_suppressed());

    // Only the cool-down remains, well inside the estimate window
    sleep(Duration::from_millis(1000)).await;
    assert!(!arbiter.is_suppressed());
}

#[tokio::test(start_paused = true)]
async fn silenced_narration_stays_tracked_across_a_voice_command() {
    let (arbiter, calls, current) = arbiter_with_completion().await;

    arbiter
        .announce("Selamat datang di aplikasi kereta", SynthesisOptions::default())
        .await;
    assert!(arbiter.is_app_speaking());

    // Pausing on this engine kills the playback, which fires its
    // completion event; that must not count as the narration ending
    arbiter.start_voice_command().await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(arbiter.phase(), ArbiterPhase::ListeningWhileSpeechPaused);
    assert!(arbiter.is_app_speaking());

    arbiter.end_voice_command().await;
    sleep(Duration::from_millis(50)).await;
    // Restarted from the beginning, still tracked, microphone still off
    assert!(arbiter.speech().is_speaking());
    assert!(arbiter.is_app_speaking());
    assert!(arbiter.is_suppressed());
    assert_eq!(count(&calls.lock(), &Call::Stop), 1);

    finish_playback(&current);
    sleep(Duration::from_millis(50)).await;
    assert!(!arbiter.is_app_speaking());
    sleep(Duration::from_millis(1000)).await;
    assert!(!arbiter.is_suppressed());
    assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn cleared_queue_drains_to_nothing() {
    let (arbiter, calls) = arbiter_with(true, true).await;

    arbiter.start_voice_command().await;
    arbiter.announce("Halaman beranda", SynthesisOptions::default()).await;
    arbiter.announce("Tiket ditemukan", SynthesisOptions::default()).await;
    assert_eq!(arbiter.pending_len(), 2);

    arbiter.clear_pending();
    assert_eq!(arbiter.pending_len(), 0);

    arbiter.end_voice_command().await;
    sleep(Duration::from_secs(5)).await;
    assert!(speak_times(&calls.lock()).is_empty());
    assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn error_and_success_narrations_adjust_the_rate() {
    let (arbiter, calls) = arbiter_with(true, true).await;

    arbiter.announce_error("Jadwal tidak ditemukan").await;
    arbiter.announce_success("Tiket berhasil dipesan").await;

    let spoken = speak_times(&calls.lock());
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[0].0, "Terjadi kesalahan. Jadwal tidak ditemukan");
    assert_eq!(spoken[1].0, "Tiket berhasil dipesan");

    // Errors are read slower, confirmations faster (default rate 1.0)
    let rates = speak_rates(&calls.lock());
    assert!((rates[0] - 0.8).abs() < f32::EPSILON);
    assert!((rates[1] - 1.15).abs() < f32::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn end_without_start_is_harmless() {
    let (arbiter, calls) = arbiter_with(true, true).await;

    arbiter.end_voice_command().await;
    arbiter.end_voice_command().await;

    assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
    assert!(!arbiter.voice_command_active());
    assert!(calls.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn force_stop_all_resets_everything() {
    let (arbiter, calls) = arbiter_with(true, true).await;

    arbiter.start_voice_command().await;
    arbiter.announce("Halaman beranda", SynthesisOptions::default()).await;
    arbiter.announce("Tiket ditemukan", SynthesisOptions::default()).await;
    arbiter.end_voice_command().await;
    // The drain timer is armed but has not fired yet
    arbiter.force_stop_all().await;

    assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
    assert!(!arbiter.voice_command_active());
    assert!(!arbiter.is_app_speaking());
    assert_eq!(arbiter.pending_len(), 0);
    assert!(!arbiter.is_suppressed());

    // Long after every cancelled timer would have fired: still quiet
    sleep(Duration::from_secs(10)).await;
    assert!(speak_times(&calls.lock()).is_empty());
    assert_eq!(arbiter.phase(), ArbiterPhase::Idle);
    assert!(!arbiter.is_suppressed());
}

#[tokio::test(start_paused = true)]
async fn stale_timers_cannot_unsuppress_a_new_narration() {
    let (arbiter, _calls) = arbiter_with(true, true).await;

    arbiter.announce("Halaman beranda", SynthesisOptions::default()).await;
    sleep(Duration::from_millis(500)).await;
    arbiter.force_stop_all().await;

    // New narration right after the reset; ten words, so it runs 4 seconds
    arbiter
        .announce(
            "satu dua tiga empat lima enam tujuh delapan sembilan sepuluh",
            SynthesisOptions::default(),
        )
        .await;
    assert!(arbiter.is_suppressed());

    // The first narration's timers would have fired inside this window
    sleep(Duration::from_millis(3000)).await;
    assert!(arbiter.is_app_speaking());
    assert!(arbiter.is_suppressed());

    // The new narration's own end plus cool-down releases the mic
    sleep(Duration::from_millis(2600)).await;
    assert!(!arbiter.is_app_speaking());
    assert!(!arbiter.is_suppressed());
}

#[tokio::test(start_paused = true)]
async fn microphone_suppressed_until_cooldown_elapses() {
    let (arbiter, _calls) = arbiter_with(true, true).await;
    let rx = arbiter.subscribe_suppressed();
    assert!(!*rx.borrow());

    arbiter.announce("halo dunia", SynthesisOptions::default()).await;
    assert!(arbiter.is_suppressed());
    assert!(*rx.borrow());

    // Estimated duration elapsed, but the cool-down has not
    sleep(Duration::from_millis(2100)).await;
    assert!(!arbiter.is_app_speaking());
    assert!(arbiter.is_suppressed());

    sleep(Duration::from_millis(1000)).await;
    assert!(!arbiter.is_suppressed());
    assert!(!*rx.borrow());
}

#[tokio::test(start_paused = true)]
async fn unsupported_capability_keeps_state_consistent() {
    let (arbiter, calls) = arbiter_with(false, true).await;
    assert!(!arbiter.speech().is_supported());

    arbiter.announce("Selamat datang", SynthesisOptions::default()).await;
    // No audio, but the same state transitions
    assert!(arbiter.is_app_speaking());
    assert!(arbiter.is_suppressed());
    assert!(calls.lock().is_empty());

    sleep(Duration::from_millis(3100)).await;
    assert!(!arbiter.is_app_speaking());
    // The microphone is never left permanently disabled
    assert!(!arbiter.is_suppressed());
}

#[tokio::test(start_paused = true)]
async fn disabled_voice_commands_never_open_a_session() {
    let (arbiter, calls) = arbiter_with(true, true).await;
    arbiter.speech().set_settings(AccessibilitySettings {
        voice_enabled: false,
        ..Default::default()
    });

    arbiter.start_voice_command().await;
    assert!(!arbiter.voice_command_active());

    // With no session open, announcements speak immediately
    arbiter.announce("Halaman beranda", SynthesisOptions::default()).await;
    assert_eq!(speak_times(&calls.lock()).len(), 1);
    assert_eq!(arbiter.pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn page_announcement_waits_for_the_configured_delay() {
    let (arbiter, calls) = arbiter_with(true, true).await;
    let page = railtalk_tts::PageAnnouncement {
        page_title: "Beranda".into(),
        page_description: "Menu utama aplikasi tiket kereta".into(),
        available_actions: vec!["Beli tiket".into()],
        voice_instructions: "Ucapkan beli tiket untuk memulai".into(),
    };

    arbiter.announce_page(&page);
    // Default announcement delay is one second
    sleep(Duration::from_millis(900)).await;
    assert!(speak_times(&calls.lock()).is_empty());

    sleep(Duration::from_millis(200)).await;
    let spoken = speak_times(&calls.lock());
    assert_eq!(spoken.len(), 1);
    assert!(spoken[0].0.starts_with("Beranda"));
}
