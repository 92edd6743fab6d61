//! railtalk demo binary
//!
//! Wires the arbitration stack end to end: persisted settings, an espeak
//! engine when available (silent otherwise), the arbiter, and the keyword
//! interpreter. Stdin lines stand in for recognizer transcripts; lines
//! starting with ':' are control commands.

mod screens;

use anyhow::Result;
use clap::Parser;
use railtalk_arbiter::VoiceArbiter;
use railtalk_command::{
    AppCommand, CommandInterpreter, FallbackInterpreter, KeywordInterpreter, Screen,
};
use railtalk_foundation::{load_or_default, save, JsonFileStore};
use railtalk_tts::{
    AccessibilitySettings, NullEngine, SettingsPatch, SpeechEngine, SpeechOutput, SETTINGS_KEY,
};
use railtalk_tts_espeak::EspeakEngine;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "railtalk",
    about = "Voice-command / talkback arbitration demo for the train-ticketing client"
)]
struct Args {
    /// Directory holding persisted settings
    #[arg(long, default_value = ".railtalk")]
    data_dir: String,

    /// Narration locale
    #[arg(long, default_value = "id-ID")]
    locale: String,

    /// Use the silent engine even if espeak is installed
    #[arg(long)]
    no_audio: bool,
}

async fn pick_engine(no_audio: bool) -> Box<dyn SpeechEngine> {
    if no_audio {
        return Box::new(NullEngine::new());
    }
    let espeak = EspeakEngine::new();
    if espeak.is_available().await {
        info!("Using espeak speech engine");
        Box::new(espeak)
    } else {
        warn!("espeak not found; narration will be silent");
        Box::new(NullEngine::new())
    }
}

struct Session {
    arbiter: VoiceArbiter,
    interpreter: FallbackInterpreter,
    store: JsonFileStore,
    current: Screen,
    history: Vec<Screen>,
}

impl Session {
    async fn handle_transcript(&mut self, transcript: &str) {
        if self.arbiter.is_suppressed() {
            // The recognizer-owning UI checks this flag before accepting
            // input; emulate that contract here.
            println!("(mikrofon nonaktif: narasi sedang berjalan)");
            return;
        }
        self.arbiter.start_voice_command().await;
        let command = self.interpreter.interpret(transcript).await;
        self.arbiter.end_voice_command().await;

        match command {
            Ok(Some(command)) => self.dispatch(command).await,
            Ok(None) => {
                self.arbiter
                    .announce_error("Perintah tidak dikenali. Ucapkan bantuan untuk daftar perintah")
                    .await;
            }
            Err(e) => {
                warn!("Interpretation failed: {}", e);
                self.arbiter
                    .announce_error("Perintah tidak dapat diproses")
                    .await;
            }
        }
    }

    async fn dispatch(&mut self, command: AppCommand) {
        match command {
            AppCommand::Navigate(screen) => {
                if screen != self.current {
                    self.history.push(self.current);
                    self.current = screen;
                }
                println!("-> {}", screens::title(screen));
                self.arbiter.announce_page(&screens::page_for(screen));
            }
            AppCommand::Back => match self.history.pop() {
                Some(previous) => {
                    self.current = previous;
                    println!("-> {}", screens::title(previous));
                    self.arbiter.announce_page(&screens::page_for(previous));
                }
                None => {
                    self.arbiter
                        .announce_error("Tidak ada halaman sebelumnya")
                        .await;
                }
            },
            AppCommand::ReadPage => {
                self.arbiter.announce_page(&screens::page_for(self.current));
            }
            AppCommand::Help => {
                self.arbiter
                    .announce_element(
                        "Perintah yang tersedia: beli tiket, commuter line, LRT, \
                         kereta bandara, tiket saya, rencana perjalanan, pengaturan, \
                         kembali, baca halaman, berhenti",
                    )
                    .await;
            }
            AppCommand::StopAllSound => {
                self.arbiter.force_stop_all().await;
                println!("(semua suara dihentikan)");
            }
        }
    }

    async fn handle_control(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let keyword = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("").trim();

        match keyword {
            ":quit" => return false,
            ":stop" => self.arbiter.force_stop_all().await,
            ":status" => {
                println!(
                    "phase={:?} pending={} suppressed={} screen={}",
                    self.arbiter.phase(),
                    self.arbiter.pending_len(),
                    self.arbiter.is_suppressed(),
                    screens::title(self.current),
                );
            }
            ":rate" => match value.parse::<f32>() {
                Ok(rate) => {
                    self.update_settings(SettingsPatch {
                        voice_rate: Some(rate),
                        ..Default::default()
                    });
                }
                Err(_) => println!("usage: :rate <0.1-10.0>"),
            },
            ":volume" => match value.parse::<f32>() {
                Ok(volume) => {
                    self.update_settings(SettingsPatch {
                        voice_volume: Some(volume),
                        ..Default::default()
                    });
                }
                Err(_) => println!("usage: :volume <0.0-1.0>"),
            },
            ":talkback" => {
                let enabled = !self.arbiter.speech().settings().enabled;
                self.update_settings(SettingsPatch {
                    enabled: Some(enabled),
                    ..Default::default()
                });
                println!("talkback {}", if enabled { "on" } else { "off" });
            }
            ":voice" => {
                let enabled = !self.arbiter.speech().settings().voice_enabled;
                self.update_settings(SettingsPatch {
                    voice_enabled: Some(enabled),
                    ..Default::default()
                });
                println!("voice commands {}", if enabled { "on" } else { "off" });
            }
            _ => println!("commands: :status :stop :rate :volume :talkback :voice :quit"),
        }
        true
    }

    fn update_settings(&self, patch: SettingsPatch) {
        let merged = self.arbiter.speech().apply_patch(&patch);
        if let Err(e) = save(&self.store, SETTINGS_KEY, &merged) {
            warn!("Failed to persist settings: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let store = JsonFileStore::new(&args.data_dir)?;
    let settings: AccessibilitySettings = load_or_default(&store, SETTINGS_KEY);
    info!("Loaded settings: {:?}", settings);

    let engine = pick_engine(args.no_audio).await;
    let speech = Arc::new(SpeechOutput::new(engine, args.locale, settings).await);
    let arbiter = VoiceArbiter::new(speech);

    // The production client plugs its remote AI interpreter in as the
    // primary; the keyword table then only serves as the fallback.
    let interpreter = FallbackInterpreter::new(Box::new(KeywordInterpreter::new()));

    let mut session = Session {
        arbiter: arbiter.clone(),
        interpreter,
        store,
        current: Screen::Home,
        history: Vec::new(),
    };

    println!("railtalk - ketik transkrip suara, atau :help untuk kontrol");
    arbiter.announce_page(&screens::page_for(Screen::Home));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(':') {
            if !session.handle_control(line).await {
                break;
            }
        } else {
            session.handle_transcript(line).await;
        }
    }

    arbiter.force_stop_all().await;
    info!("railtalk shut down");
    Ok(())
}
