//! Deterministic keyword matcher
//!
//! Pure, synchronous transcript matching over a fixed keyword table, with
//! Indonesian phrases first and English equivalents alongside. First match
//! in table order wins, so more specific phrases sit above generic ones.

use crate::{AppCommand, CommandInterpreter, InterpretError, Screen};
use async_trait::async_trait;

/// One row of the matching table: any keyword hit maps to the command.
struct Rule {
    keywords: &'static [&'static str],
    command: AppCommand,
}

pub struct KeywordInterpreter {
    rules: Vec<Rule>,
}

impl KeywordInterpreter {
    pub fn new() -> Self {
        let rules = vec![
            Rule {
                keywords: &["berhenti", "hentikan suara", "stop sound", "stop all", "diam"],
                command: AppCommand::StopAllSound,
            },
            Rule {
                keywords: &["kereta bandara", "airport train", "bandara"],
                command: AppCommand::Navigate(Screen::AirportTrain),
            },
            Rule {
                keywords: &["commuter", "krl", "kereta lokal"],
                command: AppCommand::Navigate(Screen::CommuterLine),
            },
            Rule {
                keywords: &["lrt"],
                command: AppCommand::Navigate(Screen::Lrt),
            },
            Rule {
                keywords: &["beli tiket", "pesan tiket", "book ticket", "antar kota", "intercity"],
                command: AppCommand::Navigate(Screen::IntercityBooking),
            },
            Rule {
                keywords: &["tiket saya", "my tickets", "tiketku"],
                command: AppCommand::Navigate(Screen::MyTickets),
            },
            Rule {
                keywords: &["rencana perjalanan", "trip planner", "rencanakan"],
                command: AppCommand::Navigate(Screen::TripPlanner),
            },
            Rule {
                keywords: &["pengaturan", "settings", "setelan"],
                command: AppCommand::Navigate(Screen::Settings),
            },
            Rule {
                keywords: &["beranda", "home", "menu utama"],
                command: AppCommand::Navigate(Screen::Home),
            },
            Rule {
                keywords: &["kembali", "back"],
                command: AppCommand::Back,
            },
            Rule {
                keywords: &["baca halaman", "read page", "baca layar"],
                command: AppCommand::ReadPage,
            },
            Rule {
                keywords: &["bantuan", "help", "tolong"],
                command: AppCommand::Help,
            },
        ];
        Self { rules }
    }

    /// Pure matching core, usable without an async context.
    pub fn match_transcript(&self, transcript: &str) -> Option<AppCommand> {
        let normalized = transcript.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| normalized.contains(k)))
            .map(|rule| rule.command.clone())
    }
}

impl Default for KeywordInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandInterpreter for KeywordInterpreter {
    async fn interpret(&self, transcript: &str) -> Result<Option<AppCommand>, InterpretError> {
        Ok(self.match_transcript(transcript))
    }
}
