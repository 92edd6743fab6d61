//! Primary-with-fallback interpretation
//!
//! Wraps a primary interpreter (typically the remote AI call) so that a
//! backend failure or a no-match answer is retried against the local
//! keyword table instead of surfacing to the user.

use crate::{AppCommand, CommandInterpreter, InterpretError, KeywordInterpreter};
use async_trait::async_trait;
use tracing::{debug, warn};

pub struct FallbackInterpreter {
    primary: Box<dyn CommandInterpreter>,
    fallback: KeywordInterpreter,
}

impl FallbackInterpreter {
    pub fn new(primary: Box<dyn CommandInterpreter>) -> Self {
        Self {
            primary,
            fallback: KeywordInterpreter::new(),
        }
    }
}

#[async_trait]
impl CommandInterpreter for FallbackInterpreter {
    async fn interpret(&self, transcript: &str) -> Result<Option<AppCommand>, InterpretError> {
        match self.primary.interpret(transcript).await {
            Ok(Some(command)) => Ok(Some(command)),
            Ok(None) => {
                debug!("Primary interpreter matched nothing; trying keyword table");
                Ok(self.fallback.match_transcript(transcript))
            }
            Err(e) => {
                warn!("Primary interpreter failed ({}); using keyword table", e);
                Ok(self.fallback.match_transcript(transcript))
            }
        }
    }
}
