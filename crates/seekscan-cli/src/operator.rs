//! Operators reading answers from the terminal or answering on their own.

use std::io::{self, BufRead, Write};

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::Operator;

/// Prompts on stdout and reads one line from stdin per question.
#[derive(Debug, Default)]
pub struct StdinOperator;

impl Operator for StdinOperator {
    fn prompt(&mut self, message: &str) -> Result<String, SeekError> {
        let mut stdout = io::stdout();
        write!(stdout, "{message}")
            .and_then(|_| stdout.flush())
            .map_err(|err| SeekError::persistence("stdout-write", err, "<stdout>"))?;
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|err| SeekError::persistence("stdin-read", err, "<stdin>"))?;
        if read == 0 {
            return Err(SeekError::Abort(ErrorInfo::new(
                "stdin-closed",
                "input closed while waiting for the operator",
            )));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Answers every prompt with a fixed reply.
#[derive(Debug, Clone)]
pub struct FixedOperator {
    reply: String,
}

impl FixedOperator {
    /// Operator that always answers `reply`.
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Operator for FixedOperator {
    fn prompt(&mut self, message: &str) -> Result<String, SeekError> {
        tracing::debug!(prompt = message.trim(), reply = %self.reply, "unattended answer");
        Ok(self.reply.clone())
    }
}
