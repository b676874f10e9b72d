use std::io::{self, Write};

use crate::capability::CapabilityError;

/// "Round ended" notification. Best effort: callers log failures and move on.
pub trait CompletionSignal {
    fn notify_round_complete(&mut self) -> Result<(), CapabilityError>;
}

/// Rings the terminal bell
pub struct TerminalBell<W: Write> {
    out: W,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CompletionSignal for TerminalBell<W> {
    fn notify_round_complete(&mut self) -> Result<(), CapabilityError> {
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

/// No sound at all (`--mute`)
pub struct Silent;

impl CompletionSignal for Silent {
    fn notify_round_complete(&mut self) -> Result<(), CapabilityError> {
        Ok(())
    }
}
