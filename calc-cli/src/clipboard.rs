use std::io::{self, Write};

use calc_core::presentation::{Clipboard, ClipboardError};

/// Terminal stand-in for the system clipboard: the copied block is written
/// between markers so it can be selected by hand.
pub struct StdoutClipboard<W: Write = io::Stdout> {
    out: W,
}

impl StdoutClipboard {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutClipboard<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Clipboard for StdoutClipboard<W> {
    fn write_text(
        &mut self,
        text: &str,
    ) -> Result<(), ClipboardError> {
        writeln!(self.out, "----- copy -----\n{text}\n----------------")
            .and_then(|()| self.out.flush())
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}
