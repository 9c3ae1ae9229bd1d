//! Line-oriented console for the menu protocol
//!
//! Wraps any `BufRead`/`Write` pair so every interactive flow can be driven
//! from in-memory buffers in tests. Output is styled through the `Palette`
//! the console was constructed with.

use crate::theme::{Palette, Role};
use std::io::{self, BufRead, Write};

pub struct Console<R: BufRead, W: Write> {
    input: R,
    output: W,
    palette: Palette,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, palette: Palette) -> Self {
        Self {
            input,
            output,
            palette,
        }
    }

    /// Consume the console, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Print `message`, then read one trimmed line. `None` on end of input.
    pub fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        let styled = self.palette.paint(Role::Accent, message);
        write!(self.output, "{} ", styled)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Print a plain line.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// Print a line in the colour for `role`.
    pub fn styled(&mut self, role: Role, text: &str) -> io::Result<()> {
        let painted = self.palette.paint(role, text);
        writeln!(self.output, "{}", painted)
    }

    pub fn header(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output)?;
        self.styled(Role::Header, &format!("== {} ==", title))
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        self.styled(Role::Success, &format!("✓ {}", text))
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        self.styled(Role::Warning, &format!("! {}", text))
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.styled(Role::Error, &format!("✗ {}", text))
    }

    /// Print a tool's raw diagnostic block verbatim, indented.
    pub fn diagnostic(&mut self, raw: &str) -> io::Result<()> {
        for line in raw.lines() {
            writeln!(self.output, "    {}", line)?;
        }
        Ok(())
    }

    /// Print a numbered menu entry.
    pub fn option(&mut self, key: &str, label: &str) -> io::Result<()> {
        let key = self.palette.paint(Role::Accent, key);
        writeln!(self.output, "  {}) {}", key, label)
    }

    pub fn paint(&self, role: Role, text: &str) -> String {
        self.palette.paint(role, text)
    }
}
