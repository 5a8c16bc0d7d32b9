use crate::errors::{Error, Result};
use crate::ui::ansi::{STYLE_BOLD, STYLE_RESET};
use std::io::{BufRead, Write};

/// Yes/no questions on the operator's terminal. Only the CLI layer asks.
#[derive(Debug, Default, Clone)]
pub struct Prompter;

impl Prompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks until the answer is `y`/`yes` or `n`/`no`. End of input counts
    /// as no.
    pub fn confirm_with_reader<R: BufRead, W: Write>(
        &self,
        question: &str,
        mut reader: R,
        mut out: W,
    ) -> Result<bool> {
        loop {
            write!(out, "{STYLE_BOLD}{question} [y/n]{STYLE_RESET} ").map_err(Error::Io)?;
            out.flush().map_err(Error::Io)?;

            let mut line = String::new();
            if reader.read_line(&mut line).map_err(Error::Io)? == 0 {
                writeln!(out).map_err(Error::Io)?;
                return Ok(false);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(out, "Please answer 'y' or 'n'.").map_err(Error::Io)?,
            }
        }
    }
}
