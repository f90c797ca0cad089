//! Write confirmation
//!
//! The last step before touching the card is asking the user. The prompt
//! is behind a trait so the pipeline can be driven non-interactively.

use std::io::{self, BufRead, Write};

use log::warn;

/// Decides whether the pending write goes ahead
pub trait Confirmation {
    /// Ask for permission; `message` describes what is about to happen
    fn confirm(&mut self, message: &str) -> io::Result<bool>;
}

impl<C: Confirmation + ?Sized> Confirmation for Box<C> {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        (**self).confirm(message)
    }
}

/// Always agrees (`--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&mut self, _message: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Interactive y/n prompt
///
/// Surrounding whitespace is ignored. Anything other than `y` or `n` is
/// answered by asking again. End of input counts as `n`.
pub struct PromptConfirmation<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirmation<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the terminal
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirmation for PromptConfirmation<R, W> {
    fn confirm(&mut self, message: &str) -> io::Result<bool> {
        let mut line = String::new();
        loop {
            write!(self.output, "{} (y/n): ", message)?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                warn!("No answer on input, treating as no");
                return Ok(false);
            }

            match line.trim() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n")?,
            }
        }
    }
}
