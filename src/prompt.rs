/// Interactive choice prompts, kept behind a trait so the report pipeline
/// never touches the console directly.
use std::io::{BufRead, Write};

/// Errors produced while prompting.
#[derive(Debug)]
pub enum PromptError {
    Io(std::io::Error),
    /// Input ended before a valid choice was made.
    Closed,
    /// There was nothing to choose from.
    NoChoices,
}

impl std::fmt::Display for PromptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptError::Io(e) => write!(f, "I/O error while prompting: {e}"),
            PromptError::Closed => write!(f, "input closed before a choice was made"),
            PromptError::NoChoices => write!(f, "no choices available"),
        }
    }
}

impl std::error::Error for PromptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PromptError::Io(e) => Some(e),
            PromptError::Closed | PromptError::NoChoices => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(e: std::io::Error) -> Self {
        PromptError::Io(e)
    }
}

/// Asks the user to pick one of N named choices.
pub trait Prompter {
    /// Returns the 0-based index of the chosen entry.
    fn choose(&mut self, title: &str, choices: &[String]) -> Result<usize, PromptError>;
}

/// Numbered-menu prompter over any line reader and writer.
///
/// Choices are shown 1-indexed. Anything that is not a number in range is
/// answered with a hint and the question is asked again.
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[allow(dead_code)]
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl ConsolePrompter<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn choose(&mut self, title: &str, choices: &[String]) -> Result<usize, PromptError> {
        if choices.is_empty() {
            return Err(PromptError::NoChoices);
        }

        writeln!(self.output, "{title}")?;
        for (i, choice) in choices.iter().enumerate() {
            writeln!(self.output, "{}. {choice}", i + 1)?;
        }

        let count = choices.len();
        loop {
            write!(self.output, "Enter a number (1-{count}): ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(PromptError::Closed);
            }

            match line.trim().parse::<usize>() {
                Ok(n) if (1..=count).contains(&n) => {
                    tracing::debug!(choice = %choices[n - 1], "menu selection");
                    return Ok(n - 1);
                }
                Ok(_) => writeln!(self.output, "Please enter a number between 1 and {count}.")?,
                Err(_) => writeln!(self.output, "Invalid input. Please enter a valid number.")?,
            }
        }
    }
}
