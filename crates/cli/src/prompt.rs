//! Line-based interactive prompts
//!
//! Generic over the reader and writer so tests drive them with in-memory
//! buffers.

use owo_colors::{OwoColorize, Stream};
use std::io::{self, BufRead, Write};

/// Raw answers for the three build inputs, untrimmed of meaning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInputs {
    /// Application display name
    pub app_name: String,
    /// Website URL
    pub url: String,
    /// Icon file path
    pub icon_path: String,
}

/// Asks questions on `output` and reads answers from `input`
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Prompter over arbitrary streams
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one line, trimmed.
    ///
    /// End of input is an error: the run cannot continue without an answer.
    pub fn ask(&mut self, label: &str) -> io::Result<String> {
        write!(
            self.output,
            "{} ",
            format!("?> {}:", label).if_supports_color(Stream::Stdout, |t| t.cyan())
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("No answer for '{}'", label),
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Use `given` when present, otherwise ask
    pub fn ask_if_missing(&mut self, given: Option<String>, label: &str) -> io::Result<String> {
        match given {
            Some(value) => Ok(value),
            None => self.ask(label),
        }
    }

    /// Collect name, URL and icon path in that order, asking only for missing ones
    pub fn build_inputs(
        &mut self,
        app_name: Option<String>,
        url: Option<String>,
        icon_path: Option<String>,
    ) -> io::Result<BuildInputs> {
        Ok(BuildInputs {
            app_name: self.ask_if_missing(app_name, "App Name")?,
            url: self.ask_if_missing(url, "Website URL")?,
            icon_path: self.ask_if_missing(icon_path, "Path to Icon (png/jpg)")?,
        })
    }
}
