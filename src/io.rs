//! Collaborators the VM talks to for program I/O
//!
//! The VM never touches stdin/stdout directly. `printf` goes through an
//! [`Output`], `scanf` through an [`InputProvider`], so a terminal, a GUI
//! or a test fixture can stand behind either.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use tracing::warn;

/// Receives program output, once per print instruction, in execution order
pub trait Output {
    fn emit(&mut self, text: &str);
}

/// Answers input requests. `None` means no input is available; the VM then
/// falls back to the default value for the requested kind.
pub trait InputProvider {
    fn request(&mut self, prompt: &str) -> Option<String>;
}

/// Writes straight to stdout
#[derive(Debug, Default)]
pub struct StdoutOutput;

impl Output for StdoutOutput {
    fn emit(&mut self, text: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            warn!(error = %e, "failed to write program output");
        }
    }
}

/// Keeps every emitted piece
#[derive(Debug, Default, Clone)]
pub struct BufferedOutput {
    pieces: Vec<String>,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each emit call, separately
    pub fn pieces(&self) -> &[String] {
        &self.pieces
    }

    /// Everything emitted, concatenated
    pub fn text(&self) -> String {
        self.pieces.concat()
    }
}

impl Output for BufferedOutput {
    fn emit(&mut self, text: &str) {
        self.pieces.push(text.to_string());
    }
}

/// Prompts on stderr and reads one line from stdin
#[derive(Debug, Default)]
pub struct StdinInput;

impl InputProvider for StdinInput {
    fn request(&mut self, prompt: &str) -> Option<String> {
        eprint!("{}", prompt);
        let _ = io::stderr().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
            Err(e) => {
                warn!(error = %e, "failed to read input");
                None
            }
        }
    }
}

/// Replays canned answers and records the prompts it was given
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl InputProvider for ScriptedInput {
    fn request(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front()
    }
}
