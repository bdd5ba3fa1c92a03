//! Host I/O collaborators used by the `print` and `input` builtins.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Receives the display strings of one `print` call.
pub trait OutputSink {
    fn write_line(&mut self, values: &[String]) -> io::Result<()>;
}

/// Supplies one line of text per `input` call.
pub trait InputSource {
    /// Returns the next line without its terminator. End of input is an
    /// `UnexpectedEof` error.
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<String>;
}

/// Process stdout/stdin.
#[derive(Debug, Default)]
pub struct StdConsole;

impl OutputSink for StdConsole {
    fn write_line(&mut self, values: &[String]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", values.join(" "))
    }
}

impl InputSource for StdConsole {
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<String> {
        if let Some(prompt) = prompt {
            let mut stdout = io::stdout().lock();
            write!(stdout, "{prompt}")?;
            stdout.flush()?;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed while waiting for input",
            ));
        }
        Ok(trim_line_ending(line))
    }
}

/// Collects printed lines in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    lines: Vec<String>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl OutputSink for CapturedOutput {
    fn write_line(&mut self, values: &[String]) -> io::Result<()> {
        self.lines.push(values.join(" "));
        Ok(())
    }
}

/// Replays a fixed list of input lines and records the prompts it was shown.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self, prompt: Option<&str>) -> io::Result<String> {
        if let Some(prompt) = prompt {
            self.prompts.push(prompt.to_string());
        }
        self.lines.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted input left")
        })
    }
}

fn trim_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
