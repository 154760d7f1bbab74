//! Input and output capabilities handed to the interpreter
//!
//! The interpreter never touches stdin/stdout directly; hosts pick an
//! implementation (console, scripted answers for tests, captured output).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::rc::Rc;

/// Answers `ask` prompts
pub trait InputProvider {
    /// Ask the user; `None` when no answer is available
    fn prompt(&mut self, message: &str) -> Option<String>;
}

/// Receives every line printed by `say`
pub trait OutputSink {
    fn print(&mut self, line: &str);
}

/// Console I/O on stdin/stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdIo;

impl InputProvider for StdIo {
    fn prompt(&mut self, message: &str) -> Option<String> {
        prompt_line(&mut std::io::stdin().lock(), &mut std::io::stdout(), message)
    }
}

/// Show `message` on `writer` and read one line from `reader`
///
/// A prompt that can't be shown gets no answer.
fn prompt_line(reader: &mut impl BufRead, writer: &mut impl Write, message: &str) -> Option<String> {
    if let Err(e) = write!(writer, "{}", message).and_then(|_| writer.flush()) {
        tracing::debug!(error = %e, "cannot show prompt");
        return None;
    }

    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "cannot read answer");
            None
        }
    }
}

impl OutputSink for StdIo {
    fn print(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Discards output and never has input
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl InputProvider for Silent {
    fn prompt(&mut self, _message: &str) -> Option<String> {
        None
    }
}

impl OutputSink for Silent {
    fn print(&mut self, _line: &str) {}
}

/// Pre-recorded answers, handed out in order
///
/// Clones share the same answers and prompt log, so a host can keep one
/// handle and give the other to the interpreter.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    answers: Rc<RefCell<VecDeque<String>>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Rc::new(RefCell::new(answers.into_iter().map(Into::into).collect())),
            prompts: Rc::default(),
        }
    }

    /// Prompts seen so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl InputProvider for ScriptedInput {
    fn prompt(&mut self, message: &str) -> Option<String> {
        self.prompts.borrow_mut().push(message.to_string());
        self.answers.borrow_mut().pop_front()
    }
}

/// Collects printed lines into a buffer the host keeps a handle to
#[derive(Debug, Default, Clone)]
pub struct CapturedOutput {
    lines: Rc<RefCell<Vec<String>>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl OutputSink for CapturedOutput {
    fn print(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}
