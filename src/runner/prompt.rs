//! Interactive prompting
//!
//! The prompter is injected into the orchestrator so tests can script
//! answers. Non-interactive runs never reach the prompter: the orchestrator
//! resolves defaults itself.

use crate::error::{TaskError, TaskResult};
use std::io::{self, BufRead, Write};

/// Source of interactive answers
pub trait Prompter {
    /// Ask for a line of input; an empty line means "use the default"
    fn prompt(&mut self, question: &str, default: Option<&str>) -> TaskResult<String>;

    /// Ask a yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> TaskResult<bool>;
}

/// Prompter reading from the terminal's stdin
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn read_line(&self) -> TaskResult<String> {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| TaskError::PromptIo(e.to_string()))?;
        Ok(line.trim().to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, question: &str, default: Option<&str>) -> TaskResult<String> {
        match default {
            Some(d) if !d.is_empty() => eprint!("{} [{}] ", question, d),
            _ => eprint!("{} ", question),
        }
        let _ = io::stderr().flush();

        let answer = self.read_line()?;
        if answer.is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer)
    }

    fn confirm(&mut self, question: &str, default: bool) -> TaskResult<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        eprint!("{} [{}] ", question, hint);
        let _ = io::stderr().flush();

        let answer = self.read_line()?.to_lowercase();
        Ok(match answer.as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}

/// Prompter with pre-scripted answers, for tests
///
/// Answers are consumed in order; an empty scripted answer falls back to the
/// default, mirroring a user pressing enter.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Vec<String>,
    next: usize,
    /// Questions asked, in order
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        ScriptedPrompter {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            next: 0,
            asked: Vec::new(),
        }
    }

    fn take(&mut self, question: &str) -> String {
        self.asked.push(question.to_string());
        let answer = self.answers.get(self.next).cloned().unwrap_or_default();
        self.next += 1;
        answer
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, question: &str, default: Option<&str>) -> TaskResult<String> {
        let answer = self.take(question);
        if answer.is_empty() {
            return Ok(default.unwrap_or_default().to_string());
        }
        Ok(answer)
    }

    fn confirm(&mut self, question: &str, default: bool) -> TaskResult<bool> {
        let answer = self.take(question).to_lowercase();
        Ok(match answer.as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}
