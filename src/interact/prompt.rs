//! Yes/no confirmation prompts

use crate::error::{IoResultExt, Result};
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Check whether an answer counts as "yes" (`y` or `yes`, any case).
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Something that can ask the user a yes/no question
pub trait Prompter {
    /// Ask `question`; `Ok(true)` only on an affirmative answer.
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Prompter over a line-oriented reader and a writer (stdin/stdout in the CLI)
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Create a prompter reading answers from `input` and writing questions to `output`
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompter<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompter attached to the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{} ", question).with_path("<stdout>")?;
        self.output.flush().with_path("<stdout>")?;

        let mut answer = String::new();
        let read = self.input.read_line(&mut answer).with_path("<stdin>")?;
        if read == 0 {
            // EOF: nobody is there to say yes.
            writeln!(self.output).with_path("<stdout>")?;
            return Ok(false);
        }

        Ok(is_affirmative(&answer))
    }
}

/// Prompter that answers yes to everything (`--yes`)
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        tracing::info!("{} yes (assumed)", question);
        Ok(true)
    }
}

/// Prompter with pre-recorded answers, recording every question asked
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Questions asked so far
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    /// Create a prompter that replies with `answers` in order, then "n"
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked.push(question.to_string());
        let answer = self.answers.pop_front().unwrap_or_else(|| "n".to_string());
        Ok(is_affirmative(&answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_is_affirmative() {
        for yes in ["y", "Y", "yes", "YES", " Yes \n"] {
            assert!(is_affirmative(yes), "{:?}", yes);
        }
        for no in ["", "n", "no", "yep", "ye", "y e s", "1"] {
            assert!(!is_affirmative(no), "{:?}", no);
        }
    }

    #[test]
    fn test_line_prompter() {
        let mut out = Vec::new();
        let mut prompter = LinePrompter::new(Cursor::new("yes\nno\n"), &mut out);

        assert!(prompter.confirm("OK to run?").unwrap());
        assert!(!prompter.confirm("Again?").unwrap());
        assert!(!prompter.confirm("At EOF?").unwrap());

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("OK to run? Again? "));
    }

    #[test]
    fn test_scripted_prompter_defaults_to_no() {
        let mut prompter = ScriptedPrompter::new(["y"]);
        assert!(prompter.confirm("first").unwrap());
        assert!(!prompter.confirm("second").unwrap());
        assert_eq!(prompter.asked, vec!["first", "second"]);
    }
}
