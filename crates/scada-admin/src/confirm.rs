//! Operator confirmation for destructive operations.

use std::io::{self, BufRead, Write};

pub trait Confirmer: Send + Sync {
    /// Yes/no question. Anything but `y`/`yes` declines.
    fn confirm(&self, prompt: &str) -> bool;

    /// The operator must type `expected` exactly.
    fn confirm_typed(&self, prompt: &str, expected: &str) -> bool;
}

/// Prompts on stderr and reads answers from stdin.
pub struct StdinConfirmer;

impl StdinConfirmer {
    fn ask(prompt: &str) -> Option<String> {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{prompt} ");
        let _ = stderr.flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        Self::ask(&format!("{prompt} [y/N]"))
            .map(|answer| is_yes(&answer))
            .unwrap_or(false)
    }

    fn confirm_typed(&self, prompt: &str, expected: &str) -> bool {
        Self::ask(prompt).is_some_and(|answer| answer == expected)
    }
}

/// `--yes`: every confirmation passes.
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }

    fn confirm_typed(&self, _prompt: &str, _expected: &str) -> bool {
        true
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned answers in order; an exhausted script declines.
    #[derive(Default)]
    pub struct ScriptedConfirmer {
        answers: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedConfirmer {
        pub fn new<'a>(answers: impl IntoIterator<Item = &'a str>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().map(str::to_string).collect()),
                prompts: Mutex::default(),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        fn next(&self, prompt: &str) -> Option<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers.lock().unwrap().pop_front()
        }
    }

    impl Confirmer for ScriptedConfirmer {
        fn confirm(&self, prompt: &str) -> bool {
            self.next(prompt).is_some_and(|a| is_yes(&a))
        }

        fn confirm_typed(&self, prompt: &str, expected: &str) -> bool {
            self.next(prompt).is_some_and(|a| a == expected)
        }
    }
}
