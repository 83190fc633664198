//! Cursor over the command words.
//!
//! Commands are keyword driven: a handler walks its words left to right,
//! matching keywords case-insensitively and taking values verbatim.

use crate::error::{GamError, GamResult};

#[derive(Debug, Clone, Default)]
pub struct Words {
    words: Vec<String>,
    pos: usize,
}

impl Words {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            pos: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.words.len()
    }

    pub fn len(&self) -> usize {
        self.words.len().saturating_sub(self.pos)
    }

    pub fn peek(&self) -> Option<&str> {
        self.words.get(self.pos).map(String::as_str)
    }

    /// Lowercased next word, without consuming it.
    pub fn peek_keyword(&self) -> Option<String> {
        self.peek().map(str::to_lowercase)
    }

    pub fn next_word(&mut self) -> Option<String> {
        let word = self.words.get(self.pos).cloned();
        if word.is_some() {
            self.pos += 1;
        }
        word
    }

    /// Next word lowercased, for keyword matching.
    pub fn next_keyword(&mut self) -> Option<String> {
        self.next_word().map(|w| w.to_lowercase())
    }

    /// Next word or a usage error naming what was expected.
    pub fn require(&mut self, what: &str) -> GamResult<String> {
        self.next_word()
            .ok_or_else(|| GamError::usage(format!("Error: expected {}", what)))
    }

    pub fn require_keyword(&mut self, what: &str) -> GamResult<String> {
        self.require(what).map(|w| w.to_lowercase())
    }

    /// Value following `keyword`.
    pub fn value_for(&mut self, keyword: &str) -> GamResult<String> {
        self.require(&format!("a value after {}", keyword))
    }

    /// Consumes the next word if it equals `keyword` (case-insensitive).
    pub fn eat(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(w) if w.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Remaining words, consuming them.
    pub fn rest(&mut self) -> Vec<String> {
        let rest = self.words[self.pos.min(self.words.len())..].to_vec();
        self.pos = self.words.len();
        rest
    }
}

/// Parses an `on`/`off` toggle.
pub fn on_off(value: &str, setting: &str) -> GamResult<bool> {
    on_off_code(value, setting, 2)
}

pub fn on_off_code(value: &str, setting: &str, code: i32) -> GamResult<bool> {
    match value.to_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(GamError::usage_code(
            format!("Error: value for {} must be on or off, got {}", setting, value),
            code,
        )),
    }
}

/// Parses a `true`/`false` toggle.
pub fn true_false(value: &str, setting: &str) -> GamResult<bool> {
    true_false_code(value, setting, 2)
}

pub fn true_false_code(value: &str, setting: &str, code: i32) -> GamResult<bool> {
    match value.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(GamError::usage_code(
            format!("Error: value for {} must be true or false, got {}", setting, value),
            code,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_case_insensitive_values_verbatim() {
        let mut w = Words::new(["FirstName", "John", "LASTNAME", "McDonald"]);
        assert_eq!(w.next_keyword().as_deref(), Some("firstname"));
        assert_eq!(w.value_for("firstname").unwrap(), "John");
        assert!(w.eat("lastname"));
        assert_eq!(w.require("last name").unwrap(), "McDonald");
        assert!(w.is_empty());
        assert_eq!(w.require("anything").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn toggles_accept_exactly_two_tokens() {
        assert!(on_off("ON", "imap").unwrap());
        assert!(!on_off("off", "imap").unwrap());
        assert!(on_off("true", "imap").is_err());
        assert!(on_off("yes", "imap").is_err());
        assert!(true_false("True", "hidden").unwrap());
        assert!(true_false("on", "hidden").is_err());
        assert_eq!(true_false_code("maybe", "selected", 4).unwrap_err().exit_code(), 4);
    }
}
