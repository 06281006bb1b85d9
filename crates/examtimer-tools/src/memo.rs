//! Free-text memo pad.

use examtimer_core::traits::Resettable;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoPad {
    text: String,
}

impl MemoPad {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Append a line, inserting a newline separator when needed.
    pub fn push_line(&mut self, line: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

impl Resettable for MemoPad {
    fn reset(&mut self) {
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_line_separates_entries() {
        let mut memo = MemoPad::default();
        memo.push_line("a = 3");
        memo.push_line("b = 7");
        assert_eq!(memo.text(), "a = 3\nb = 7");
        assert_eq!(memo.lines().count(), 2);
        memo.reset();
        assert!(memo.is_empty());
    }
}
