//! Arithmetic scratch calculator.
//!
//! Expressions are restricted to `0-9 + - * / ( ) .` and evaluated by a small
//! recursive-descent parser. Results are rounded to six decimal places; any
//! failure or non-finite result shows the `Error` sentinel on the display.

use thiserror::Error;

use examtimer_core::traits::Resettable;

/// Display text after a failed evaluation.
pub const ERROR_DISPLAY: &str = "Error";

/// Characters the calculator accepts.
pub const ALLOWED_CHARS: &str = "0123456789+-*/().";

const ROUNDING: f64 = 1_000_000.0;

/// Deepest allowed nesting of parentheses and unary signs.
pub const MAX_NESTING: usize = 256;

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected '{token}' at position {pos}")]
    UnexpectedToken { token: String, pos: usize },

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Token {
    fn symbol(&self) -> String {
        match self {
            Token::Num(n) => n.to_string(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

/// Drop every character outside [`ALLOWED_CHARS`].
pub fn sanitize(expr: &str) -> String {
    expr.chars().filter(|c| ALLOWED_CHARS.contains(*c)).collect()
}

fn tokenize(expr: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => {
                let mut literal = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        literal.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber(literal.clone()))?;
                Token::Num(value)
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(CalcError::TooDeep(MAX_NESTING));
        }
        Ok(())
    }

    fn unexpected(&self, token: &Token) -> CalcError {
        CalcError::UnexpectedToken {
            token: token.symbol(),
            pos: self.pos,
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    value /= self.unary()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // unary := ('+' | '-') unary | primary
    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            Some(Token::Minus) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(-value)
            }
            _ => self.primary(),
        }
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.advance().cloned() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.advance().cloned() {
                    Some(Token::RParen) => Ok(value),
                    Some(other) => Err(self.unexpected(&other)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(other) => Err(self.unexpected(&other)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/// Evaluate `expr` after sanitizing it. The result is rounded to six
/// decimal places.
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    let sanitized = sanitize(expr);
    if sanitized.is_empty() {
        return Err(CalcError::Empty);
    }
    let tokens = tokenize(&sanitized)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(extra) = parser.peek().cloned() {
        return Err(parser.unexpected(&extra));
    }

    let rounded = (value * ROUNDING + 0.5).floor() / ROUNDING;
    if !value.is_finite() || !rounded.is_finite() {
        return Err(CalcError::NotFinite);
    }
    // Avoid displaying "-0".
    Ok(if rounded == 0.0 { 0.0 } else { rounded })
}

/// Render a result the way the display shows it: no trailing `.0`.
pub fn format_result(value: f64) -> String {
    format!("{value}")
}

/// A calculator display with button and keyboard handling.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    display: String,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn shows_error(&self) -> bool {
        self.display == ERROR_DISPLAY
    }

    /// Append input. A display showing `Error` is cleared first; characters
    /// outside [`ALLOWED_CHARS`] are dropped.
    pub fn append(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        if self.shows_error() {
            self.display.clear();
        }
        self.display.push_str(&sanitize(value));
    }

    pub fn backspace(&mut self) {
        self.display.pop();
    }

    pub fn clear(&mut self) {
        self.display.clear();
    }

    /// Replace the display with the result of evaluating it. A blank display
    /// is left alone.
    pub fn evaluate(&mut self) {
        let expr = self.display.trim();
        if expr.is_empty() {
            return;
        }
        self.display = match evaluate(expr) {
            Ok(value) => format_result(value),
            Err(e) => {
                tracing::debug!(expression = %expr, "calculator error: {e}");
                ERROR_DISPLAY.to_string()
            }
        };
    }

    /// Handle one key name (`Enter`, `=`, `Backspace`, `Delete`, `c`, or a
    /// single allowed character). Returns whether the key was used.
    pub fn handle_key(&mut self, key: &str) -> bool {
        match key {
            "Enter" | "=" => self.evaluate(),
            "Backspace" => self.backspace(),
            "Delete" | "c" | "C" => self.clear(),
            k if k.chars().count() == 1 && ALLOWED_CHARS.contains(k) => self.append(k),
            _ => return false,
        }
        true
    }
}

impl Resettable for Calculator {
    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("1+2*3").unwrap(), 7.0);
        assert_eq!(evaluate("(1+2)*3").unwrap(), 9.0);
        assert_eq!(evaluate("10-4-3").unwrap(), 3.0);
        assert_eq!(evaluate("100/10/5").unwrap(), 2.0);
        assert_eq!(evaluate("-3+5").unwrap(), 2.0);
        assert_eq!(evaluate("2*-(1+1)").unwrap(), -4.0);
    }

    #[test]
    fn decimals_round_to_six_places() {
        assert_eq!(evaluate("1/3").unwrap(), 0.333333);
        assert_eq!(evaluate("2/3").unwrap(), 0.666667);
        assert_eq!(evaluate(".5+5.").unwrap(), 5.5);
        assert_eq!(format_result(evaluate("12*1.5").unwrap()), "18");
    }

    #[test]
    fn disallowed_characters_are_stripped() {
        assert_eq!(sanitize("2 + x3"), "2+3");
        assert_eq!(evaluate("2 + 3").unwrap(), 5.0);
    }

    #[test]
    fn errors() {
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert_eq!(evaluate("abc"), Err(CalcError::Empty));
        assert_eq!(evaluate("1/0"), Err(CalcError::NotFinite));
        assert_eq!(evaluate("(1+2"), Err(CalcError::UnexpectedEnd));
        assert!(matches!(evaluate("1.2.3"), Err(CalcError::InvalidNumber(_))));
        assert!(matches!(evaluate("1+*2"), Err(CalcError::UnexpectedToken { .. })));
        assert!(matches!(evaluate("(1)(2)"), Err(CalcError::UnexpectedToken { .. })));
    }

    #[test]
    fn nesting_is_bounded() {
        let shallow = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(evaluate(&deep), Err(CalcError::TooDeep(MAX_NESTING)));

        let signs = format!("{}1", "-".repeat(100_000));
        assert_eq!(evaluate(&signs), Err(CalcError::TooDeep(MAX_NESTING)));

        let mut calc = Calculator::new();
        calc.append(&deep);
        calc.evaluate();
        assert!(calc.shows_error());
    }

    #[test]
    fn negative_zero_displays_as_zero() {
        assert_eq!(format_result(evaluate("-0*5").unwrap()), "0");
        assert_eq!(format_result(evaluate("-0.0000001").unwrap()), "0");
    }

    #[test]
    fn display_shows_error_sentinel_and_recovers() {
        let mut calc = Calculator::new();
        calc.append("5/0");
        calc.evaluate();
        assert_eq!(calc.display(), ERROR_DISPLAY);
        calc.append("7");
        assert_eq!(calc.display(), "7");
    }

    #[test]
    fn keyboard_handling() {
        let mut calc = Calculator::new();
        for key in ["1", "2", "+", "3", "x"] {
            calc.handle_key(key);
        }
        assert_eq!(calc.display(), "12+3");
        assert!(calc.handle_key("Backspace"));
        assert_eq!(calc.display(), "12+");
        calc.handle_key("4");
        assert!(calc.handle_key("Enter"));
        assert_eq!(calc.display(), "16");
        assert!(calc.handle_key("c"));
        assert_eq!(calc.display(), "");
        assert!(!calc.handle_key("Shift"));
    }

    #[test]
    fn blank_display_is_not_evaluated() {
        let mut calc = Calculator::new();
        calc.evaluate();
        assert_eq!(calc.display(), "");
    }

    #[test]
    fn reset_clears_display() {
        let mut calc = Calculator::new();
        calc.append("9*9");
        calc.reset();
        assert_eq!(calc.display(), "");
    }
}
