//! Boolean conditions over numeric literals for the control-flow demo.
//!
//! The grammar is deliberately small and nothing is ever executed:
//!
//! ```text
//! expr   := and ( "OR" and )*
//! and    := unary ( "AND" unary )*
//! unary  := "NOT" unary | "(" expr ")" | "true" | "false" | cmp
//! cmp    := number op number
//! op     := ">" | "<" | ">=" | "<=" | "=" | "==" | "!=" | "<>"
//! ```
//!
//! Keywords are case-insensitive and `&&`, `||`, `!` are accepted as aliases.
//!
//! ```
//! # use guide_core::condition::evaluate;
//! assert_eq!(evaluate("7 > 5 AND 2 = 2"), Ok(true));
//! assert_eq!(evaluate("1 > 2 OR NOT (3 <= 3)"), Ok(false));
//! assert!(evaluate("alert(1)").is_err());
//! ```

use thiserror::Error;

const MAX_DEPTH: usize = 32;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConditionError {
    #[error("condition is empty")]
    Empty,

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unknown word {word:?} at offset {offset}")]
    UnknownWord { word: String, offset: usize },

    #[error("invalid number {raw:?} at offset {offset}")]
    InvalidNumber { raw: String, offset: usize },

    #[error("expected {expected} at offset {offset}")]
    Expected {
        expected: &'static str,
        offset: usize,
    },

    #[error("unexpected end of condition, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("nesting deeper than 32 levels at offset {offset}")]
    TooDeep { offset: usize },
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Result of a condition together with the branch the demo takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionOutcome {
    pub value: bool,
}

impl ConditionOutcome {
    /// Parse and evaluate `input`.
    ///
    /// # Errors
    ///
    /// Returns `ConditionError` if the input does not match the grammar.
    pub fn evaluate(input: &str) -> Result<Self, ConditionError> {
        evaluate(input).map(|value| Self { value })
    }

    #[must_use]
    pub fn action(&self) -> &'static str {
        if self.value {
            "Continue down the river"
        } else {
            "Take alternative path"
        }
    }
}

/// Parse and evaluate a condition.
///
/// # Errors
///
/// Returns `ConditionError` describing the first problem found.
pub fn evaluate(input: &str) -> Result<bool, ConditionError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ConditionError::Empty);
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(tok) => Err(ConditionError::Expected {
            expected: "end of condition",
            offset: tok.offset,
        }),
    }
}

//
// ─── LEXER ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl CmpOp {
    #[allow(clippy::float_cmp)]
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Gt => lhs > rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TokenKind {
    Number(f64),
    Cmp(CmpOp),
    And,
    Or,
    Not,
    True,
    False,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let start = i;
        let two = bytes.get(i + 1).copied();

        let kind = match b {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
                continue;
            }
            b'(' => {
                i += 1;
                TokenKind::LParen
            }
            b')' => {
                i += 1;
                TokenKind::RParen
            }
            b'>' if two == Some(b'=') => {
                i += 2;
                TokenKind::Cmp(CmpOp::Ge)
            }
            b'>' => {
                i += 1;
                TokenKind::Cmp(CmpOp::Gt)
            }
            b'<' if two == Some(b'=') => {
                i += 2;
                TokenKind::Cmp(CmpOp::Le)
            }
            b'<' if two == Some(b'>') => {
                i += 2;
                TokenKind::Cmp(CmpOp::Ne)
            }
            b'<' => {
                i += 1;
                TokenKind::Cmp(CmpOp::Lt)
            }
            b'=' if two == Some(b'=') => {
                i += 2;
                TokenKind::Cmp(CmpOp::Eq)
            }
            b'=' => {
                i += 1;
                TokenKind::Cmp(CmpOp::Eq)
            }
            b'!' if two == Some(b'=') => {
                i += 2;
                TokenKind::Cmp(CmpOp::Ne)
            }
            b'!' => {
                i += 1;
                TokenKind::Not
            }
            b'&' if two == Some(b'&') => {
                i += 2;
                TokenKind::And
            }
            b'|' if two == Some(b'|') => {
                i += 2;
                TokenKind::Or
            }
            b'0'..=b'9' | b'.' | b'-' | b'+' => {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let raw = &input[start..i];
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ConditionError::InvalidNumber {
                        raw: raw.to_string(),
                        offset: start,
                    })?;
                TokenKind::Number(value)
            }
            b if b.is_ascii_alphabetic() => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = &input[start..i];
                match word.to_ascii_uppercase().as_str() {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    "TRUE" => TokenKind::True,
                    "FALSE" => TokenKind::False,
                    _ => {
                        return Err(ConditionError::UnknownWord {
                            word: word.to_string(),
                            offset: start,
                        });
                    }
                }
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('\u{FFFD}');
                return Err(ConditionError::UnexpectedChar { ch, offset: start });
            }
        };

        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    Ok(tokens)
}

//
// ─── PARSER ────────────────────────────────────────────────────────────────────
//

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, ConditionError> {
        let tok = self
            .peek()
            .ok_or(ConditionError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(tok)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().is_some_and(|tok| tok.kind == kind) {
            self.pos += 1;
            return true;
        }
        false
    }

    // No short-circuit: the right operand is always parsed.
    fn expr(&mut self) -> Result<bool, ConditionError> {
        let mut value = self.and()?;
        while self.eat(TokenKind::Or) {
            let rhs = self.and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<bool, ConditionError> {
        let mut value = self.unary()?;
        while self.eat(TokenKind::And) {
            let rhs = self.unary()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<bool, ConditionError> {
        let tok = self.next("a comparison")?;
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ConditionError::TooDeep { offset: tok.offset });
        }

        let value = match tok.kind {
            TokenKind::Not => !self.unary()?,
            TokenKind::LParen => {
                let inner = self.expr()?;
                let close = self.next("')'")?;
                if close.kind != TokenKind::RParen {
                    return Err(ConditionError::Expected {
                        expected: "')'",
                        offset: close.offset,
                    });
                }
                inner
            }
            TokenKind::True => true,
            TokenKind::False => false,
            TokenKind::Number(lhs) => self.comparison(lhs)?,
            _ => {
                return Err(ConditionError::Expected {
                    expected: "a comparison",
                    offset: tok.offset,
                });
            }
        };

        self.depth -= 1;
        Ok(value)
    }

    fn comparison(&mut self, lhs: f64) -> Result<bool, ConditionError> {
        let op_tok = self.next("a comparison operator")?;
        let TokenKind::Cmp(op) = op_tok.kind else {
            return Err(ConditionError::Expected {
                expected: "a comparison operator",
                offset: op_tok.offset,
            });
        };
        let rhs_tok = self.next("a number")?;
        let TokenKind::Number(rhs) = rhs_tok.kind else {
            return Err(ConditionError::Expected {
                expected: "a number",
                offset: rhs_tok.offset,
            });
        };
        Ok(op.apply(lhs, rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_comparisons() {
        assert_eq!(evaluate("10 > 5"), Ok(true));
        assert_eq!(evaluate("10 < 5"), Ok(false));
        assert_eq!(evaluate("5 >= 5"), Ok(true));
        assert_eq!(evaluate("4.5 <= 4"), Ok(false));
        assert_eq!(evaluate("3 = 3"), Ok(true));
        assert_eq!(evaluate("3 == 3.0"), Ok(true));
        assert_eq!(evaluate("3 != 3"), Ok(false));
        assert_eq!(evaluate("3 <> 4"), Ok(true));
        assert_eq!(evaluate("-2 < 1"), Ok(true));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(evaluate("1 > 2 AND 1 > 2 OR 3 > 2"), Ok(true));
        assert_eq!(evaluate("1 > 2 AND (1 > 2 OR 3 > 2)"), Ok(false));
        assert_eq!(evaluate("true && false || true"), Ok(true));
    }

    #[test]
    fn not_and_keywords_are_case_insensitive() {
        assert_eq!(evaluate("not 1 > 2"), Ok(true));
        assert_eq!(evaluate("!(1 > 2) and TRUE"), Ok(true));
        assert_eq!(evaluate("False Or 1 = 1"), Ok(true));
    }

    #[test]
    fn rejects_identifiers_and_code() {
        assert!(matches!(
            evaluate("waterLevel > 5"),
            Err(ConditionError::UnknownWord { offset: 0, .. })
        ));
        assert!(matches!(
            evaluate("1; 2"),
            Err(ConditionError::UnexpectedChar { ch: ';', offset: 1 })
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(evaluate("   "), Err(ConditionError::Empty));
        assert_eq!(
            evaluate("(1 > 2"),
            Err(ConditionError::UnexpectedEnd { expected: "')'" })
        );
        assert_eq!(
            evaluate("1 > 2)"),
            Err(ConditionError::Expected {
                expected: "end of condition",
                offset: 5
            })
        );
        assert_eq!(
            evaluate("1 2"),
            Err(ConditionError::Expected {
                expected: "a comparison operator",
                offset: 2
            })
        );
        assert!(matches!(
            evaluate("1.2.3 > 1"),
            Err(ConditionError::InvalidNumber { .. })
        ));
        assert_eq!(
            evaluate("1 > 2 AND"),
            Err(ConditionError::UnexpectedEnd {
                expected: "a comparison"
            })
        );
    }

    #[test]
    fn reports_errors_on_short_circuited_side() {
        assert!(evaluate("1 < 2 OR oops").is_err());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let input = format!("{}1 > 0{}", "(".repeat(64), ")".repeat(64));
        assert!(matches!(
            evaluate(&input),
            Err(ConditionError::TooDeep { .. })
        ));
    }

    #[test]
    fn outcome_action_follows_value() {
        let yes = ConditionOutcome::evaluate("2 > 1").unwrap();
        assert_eq!(yes.action(), "Continue down the river");
        let no = ConditionOutcome::evaluate("2 < 1").unwrap();
        assert_eq!(no.action(), "Take alternative path");
    }
}
