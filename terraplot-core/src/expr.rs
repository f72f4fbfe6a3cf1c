//! Expression parser — recursive descent with one function per
//! precedence level.
//!
//! Each level parses its left operand by calling the next level up, then
//! loops consuming operators of its own precedence. Lowest to highest:
//!
//! | Level          | Operators                                         |
//! |----------------|---------------------------------------------------|
//! | assignment     | `=` (right-associative)                           |
//! | boolean        | `or`, `and`, prefix `not`                         |
//! | conditional    | `?:` (branches re-enter the assignment level)     |
//! | comparison     | `< > <= >= == !=` (numeric), `lt gt le ge eq ne`  |
//! |                | (lexical)                                         |
//! | additive       | `+`, `-`, `.` (concatenation)                     |
//! | multiplicative | `*`, `/`, `%`, `x` (string repeat)                |
//! | unary          | prefix `+`, `-`                                   |
//! | inc/dec        | prefix/postfix `++`, `--`                         |
//! | subscript      | `expr[key]`, chainable                            |
//! | literal        | `[a, b, ...]`, `{k: v, ...}`                      |
//! | primary        | literals, `(expr)`, variables, function calls     |
//!
//! The parser works directly on a [`CharStream`] and un-reads whatever it
//! over-reads, so it consumes exactly one expression and leaves the stream
//! at the first unconsumed character. Keyword operators (`or`, `not`,
//! `x`, `lt`, ...) only match complete words: `nota` is the identifier
//! `nota`, never `not a`.

use std::sync::Arc;

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::functions::{FunctionHandle, FunctionRegistry};
use crate::stream::CharStream;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Operator tree
// ---------------------------------------------------------------------------

/// Binary operators, split by coercion family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// `.` — stringify both sides and join.
    Concat,
    /// `x` — repeat the left text a floored number of times.
    Repeat,
    /// `and` — both operands always evaluate.
    And,
    /// `or` — both operands always evaluate.
    Or,
    NumericEqual,
    NumericNotEqual,
    NumericLess,
    NumericLessEqual,
    NumericGreater,
    NumericGreaterEqual,
    LexicalEqual,
    LexicalNotEqual,
    LexicalLess,
    LexicalLessEqual,
    LexicalGreater,
    LexicalGreaterEqual,
}

/// One node of a parsed expression.
#[derive(Debug)]
pub(crate) enum ExprNode {
    /// A literal or a variable reference.
    Leaf(Value),
    /// Prefix `not`.
    Not(Box<ExprNode>),
    /// Prefix `-`.
    Negate(Box<ExprNode>),
    Binary {
        op: BinaryOp,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
    Ternary {
        cond: Box<ExprNode>,
        when_true: Box<ExprNode>,
        when_false: Box<ExprNode>,
    },
    /// `target = value`; the target is a variable leaf or subscript node.
    Assign {
        target: Box<ExprNode>,
        value: Box<ExprNode>,
    },
    /// `++x`, `x++`, `--x`, `x--`.
    Increment {
        target: Box<ExprNode>,
        delta: f64,
        postfix: bool,
    },
    /// `map[key]`.
    Subscript {
        map: Box<ExprNode>,
        key: Box<ExprNode>,
    },
    /// `[a, b]` (auto-numbered keys) or `{k: v}` (explicit keys).
    MapLiteral {
        entries: Vec<(ExprNode, ExprNode)>,
    },
    FunctionCall {
        function: FunctionHandle,
        args: Vec<ExprNode>,
    },
}

/// A parsed expression, ready for evaluation.
#[derive(Debug)]
pub struct Expression {
    root: ExprNode,
}

impl Expression {
    /// The variable name when the whole expression is a bare variable
    /// reference, `None` otherwise.
    #[must_use]
    pub fn variable_name(&self) -> Option<&str> {
        if let ExprNode::Leaf(Value::VarRef(name)) = &self.root {
            Some(name)
        } else {
            None
        }
    }

    pub(crate) const fn root(&self) -> &ExprNode {
        &self.root
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse exactly one expression from the stream, leaving it positioned at
/// the first unconsumed character. Function calls are resolved against
/// `registry` and arity-checked here, at parse time.
pub fn parse_expression(
    stream: &mut CharStream,
    registry: &FunctionRegistry,
) -> ParseResult<Expression> {
    let mut parser = Parser { stream, registry };
    let root = parser.parse_assignment()?;
    Ok(Expression { root })
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

const fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_assign_target(node: &ExprNode) -> bool {
    matches!(
        node,
        ExprNode::Leaf(Value::VarRef(_)) | ExprNode::Subscript { .. }
    )
}

struct Parser<'a, 'r> {
    stream: &'a mut CharStream,
    registry: &'r FunctionRegistry,
}

impl Parser<'_, '_> {
    fn err(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::new(kind, message, self.stream.pos())
    }

    /// Read an identifier word, or `None` when the next character cannot
    /// start one.
    fn read_word(&mut self) -> Option<String> {
        if !self.stream.peek().is_some_and(is_word_start) {
            return None;
        }
        let mut word = String::new();
        while let Some(c) = self.stream.peek() {
            if is_word_char(c) {
                word.push(c);
                let _ = self.stream.read();
            } else {
                break;
            }
        }
        Some(word)
    }

    /// Consume `keyword` if the next word is exactly it; otherwise un-read
    /// whatever was peeked.
    fn try_keyword(&mut self, keyword: &str) -> bool {
        self.stream.skip_space();
        match self.read_word() {
            Some(w) if w == keyword => true,
            Some(w) => {
                self.stream.unread_many(w.chars().count());
                false
            }
            None => false,
        }
    }

    // -- level 1: assignment ------------------------------------------------

    fn parse_assignment(&mut self) -> ParseResult<ExprNode> {
        let target = self.parse_or()?;
        self.stream.skip_space();
        if self.stream.peek() == Some('=') {
            let _ = self.stream.read();
            if self.stream.peek() == Some('=') {
                // A stray `==` after a complete operand belongs to nobody;
                // leave it for the caller to report.
                self.stream.unread();
                return Ok(target);
            }
            if !is_assign_target(&target) {
                return Err(self.err(
                    ParseErrorKind::VariableExpected,
                    "left side of `=` must be a variable or map entry",
                ));
            }
            let value = self.parse_assignment()?;
            return Ok(ExprNode::Assign {
                target: Box::new(target),
                value: Box::new(value),
            });
        }
        Ok(target)
    }

    // -- level 2: boolean keywords ------------------------------------------

    fn parse_or(&mut self) -> ParseResult<ExprNode> {
        let mut left = self.parse_and()?;
        while self.try_keyword("or") {
            let right = self.parse_and()?;
            left = ExprNode::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<ExprNode> {
        let mut left = self.parse_not()?;
        while self.try_keyword("and") {
            let right = self.parse_not()?;
            left = ExprNode::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<ExprNode> {
        if self.try_keyword("not") {
            Ok(ExprNode::Not(Box::new(self.parse_not()?)))
        } else {
            self.parse_ternary()
        }
    }

    // -- level 3: conditional -----------------------------------------------

    fn parse_ternary(&mut self) -> ParseResult<ExprNode> {
        let cond = self.parse_comparison()?;
        self.stream.skip_space();
        if self.stream.peek() != Some('?') {
            return Ok(cond);
        }
        let _ = self.stream.read();
        // Branches re-enter the assignment level so chained conditionals
        // nest to the right.
        let when_true = self.parse_assignment()?;
        self.stream.skip_space();
        if self.stream.read() != Some(':') {
            return Err(self.err(
                ParseErrorKind::UnexpectedToken,
                "expected `:` in conditional expression",
            ));
        }
        let when_false = self.parse_assignment()?;
        Ok(ExprNode::Ternary {
            cond: Box::new(cond),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        })
    }

    // -- level 4: comparison ------------------------------------------------

    fn parse_comparison(&mut self) -> ParseResult<ExprNode> {
        let mut left = self.parse_additive()?;
        loop {
            self.stream.skip_space();
            let op = match self.stream.peek() {
                Some('<') => {
                    let _ = self.stream.read();
                    if self.stream.peek() == Some('=') {
                        let _ = self.stream.read();
                        BinaryOp::NumericLessEqual
                    } else {
                        BinaryOp::NumericLess
                    }
                }
                Some('>') => {
                    let _ = self.stream.read();
                    if self.stream.peek() == Some('=') {
                        let _ = self.stream.read();
                        BinaryOp::NumericGreaterEqual
                    } else {
                        BinaryOp::NumericGreater
                    }
                }
                Some('=') => {
                    let _ = self.stream.read();
                    if self.stream.peek() == Some('=') {
                        let _ = self.stream.read();
                        BinaryOp::NumericEqual
                    } else {
                        // A single `=` is assignment; hand it back up.
                        self.stream.unread();
                        break;
                    }
                }
                Some('!') => {
                    let _ = self.stream.read();
                    if self.stream.peek() == Some('=') {
                        let _ = self.stream.read();
                        BinaryOp::NumericNotEqual
                    } else {
                        return Err(self.err(
                            ParseErrorKind::UnexpectedToken,
                            "expected `=` after `!`",
                        ));
                    }
                }
                Some(c) if is_word_start(c) => {
                    let Some(word) = self.read_word() else {
                        break;
                    };
                    match word.as_str() {
                        "lt" => BinaryOp::LexicalLess,
                        "le" => BinaryOp::LexicalLessEqual,
                        "gt" => BinaryOp::LexicalGreater,
                        "ge" => BinaryOp::LexicalGreaterEqual,
                        "eq" => BinaryOp::LexicalEqual,
                        "ne" => BinaryOp::LexicalNotEqual,
                        _ => {
                            self.stream.unread_many(word.chars().count());
                            break;
                        }
                    }
                }
                _ => break,
            };
            let right = self.parse_additive()?;
            left = ExprNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // -- level 5: additive --------------------------------------------------

    fn parse_additive(&mut self) -> ParseResult<ExprNode> {
        let mut left = self.parse_multiplicative()?;
        loop {
            self.stream.skip_space();
            let op = match self.stream.peek() {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Subtract,
                Some('.') => BinaryOp::Concat,
                _ => break,
            };
            let _ = self.stream.read();
            let right = self.parse_multiplicative()?;
            left = ExprNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // -- level 6: multiplicative --------------------------------------------

    fn parse_multiplicative(&mut self) -> ParseResult<ExprNode> {
        let mut left = self.parse_unary()?;
        loop {
            self.stream.skip_space();
            let op = match self.stream.peek() {
                Some('*') => {
                    let _ = self.stream.read();
                    BinaryOp::Multiply
                }
                Some('/') => {
                    let _ = self.stream.read();
                    BinaryOp::Divide
                }
                Some('%') => {
                    let _ = self.stream.read();
                    BinaryOp::Modulo
                }
                Some(c) if is_word_start(c) => {
                    let Some(word) = self.read_word() else {
                        break;
                    };
                    if word == "x" {
                        BinaryOp::Repeat
                    } else {
                        self.stream.unread_many(word.chars().count());
                        break;
                    }
                }
                _ => break,
            };
            let right = self.parse_unary()?;
            left = ExprNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // -- level 7: unary sign ------------------------------------------------

    fn parse_unary(&mut self) -> ParseResult<ExprNode> {
        self.stream.skip_space();
        match self.stream.peek() {
            Some(c @ ('+' | '-')) => {
                let _ = self.stream.read();
                if self.stream.peek() == Some(c) {
                    // Leading `++`/`--` is increment, not a sign.
                    self.stream.unread();
                    return self.parse_incdec();
                }
                let operand = self.parse_unary()?;
                if c == '-' {
                    Ok(ExprNode::Negate(Box::new(operand)))
                } else {
                    Ok(operand)
                }
            }
            _ => self.parse_incdec(),
        }
    }

    // -- level 8: increment/decrement ---------------------------------------

    fn check_incdec_target(&self, target: &ExprNode) -> ParseResult<()> {
        if is_assign_target(target) {
            Ok(())
        } else {
            Err(self.err(
                ParseErrorKind::VariableExpected,
                "`++`/`--` target must be a variable or map entry",
            ))
        }
    }

    fn parse_incdec(&mut self) -> ParseResult<ExprNode> {
        self.stream.skip_space();
        if let Some(c @ ('+' | '-')) = self.stream.peek() {
            let _ = self.stream.read();
            if self.stream.peek() == Some(c) {
                let _ = self.stream.read();
                let target = self.parse_incdec()?;
                self.check_incdec_target(&target)?;
                return Ok(ExprNode::Increment {
                    target: Box::new(target),
                    delta: if c == '+' { 1.0 } else { -1.0 },
                    postfix: false,
                });
            }
            self.stream.unread();
        }

        let operand = self.parse_subscript()?;

        self.stream.skip_space();
        if let Some(c @ ('+' | '-')) = self.stream.peek() {
            let _ = self.stream.read();
            if self.stream.peek() == Some(c) {
                let _ = self.stream.read();
                self.check_incdec_target(&operand)?;
                return Ok(ExprNode::Increment {
                    target: Box::new(operand),
                    delta: if c == '+' { 1.0 } else { -1.0 },
                    postfix: true,
                });
            }
            self.stream.unread();
        }
        Ok(operand)
    }

    // -- level 9: map subscript ---------------------------------------------

    fn parse_subscript(&mut self) -> ParseResult<ExprNode> {
        let mut node = self.parse_literal()?;
        loop {
            self.stream.skip_space();
            if self.stream.peek() != Some('[') {
                break;
            }
            let _ = self.stream.read();
            let key = self.parse_assignment()?;
            self.stream.skip_space();
            if self.stream.read() != Some(']') {
                return Err(self.err(
                    ParseErrorKind::UnbalancedDelimiter,
                    "unmatched `[` in subscript",
                ));
            }
            node = ExprNode::Subscript {
                map: Box::new(node),
                key: Box::new(key),
            };
        }
        Ok(node)
    }

    // -- level 10: array/map literals ---------------------------------------

    fn reject_nested_literal(&self, node: &ExprNode) -> ParseResult<()> {
        if matches!(node, ExprNode::MapLiteral { .. }) {
            Err(self.err(
                ParseErrorKind::NestedLiteral,
                "array and map literals cannot nest",
            ))
        } else {
            Ok(())
        }
    }

    fn parse_literal(&mut self) -> ParseResult<ExprNode> {
        self.stream.skip_space();
        match self.stream.peek() {
            Some('[') => self.parse_array_literal(),
            Some('{') => self.parse_map_literal(),
            _ => self.parse_factor(),
        }
    }

    fn parse_array_literal(&mut self) -> ParseResult<ExprNode> {
        let _ = self.stream.read(); // `[`
        let mut entries = Vec::new();
        self.stream.skip_space();
        if self.stream.peek() == Some(']') {
            let _ = self.stream.read();
            return Ok(ExprNode::MapLiteral { entries });
        }
        loop {
            let value = self.parse_assignment()?;
            self.reject_nested_literal(&value)?;
            // Auto-numbered string keys "1", "2", ...
            let key = ExprNode::Leaf(Value::string((entries.len() + 1).to_string()));
            entries.push((key, value));
            self.stream.skip_space();
            match self.stream.read() {
                Some(',') => {}
                Some(']') => break,
                Some(c) => {
                    return Err(self.err(
                        ParseErrorKind::UnbalancedDelimiter,
                        format!("expected `,` or `]` in array literal, found `{c}`"),
                    ));
                }
                None => {
                    return Err(
                        self.err(ParseErrorKind::UnbalancedDelimiter, "unmatched `[`")
                    );
                }
            }
        }
        Ok(ExprNode::MapLiteral { entries })
    }

    fn parse_map_literal(&mut self) -> ParseResult<ExprNode> {
        let _ = self.stream.read(); // `{`
        let mut entries = Vec::new();
        self.stream.skip_space();
        if self.stream.peek() == Some('}') {
            let _ = self.stream.read();
            return Ok(ExprNode::MapLiteral { entries });
        }
        loop {
            let key = self.parse_assignment()?;
            self.reject_nested_literal(&key)?;
            self.stream.skip_space();
            if self.stream.read() != Some(':') {
                return Err(self.err(
                    ParseErrorKind::UnexpectedToken,
                    "expected `:` after map literal key",
                ));
            }
            let value = self.parse_assignment()?;
            self.reject_nested_literal(&value)?;
            entries.push((key, value));
            self.stream.skip_space();
            match self.stream.read() {
                Some(',') => {}
                Some('}') => break,
                Some(c) => {
                    return Err(self.err(
                        ParseErrorKind::UnbalancedDelimiter,
                        format!("expected `,` or `}}` in map literal, found `{c}`"),
                    ));
                }
                None => {
                    return Err(
                        self.err(ParseErrorKind::UnbalancedDelimiter, "unmatched `{`")
                    );
                }
            }
        }
        Ok(ExprNode::MapLiteral { entries })
    }

    // -- level 11: primary --------------------------------------------------

    fn parse_factor(&mut self) -> ParseResult<ExprNode> {
        self.stream.skip_space();
        let Some(c) = self.stream.peek() else {
            return Err(self.err(
                ParseErrorKind::UnexpectedEof,
                "unexpected end of expression",
            ));
        };

        if c == '\'' || c == '"' {
            return self.parse_string_literal();
        }
        if c.is_ascii_digit() || c == '.' {
            return self.parse_number();
        }
        if c == '(' {
            let _ = self.stream.read();
            let inner = self.parse_assignment()?;
            self.stream.skip_space();
            if self.stream.read() != Some(')') {
                return Err(self.err(ParseErrorKind::UnbalancedDelimiter, "unmatched `(`"));
            }
            return Ok(inner);
        }
        if is_word_start(c) {
            let Some(word) = self.read_word() else {
                return Err(self.err(
                    ParseErrorKind::UnexpectedToken,
                    format!("unexpected character `{c}`"),
                ));
            };
            self.stream.skip_space();
            if self.stream.peek() == Some('(') {
                return self.parse_function_call(&word);
            }
            return Ok(ExprNode::Leaf(Value::VarRef(Arc::from(word.as_str()))));
        }
        Err(self.err(
            ParseErrorKind::UnexpectedToken,
            format!("unexpected character `{c}`"),
        ))
    }

    fn parse_function_call(&mut self, name: &str) -> ParseResult<ExprNode> {
        let Some(function) = self.registry.resolve(name) else {
            return Err(self.err(
                ParseErrorKind::UnknownFunction,
                format!("unknown function `{name}`"),
            ));
        };
        let _ = self.stream.read(); // `(`
        let mut args = Vec::new();
        self.stream.skip_space();
        if self.stream.peek() == Some(')') {
            let _ = self.stream.read();
        } else {
            loop {
                args.push(self.parse_assignment()?);
                self.stream.skip_space();
                match self.stream.read() {
                    Some(',') => {}
                    Some(')') => break,
                    Some(c) => {
                        return Err(self.err(
                            ParseErrorKind::UnbalancedDelimiter,
                            format!("expected `,` or `)` in call to {name}, found `{c}`"),
                        ));
                    }
                    None => {
                        return Err(self.err(
                            ParseErrorKind::UnbalancedDelimiter,
                            format!("unmatched `(` in call to {name}"),
                        ));
                    }
                }
            }
        }
        if args.len() < function.min_args() || args.len() > function.max_args() {
            let expected = if function.min_args() == function.max_args() {
                function.min_args().to_string()
            } else {
                format!("{} to {}", function.min_args(), function.max_args())
            };
            return Err(self.err(
                ParseErrorKind::WrongArgumentCount,
                format!(
                    "function {name} expects {expected} argument(s), got {}",
                    args.len()
                ),
            ));
        }
        Ok(ExprNode::FunctionCall { function, args })
    }

    // -- literal scanners ---------------------------------------------------

    fn parse_number(&mut self) -> ParseResult<ExprNode> {
        let mut text = String::new();
        while let Some(c) = self.stream.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                let _ = self.stream.read();
            } else {
                break;
            }
        }
        // Optional exponent; `5eq6` must leave `eq` unconsumed.
        if matches!(self.stream.peek(), Some('e' | 'E')) {
            let mut consumed = 1;
            let _ = self.stream.read();
            let mut exponent = String::from("e");
            if matches!(self.stream.peek(), Some('+' | '-')) {
                if let Some(sign) = self.stream.read() {
                    exponent.push(sign);
                    consumed += 1;
                }
            }
            let mut has_digits = false;
            while self.stream.peek().is_some_and(|c| c.is_ascii_digit()) {
                if let Some(d) = self.stream.read() {
                    exponent.push(d);
                    has_digits = true;
                }
            }
            if has_digits {
                text.push_str(&exponent);
            } else {
                self.stream.unread_many(consumed);
            }
        }
        let value: f64 = text
            .parse()
            .map_err(|_| self.err(ParseErrorKind::InvalidNumber, format!("invalid number `{text}`")))?;
        if !value.is_finite() {
            return Err(self.err(
                ParseErrorKind::InvalidNumber,
                format!("number out of range `{text}`"),
            ));
        }
        Ok(ExprNode::Leaf(Value::Numeric(value)))
    }

    fn parse_string_literal(&mut self) -> ParseResult<ExprNode> {
        let Some(quote) = self.stream.read() else {
            return Err(self.err(ParseErrorKind::UnexpectedEof, "unexpected end of expression"));
        };
        let mut text = String::new();
        loop {
            match self.stream.read() {
                None => {
                    return Err(self.err(
                        ParseErrorKind::UnterminatedString,
                        "unterminated string literal",
                    ));
                }
                Some('\n') => {
                    return Err(self.err(
                        ParseErrorKind::UnterminatedString,
                        "string literal not closed before end of line",
                    ));
                }
                Some(c) if c == quote => break,
                Some('\\') => self.parse_escape(&mut text)?,
                Some(c) => text.push(c),
            }
        }
        Ok(ExprNode::Leaf(Value::string(text)))
    }

    fn parse_escape(&mut self, out: &mut String) -> ParseResult<()> {
        match self.stream.read() {
            None => Err(self.err(
                ParseErrorKind::UnterminatedString,
                "unterminated string literal",
            )),
            Some('n') => {
                out.push('\n');
                Ok(())
            }
            Some('t') => {
                out.push('\t');
                Ok(())
            }
            // `\r` produces nothing.
            Some('r') => Ok(()),
            Some('u') => {
                let mut hex = String::new();
                for _ in 0..4 {
                    match self.stream.read() {
                        Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                        _ => {
                            return Err(self.err(
                                ParseErrorKind::InvalidEscape,
                                format!("`\\u` needs four hex digits, got `{hex}`"),
                            ));
                        }
                    }
                }
                let code = u32::from_str_radix(&hex, 16).map_err(|_| {
                    self.err(
                        ParseErrorKind::InvalidEscape,
                        format!("bad unicode escape `\\u{hex}`"),
                    )
                })?;
                let c = char::from_u32(code).ok_or_else(|| {
                    self.err(
                        ParseErrorKind::InvalidEscape,
                        format!("`\\u{hex}` is not a character"),
                    )
                })?;
                out.push(c);
                Ok(())
            }
            Some(c @ '0'..='7') => {
                let mut value = c as u32 - '0' as u32;
                for _ in 0..2 {
                    match self.stream.peek() {
                        Some(d @ '0'..='7') => {
                            let _ = self.stream.read();
                            value = value * 8 + (d as u32 - '0' as u32);
                        }
                        _ => break,
                    }
                }
                let c = char::from_u32(value).ok_or_else(|| {
                    self.err(
                        ParseErrorKind::InvalidEscape,
                        format!("bad octal escape `\\{value:o}`"),
                    )
                })?;
                out.push(c);
                Ok(())
            }
            // `\\`, `\"`, `\'`, and any unlisted escape: the character itself.
            Some(c) => {
                out.push(c);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
