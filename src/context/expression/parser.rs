//! Condition expression syntax tree, parser, and whitelist check.
//!
//! The parser deliberately recognizes more than the evaluator accepts
//! (calls, subscripts, arithmetic, statement keywords) so that those
//! constructs surface as explicit nodes. [`check_allowed`] then rejects
//! every node kind outside the whitelist before anything is evaluated.

use super::lexer::Token;
use crate::error::ConditionError;
use serde_json::Value;

/// Keywords that introduce statements or code execution.
const STATEMENT_KEYWORDS: &[&str] = &[
    "import", "from", "lambda", "for", "while", "def", "class", "exec", "eval", "yield",
    "await", "async", "del", "global", "nonlocal", "return", "with", "try", "raise",
    "assert", "if", "else", "elif", "pass",
];

/// Deepest nesting of sub-expressions a condition may have.
pub const MAX_NESTING: usize = 64;

/// Boolean connective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    /// Source spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}

/// Expression syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal constant.
    Const(Value),
    /// Variable reference.
    Name(String),
    /// `value.attr`
    Attribute { value: Box<Expr>, attr: String },
    /// `[a, b]` or `(a, b)`
    List(Vec<Expr>),
    /// `not operand`
    Not(Box<Expr>),
    /// `a and b and c`
    BoolOp { op: BoolOp, values: Vec<Expr> },
    /// `a < b <= c`
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
    },
    /// `func(args)`; never allowed.
    Call { func: Box<Expr>, args: Vec<Expr> },
    /// `value[index]`; never allowed.
    Subscript { value: Box<Expr>, index: Box<Expr> },
    /// Arithmetic or bitwise binary operation; never allowed.
    BinOp {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary arithmetic or bitwise operation; never allowed.
    UnaryOp { op: String, operand: Box<Expr> },
    /// Assignment of any form; never allowed.
    Assign { target: Box<Expr>, value: Box<Expr> },
    /// Statement keyword such as `import` or `lambda`; never allowed.
    Statement(String),
}

/// Parse tokens into a syntax tree.
pub fn parse(source: &str, tokens: Vec<Token>) -> Result<Expr, ConditionError> {
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
    };
    if parser.tokens.is_empty() {
        return Err(parser.error("empty expression"));
    }

    let expr = parser.parse_assignment()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::Name(name)) if is_statement_keyword(name) => {
            Ok(Expr::Statement(name.clone()))
        }
        Some(token) => Err(parser.error(&format!("unexpected token {:?}", token))),
    }
}

/// Reject any node outside the whitelist.
///
/// Allowed: constants, names, attribute access, lists, `not`, `and`/`or`,
/// and comparisons. Names and attributes starting with `__` are rejected.
pub fn check_allowed(source: &str, expr: &Expr) -> Result<(), ConditionError> {
    let unsafe_expr = |reason: String| ConditionError::UnsafeExpression {
        expression: source.to_string(),
        reason,
    };

    match expr {
        Expr::Const(_) => Ok(()),
        Expr::Name(name) => {
            if name.starts_with("__") {
                Err(unsafe_expr(format!("name '{}' is not allowed", name)))
            } else {
                Ok(())
            }
        }
        Expr::Attribute { value, attr } => {
            if attr.starts_with("__") {
                return Err(unsafe_expr(format!("attribute '{}' is not allowed", attr)));
            }
            check_allowed(source, value)
        }
        Expr::List(items) => items.iter().try_for_each(|e| check_allowed(source, e)),
        Expr::Not(operand) => check_allowed(source, operand),
        Expr::BoolOp { values, .. } => values.iter().try_for_each(|e| check_allowed(source, e)),
        Expr::Compare { left, comparisons } => {
            check_allowed(source, left)?;
            comparisons
                .iter()
                .try_for_each(|(_, e)| check_allowed(source, e))
        }
        Expr::Call { .. } => Err(unsafe_expr("function calls are not allowed".to_string())),
        Expr::Subscript { .. } => Err(unsafe_expr("subscripts are not allowed".to_string())),
        Expr::BinOp { op, .. } | Expr::UnaryOp { op, .. } => {
            Err(unsafe_expr(format!("operator '{}' is not allowed", op)))
        }
        Expr::Assign { .. } => Err(unsafe_expr("assignment is not allowed".to_string())),
        Expr::Statement(keyword) => Err(unsafe_expr(format!("'{}' is not allowed", keyword))),
    }
}

fn is_statement_keyword(name: &str) -> bool {
    STATEMENT_KEYWORDS.contains(&name)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Name(n)) if n == keyword)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ConditionError> {
        match self.advance() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(self.error(&format!("expected {:?}, found {:?}", expected, token))),
            None => Err(self.error(&format!("expected {:?}, found end of input", expected))),
        }
    }

    fn error(&self, message: &str) -> ConditionError {
        ConditionError::InvalidSyntax {
            expression: self.source.to_string(),
            message: message.to_string(),
        }
    }

    /// Go one level deeper, failing once past [`MAX_NESTING`].
    fn descend(&mut self) -> Result<(), ConditionError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(&format!(
                "expression is nested more than {} levels deep",
                MAX_NESTING
            )));
        }
        Ok(())
    }

    /// Run `parse` one level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ConditionError>,
    ) -> Result<T, ConditionError> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_assignment(&mut self) -> Result<Expr, ConditionError> {
        let target = self.parse_or()?;
        if self.peek() == Some(&Token::Assign) {
            self.advance();
            let value = self.parse_or()?;
            return Ok(Expr::Assign {
                target: Box::new(target),
                value: Box::new(value),
            });
        }
        Ok(target)
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        self.parse_bool_chain(BoolOp::Or, "or", Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        self.parse_bool_chain(BoolOp::And, "and", Self::parse_not)
    }

    fn parse_bool_chain(
        &mut self,
        op: BoolOp,
        keyword: &str,
        operand: fn(&mut Self) -> Result<Expr, ConditionError>,
    ) -> Result<Expr, ConditionError> {
        let first = operand(self)?;
        if !self.peek_keyword(keyword) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.peek_keyword(keyword) {
            self.advance();
            values.push(operand(self)?);
        }
        Ok(Expr::BoolOp { op, values })
    }

    fn parse_not(&mut self) -> Result<Expr, ConditionError> {
        if self.peek_keyword("not") {
            self.advance();
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ConditionError> {
        let left = self.parse_arith()?;
        let mut comparisons = Vec::new();

        while let Some(op) = self.comparison_operator() {
            comparisons.push((op, self.parse_arith()?));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                comparisons,
            })
        }
    }

    /// Consume a comparison operator if one is next.
    fn comparison_operator(&mut self) -> Option<CmpOp> {
        let (op, width) = match (self.peek()?, self.peek_at(1)) {
            (Token::Eq, _) => (CmpOp::Eq, 1),
            (Token::Ne, _) => (CmpOp::Ne, 1),
            (Token::Lt, _) => (CmpOp::Lt, 1),
            (Token::Le, _) => (CmpOp::Le, 1),
            (Token::Gt, _) => (CmpOp::Gt, 1),
            (Token::Ge, _) => (CmpOp::Ge, 1),
            (Token::Name(n), _) if n == "in" => (CmpOp::In, 1),
            (Token::Name(n), Some(Token::Name(m))) if n == "not" && m == "in" => (CmpOp::NotIn, 2),
            (Token::Name(n), Some(Token::Name(m))) if n == "is" && m == "not" => (CmpOp::IsNot, 2),
            (Token::Name(n), _) if n == "is" => (CmpOp::Is, 1),
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn parse_arith(&mut self) -> Result<Expr, ConditionError> {
        let base = self.depth;
        let mut left = self.parse_unary()?;
        while let Some(Token::Operator(op)) = self.peek() {
            let op = op.clone();
            self.advance();
            // Each operator wraps everything to its left.
            self.descend()?;
            let right = self.parse_unary()?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
        if let Some(Token::Operator(op)) = self.peek() {
            let op = op.clone();
            self.advance();
            if op == "-" {
                // Negative numeric literals are constants, not arithmetic.
                match self.peek() {
                    Some(Token::Int(n)) => {
                        let n = *n;
                        self.advance();
                        return Ok(Expr::Const(Value::from(-n)));
                    }
                    Some(Token::Float(f)) => {
                        let f = *f;
                        self.advance();
                        return Ok(Expr::Const(Value::from(-f)));
                    }
                    _ => {}
                }
            }
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ConditionError> {
        let base = self.depth;
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance();
                    self.descend()?;
                    match self.advance() {
                        Some(Token::Name(attr)) => {
                            expr = Expr::Attribute {
                                value: Box::new(expr),
                                attr,
                            };
                        }
                        _ => return Err(self.error("expected attribute name after '.'")),
                    }
                }
                Some(Token::LParen) => {
                    self.advance();
                    self.descend()?;
                    let args = self.parse_sequence(Token::RParen)?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    self.descend()?;
                    let index = self.parse_or()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => {
                    self.depth = base;
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ConditionError> {
        let token = self
            .advance()
            .ok_or_else(|| self.error("unexpected end of expression"))?;

        match token {
            Token::Int(n) => Ok(Expr::Const(Value::from(n))),
            Token::Float(f) => Ok(Expr::Const(Value::from(f))),
            Token::Str(s) => Ok(Expr::Const(Value::String(s))),
            Token::Name(name) => match name.as_str() {
                "True" | "true" => Ok(Expr::Const(Value::Bool(true))),
                "False" | "false" => Ok(Expr::Const(Value::Bool(false))),
                "None" | "null" => Ok(Expr::Const(Value::Null)),
                keyword if is_statement_keyword(keyword) => {
                    // The rest of the input belongs to the statement.
                    self.pos = self.tokens.len();
                    Ok(Expr::Statement(keyword.to_string()))
                }
                "and" | "or" | "not" | "in" | "is" => {
                    Err(self.error(&format!("unexpected keyword '{}'", name)))
                }
                _ => Ok(Expr::Name(name.clone())),
            },
            Token::LParen => self.nested(Self::parse_parenthesized),
            Token::LBracket => self.nested(|p| p.parse_sequence(Token::RBracket)).map(Expr::List),
            other => Err(self.error(&format!("unexpected token {:?}", other))),
        }
    }

    /// Parse the rest of `( ... )`: a grouped expression or a tuple.
    fn parse_parenthesized(&mut self) -> Result<Expr, ConditionError> {
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_or()?;
        if self.peek() == Some(&Token::Comma) {
            self.advance();
            let mut items = vec![first];
            items.extend(self.parse_sequence(Token::RParen)?);
            return Ok(Expr::List(items));
        }
        self.expect(Token::RParen)?;
        Ok(first)
    }

    /// Parse comma-separated expressions up to and including `close`.
    fn parse_sequence(&mut self, close: Token) -> Result<Vec<Expr>, ConditionError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.advance();
                return Ok(items);
            }
            items.push(self.parse_or()?);
            match self.advance() {
                Some(Token::Comma) => continue,
                Some(ref token) if *token == close => return Ok(items),
                Some(token) => {
                    return Err(self.error(&format!("expected ',' or {:?}, found {:?}", close, token)))
                }
                None => return Err(self.error(&format!("expected {:?}", close))),
            }
        }
    }
}
