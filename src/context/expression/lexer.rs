//! Tokenizer for condition expressions.

use crate::error::ConditionError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword.
    Name(String),
    /// Quoted string literal (escapes already applied).
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `=` or `:=`
    Assign,
    /// Arithmetic or bitwise operator (`+`, `**`, `<<`, `~`, ...).
    Operator(String),
}

/// Split an expression into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ConditionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    let syntax_error = |message: String| ConditionError::InvalidSyntax {
        expression: source.to_string(),
        message,
    };

    while pos < chars.len() {
        let c = chars[pos];
        let next = chars.get(pos + 1).copied();

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Token::Name(chars[start..pos].iter().collect()));
            continue;
        }

        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let is_float = pos + 1 < chars.len()
                && chars[pos] == '.'
                && chars[pos + 1].is_ascii_digit();
            if is_float {
                pos += 1;
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let text: String = chars[start..pos].iter().collect();
            let token = if is_float {
                text.parse().map(Token::Float).ok()
            } else {
                text.parse().map(Token::Int).ok()
            };
            tokens.push(token.ok_or_else(|| syntax_error(format!("invalid number '{}'", text)))?);
            continue;
        }

        if c == '\'' || c == '"' {
            let (literal, end) = read_string(&chars, pos)
                .ok_or_else(|| syntax_error(format!("unterminated string at offset {}", pos)))?;
            tokens.push(Token::Str(literal));
            pos = end;
            continue;
        }

        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('<', Some('<')) => (Token::Operator("<<".to_string()), 2),
            ('>', Some('>')) => (Token::Operator(">>".to_string()), 2),
            ('*', Some('*')) => (Token::Operator("**".to_string()), 2),
            ('/', Some('/')) => (Token::Operator("//".to_string()), 2),
            (':', Some('=')) => (Token::Assign, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('=', _) => (Token::Assign, 1),
            (':', _) => (Token::Colon, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            ('+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '~' | '@', _) => {
                (Token::Operator(c.to_string()), 1)
            }
            _ => {
                return Err(syntax_error(format!(
                    "unexpected character '{}' at offset {}",
                    c, pos
                )))
            }
        };
        tokens.push(token);
        pos += width;
    }

    Ok(tokens)
}

/// Read a quoted string starting at `start`; returns the literal and the
/// index just past the closing quote.
fn read_string(chars: &[char], start: usize) -> Option<(String, usize)> {
    let quote = chars[start];
    let mut literal = String::new();
    let mut pos = start + 1;

    while pos < chars.len() {
        let c = chars[pos];
        if c == quote {
            return Some((literal, pos + 1));
        }
        if c == '\\' {
            let escaped = *chars.get(pos + 1)?;
            literal.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
            pos += 2;
            continue;
        }
        literal.push(c);
        pos += 1;
    }

    None
}
