//! Tokenizer for the render-expression grammar.

use compact_str::CompactString;

use crate::parser::ParseError;

/// One token of render-function source
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Str(String),
    Num(f64),
    Ident(CompactString),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Question,
    Colon,
    Semi,
    Plus,
    Minus,
    Bang,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    AndAnd,
    OrOr,
}

/// Tokenize render-function source into a flat token list
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
            b'(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            b'[' => {
                tokens.push(Token::LBracket);
                pos += 1;
            }
            b']' => {
                tokens.push(Token::RBracket);
                pos += 1;
            }
            b'{' => {
                tokens.push(Token::LBrace);
                pos += 1;
            }
            b'}' => {
                tokens.push(Token::RBrace);
                pos += 1;
            }
            b',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            b'?' => {
                tokens.push(Token::Question);
                pos += 1;
            }
            b':' => {
                tokens.push(Token::Colon);
                pos += 1;
            }
            b';' => {
                tokens.push(Token::Semi);
                pos += 1;
            }
            b'+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            b'-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            b'!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    if bytes.get(pos + 2) == Some(&b'=') {
                        tokens.push(Token::NotEqEq);
                        pos += 3;
                    } else {
                        tokens.push(Token::NotEq);
                        pos += 2;
                    }
                } else {
                    tokens.push(Token::Bang);
                    pos += 1;
                }
            }
            b'=' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    if bytes.get(pos + 2) == Some(&b'=') {
                        tokens.push(Token::EqEqEq);
                        pos += 3;
                    } else {
                        tokens.push(Token::EqEq);
                        pos += 2;
                    }
                } else {
                    return Err(ParseError::UnexpectedChar('=', pos));
                }
            }
            b'<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Le);
                    pos += 2;
                } else {
                    tokens.push(Token::Lt);
                    pos += 1;
                }
            }
            b'>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Ge);
                    pos += 2;
                } else {
                    tokens.push(Token::Gt);
                    pos += 1;
                }
            }
            b'&' => {
                if bytes.get(pos + 1) == Some(&b'&') {
                    tokens.push(Token::AndAnd);
                    pos += 2;
                } else {
                    return Err(ParseError::UnexpectedChar('&', pos));
                }
            }
            b'|' => {
                if bytes.get(pos + 1) == Some(&b'|') {
                    tokens.push(Token::OrOr);
                    pos += 2;
                } else {
                    return Err(ParseError::UnexpectedChar('|', pos));
                }
            }
            b'.' => {
                tokens.push(Token::Dot);
                pos += 1;
            }
            b'"' | b'\'' => {
                let (s, next) = read_string(source, pos)?;
                tokens.push(Token::Str(s));
                pos = next;
            }
            b'0'..=b'9' => {
                let (n, next) = read_number(source, pos)?;
                tokens.push(Token::Num(n));
                pos = next;
            }
            _ if b == b'_' || b == b'$' || b.is_ascii_alphabetic() => {
                let start = pos;
                while pos < bytes.len()
                    && (bytes[pos] == b'_'
                        || bytes[pos] == b'$'
                        || bytes[pos].is_ascii_alphanumeric())
                {
                    pos += 1;
                }
                tokens.push(Token::Ident(CompactString::from(&source[start..pos])));
            }
            _ => {
                let c = source[pos..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::UnexpectedChar(c, pos));
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted string literal starting at `start`, returning the decoded
/// payload and the byte offset past the closing quote.
fn read_string(source: &str, start: usize) -> Result<(String, usize), ParseError> {
    let bytes = source.as_bytes();
    let quote = bytes[start];
    let mut out = String::new();
    let mut pos = start + 1;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b == quote {
            return Ok((out, pos + 1));
        }
        if b == b'\\' {
            let esc = bytes
                .get(pos + 1)
                .ok_or(ParseError::UnterminatedString(start))?;
            match esc {
                b'n' => out.push('\n'),
                b't' => out.push('\t'),
                b'r' => out.push('\r'),
                b'0' => out.push('\0'),
                _ => {
                    // \" \' \\ and any unrecognized escape keep the char
                    let c = source[pos + 1..].chars().next().unwrap_or('\u{fffd}');
                    out.push(c);
                    pos += 1 + c.len_utf8();
                    continue;
                }
            }
            pos += 2;
        } else {
            let c = source[pos..].chars().next().unwrap_or('\u{fffd}');
            out.push(c);
            pos += c.len_utf8();
        }
    }

    Err(ParseError::UnterminatedString(start))
}

/// Read a numeric literal
fn read_number(source: &str, start: usize) -> Result<(f64, usize), ParseError> {
    let bytes = source.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)
    {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    source[start..pos]
        .parse::<f64>()
        .map(|n| (n, pos))
        .map_err(|_| ParseError::InvalidNumber(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_helper_call() {
        let tokens = tokenize("_c(\"div\", [_v(\"hi\")])").unwrap();
        assert_eq!(tokens[0], Token::Ident("_c".into()));
        assert_eq!(tokens[1], Token::LParen);
        assert_eq!(tokens[2], Token::Str("div".into()));
        assert!(tokens.contains(&Token::LBracket));
    }

    #[test]
    fn tokenizes_string_escapes() {
        let tokens = tokenize(r#""a\"b\nc""#).unwrap();
        assert_eq!(tokens, vec![Token::Str("a\"b\nc".into())]);
    }

    #[test]
    fn tokenizes_operators_longest_match() {
        let tokens = tokenize("a === b !== c && d || !e").unwrap();
        assert!(tokens.contains(&Token::EqEqEq));
        assert!(tokens.contains(&Token::NotEqEq));
        assert!(tokens.contains(&Token::AndAnd));
        assert!(tokens.contains(&Token::OrOr));
        assert!(tokens.contains(&Token::Bang));
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(matches!(
            tokenize("a @ b"),
            Err(ParseError::UnexpectedChar('@', _))
        ));
        assert!(matches!(
            tokenize("\"open"),
            Err(ParseError::UnterminatedString(0))
        ));
    }
}
