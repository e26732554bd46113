use crate::SelectorError;
use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Token types for the selector grammar.
///
/// Whitespace is kept: between two compounds it is the descendant
/// combinator.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum Token<'src> {
    #[regex(r"[ \t\n\r\f]+")]
    Whitespace,

    #[regex(r"[a-zA-Z0-9_-]+", |lex| lex.slice())]
    Ident(&'src str),

    // Quoted attribute values, quotes stripped
    #[regex(r#""[^"]*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'[^']*'"#, |lex| unquote(lex.slice()))]
    String(&'src str),

    #[regex(r#""[^"]*"#)]
    #[regex(r#"'[^']*"#)]
    UnterminatedString,

    #[token("#")]
    Hash,

    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("=")]
    Equals,

    #[token(">")]
    RAngle,

    #[token(",")]
    Comma,
}

fn unquote(quoted: &str) -> &str {
    &quoted[1..quoted.len() - 1]
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Whitespace => write!(f, "whitespace"),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::UnterminatedString => write!(f, "unterminated string"),
            Token::Hash => write!(f, "#"),
            Token::Dot => write!(f, "."),
            Token::Star => write!(f, "*"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Equals => write!(f, "="),
            Token::RAngle => write!(f, ">"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// Tokenize a selector, failing on the first character no token accepts
pub fn tokenize(source: &str) -> Result<Vec<(Token<'_>, Range<usize>)>, SelectorError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(Token::UnterminatedString) => {
                return Err(SelectorError::UnterminatedString(source.to_string()))
            }
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(SelectorError::Unexpected {
                    ch: source[span.start..].chars().next().unwrap_or_default(),
                    position: span.start,
                    selector: source.to_string(),
                })
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_compound_tokens() {
        assert_eq!(
            kinds("a.hsuforum-cancel#x"),
            vec![
                Token::Ident("a"),
                Token::Dot,
                Token::Ident("hsuforum-cancel"),
                Token::Hash,
                Token::Ident("x"),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_a_token() {
        assert_eq!(
            kinds("div  > a, b"),
            vec![
                Token::Ident("div"),
                Token::Whitespace,
                Token::RAngle,
                Token::Whitespace,
                Token::Ident("a"),
                Token::Comma,
                Token::Whitespace,
                Token::Ident("b"),
            ]
        );
    }

    #[test]
    fn test_quoted_values() {
        assert_eq!(
            kinds(r#"[data-postid="12"][href='#']"#),
            vec![
                Token::LBracket,
                Token::Ident("data-postid"),
                Token::Equals,
                Token::String("12"),
                Token::RBracket,
                Token::LBracket,
                Token::Ident("href"),
                Token::Equals,
                Token::String("#"),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize(".a .b").unwrap();
        assert_eq!(tokens[3], (Token::Dot, 3..4));
    }

    #[test]
    fn test_lex_errors() {
        assert!(matches!(
            tokenize(r#"[x="7]"#),
            Err(SelectorError::UnterminatedString(_))
        ));
        assert_eq!(
            tokenize("a:hover"),
            Err(SelectorError::Unexpected {
                ch: ':',
                position: 1,
                selector: "a:hover".to_string(),
            })
        );
    }
}
