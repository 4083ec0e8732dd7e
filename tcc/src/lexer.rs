//! Hand-written scanner turning source text into a stream of [`Token`]s.

use crate::error::{lex_error, LexError};

const MAX_IDENT_LEN: usize = 63;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Token {
    Do,
    Else,
    If,
    While,
    Void,
    Return,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Semi,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Gt,
    Int(i32),
    Id(String),
    /// An identifier immediately followed by `()`, collapsed into one token.
    Func(String),
    Eoi,
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    current: Token,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Result<Lexer<'a>, LexError> {
        let mut lexer = Lexer { chars: source.chars().peekable(), current: Token::Eoi };
        lexer.advance()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c == ' ' || c == '\t' || c == '\n' || c == '\r' => {
                    self.bump();
                }
                Some('/') => {
                    let mut rest = self.chars.clone();
                    rest.next();
                    if rest.peek() == Some(&'/') {
                        self.bump();
                        self.bump();
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Advances past whitespace and comments and stages the next token.
    /// Idempotent once [`Token::Eoi`] has been reached.
    pub fn advance(&mut self) -> Result<(), LexError> {
        self.skip_whitespace_and_comments();

        let token = match self.peek() {
            None => Token::Eoi,
            Some(c) if c.is_ascii_digit() => self.scan_int(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.scan_ident()?,
            Some('{') => { self.bump(); Token::LBrace }
            Some('}') => { self.bump(); Token::RBrace }
            Some('(') => { self.bump(); Token::LParen }
            Some(')') => { self.bump(); Token::RParen }
            Some(';') => { self.bump(); Token::Semi }
            Some('=') => { self.bump(); Token::Assign }
            Some('+') => { self.bump(); Token::Plus }
            Some('-') => { self.bump(); Token::Minus }
            Some('*') => { self.bump(); Token::Star }
            Some('/') => { self.bump(); Token::Slash }
            Some('<') => { self.bump(); Token::Lt }
            Some('>') => { self.bump(); Token::Gt }
            Some(c) => return Err(lex_error(format!("unexpected character '{}'", c))),
        };

        self.current = token;
        Ok(())
    }

    fn scan_int(&mut self) -> Token {
        let mut value: i32 = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.bump();
            value = value.wrapping_mul(10).wrapping_add(c.to_digit(10).unwrap() as i32);
        }
        Token::Int(value)
    }

    fn scan_ident(&mut self) -> Result<Token, LexError> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            if name.len() >= MAX_IDENT_LEN {
                return Err(lex_error(format!("identifier longer than {} bytes", MAX_IDENT_LEN)));
            }
            name.push(c);
            self.bump();
        }

        Ok(match name.as_str() {
            "do" => Token::Do,
            "else" => Token::Else,
            "if" => Token::If,
            "while" => Token::While,
            "void" => Token::Void,
            "return" => Token::Return,
            "int" => {
                // reserved lexically, never produced as a usable token
                return Err(lex_error("'int' is a reserved word"));
            }
            _ => {
                if self.peek() == Some('(') {
                    self.bump();
                    match self.peek() {
                        Some(')') => {
                            self.bump();
                            Token::Func(name)
                        }
                        _ => return Err(lex_error(format!("expected ')' after '{}('", name))),
                    }
                } else {
                    Token::Id(name)
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source).unwrap();
        let mut out = Vec::new();
        loop {
            let tok = lexer.current().clone();
            let done = tok == Token::Eoi;
            out.push(tok);
            if done {
                break;
            }
            lexer.advance().unwrap();
        }
        out
    }

    #[test]
    fn collapses_call_syntax_into_a_func_token() {
        assert_eq!(tokens("foo()"), vec![Token::Func("foo".to_string()), Token::Eoi]);
    }

    #[test]
    fn reserved_words_are_not_identifiers() {
        assert_eq!(tokens("while"), vec![Token::While, Token::Eoi]);
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(tokens("1 // comment\n2"), vec![Token::Int(1), Token::Int(2), Token::Eoi]);
    }

    #[test]
    fn call_without_closing_paren_is_a_syntax_error() {
        let mut lexer = Lexer::new("foo(").unwrap();
        assert!(lexer.advance().is_err());
    }

    #[test]
    fn unexpected_character_is_a_lex_error() {
        let mut lexer = Lexer::new("@").unwrap();
        assert!(lexer.advance().is_err());
    }

    #[test]
    fn eoi_is_idempotent() {
        let mut lexer = Lexer::new("").unwrap();
        assert_eq!(*lexer.current(), Token::Eoi);
        lexer.advance().unwrap();
        assert_eq!(*lexer.current(), Token::Eoi);
    }
}
