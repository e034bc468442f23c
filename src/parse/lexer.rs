// Lexer - tokenizes expression text

use super::token::Token;
use crate::error::{Error, Result};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Consume `next` if it is the upcoming character
    fn follows(&mut self, next: char) -> bool {
        if self.current_char() == Some(next) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        let token = match ch {
            '\'' => return self.read_string(),
            c if c.is_alphabetic() || c == '_' => return Ok(self.read_identifier()),
            c if c.is_ascii_digit() => return Ok(self.read_number()),
            _ => {
                self.advance();
                match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '%' => Token::Percent,
                    '(' => Token::LeftParen,
                    ')' => Token::RightParen,
                    '*' if self.follows('*') => Token::DoubleStar,
                    '*' => Token::Star,
                    '/' if self.follows('/') => Token::DoubleSlash,
                    '/' => Token::Slash,
                    '=' => {
                        self.follows('=');
                        Token::Equal
                    }
                    '<' if self.follows('=') => Token::LessEqual,
                    '<' if self.follows('>') => Token::NotEqual,
                    '<' => Token::Less,
                    '>' if self.follows('=') => Token::GreaterEqual,
                    '>' => Token::Greater,
                    '!' if self.follows('=') => Token::NotEqual,
                    other => {
                        return Err(Error::Syntax(format!(
                            "unexpected character '{}' at position {}",
                            other,
                            self.position - 1
                        )))
                    }
                }
            }
        };

        Ok(token)
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a single-quoted string; `''` is an escaped quote
    fn read_string(&mut self) -> Result<Token> {
        let start = self.position;
        self.advance(); // Skip opening quote
        let mut string = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch != '\'' {
                string.push(ch);
            } else if self.follows('\'') {
                string.push('\'');
            } else {
                return Ok(Token::String(string));
            }
        }

        Err(Error::Syntax(format!(
            "unterminated string starting at position {}",
            start
        )))
    }

    /// Read an integer, decimal or exponent-form number
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;
        let mut has_exponent = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !has_dot
                && !has_exponent
                && self.peek().is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && !has_exponent {
                let digits_at = match self.peek() {
                    Some('+') | Some('-') => 2,
                    _ => 1,
                };
                if !self.peek_at(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                    break;
                }
                has_exponent = true;
                for _ in 0..digits_at {
                    number.extend(self.current_char());
                    self.advance();
                }
            } else {
                break;
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input, ending with `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }
}
