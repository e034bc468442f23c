// Tokens of the expression language

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Keywords
    And,
    Or,
    Xor,
    Not,
    Null,
    True,
    False,
    Is,
    Distinct,
    From,

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,

    // Special
    Eof,
}

impl Token {
    /// Convert a word to its keyword token, ignoring case
    pub fn keyword_from_str(word: &str) -> Option<Token> {
        match word.to_uppercase().as_str() {
            "AND" => Some(Token::And),
            "OR" => Some(Token::Or),
            "XOR" => Some(Token::Xor),
            "NOT" => Some(Token::Not),
            "NULL" => Some(Token::Null),
            "TRUE" => Some(Token::True),
            "FALSE" => Some(Token::False),
            "IS" => Some(Token::Is),
            "DISTINCT" => Some(Token::Distinct),
            "FROM" => Some(Token::From),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(Token::keyword_from_str("and"), Some(Token::And));
        assert_eq!(Token::keyword_from_str("Xor"), Some(Token::Xor));
        assert_eq!(Token::keyword_from_str("amount"), None);
    }
}
