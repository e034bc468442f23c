// Parser - builds expression trees from tokens through an operator registry

use super::lexer::Lexer;
use super::token::Token;
use crate::error::{Error, Result};
use crate::expression::{boolean, float64, int64, string, Expr, OperatorKind};
use crate::registry::OperatorRegistry;
use crate::types::Literal;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    registry: &'a OperatorRegistry,
    source: Option<&'a Expr>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &str, registry: &'a OperatorRegistry) -> Result<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Parser {
            tokens,
            position: 0,
            registry,
            source: None,
        })
    }

    /// Resolve bare identifiers as columns of `source`
    pub fn with_source(mut self, source: &'a Expr) -> Self {
        self.source = Some(source);
        self
    }

    /// Parse the whole input as one expression
    pub fn parse(&mut self) -> Result<Expr> {
        let expr = self.parse_or()?;
        if self.current_token() != &Token::Eof {
            return Err(Error::Syntax(format!(
                "unexpected token {:?} after expression",
                self.current_token()
            )));
        }
        Ok(expr)
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn peek_token(&self) -> &Token {
        self.tokens.get(self.position + 1).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.current_token() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, expected: Token) -> Result<()> {
        if self.current_token() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(Error::Syntax(format!(
                "expected {:?}, found {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    fn binary(&self, kind: OperatorKind, left: Expr, right: Expr) -> Result<Expr> {
        self.registry.apply_binary(kind, &left, &right)
    }

    /// Parse OR expression
    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_xor()?;

        while self.match_token(&Token::Or) {
            let right = self.parse_xor()?;
            left = self.binary(OperatorKind::Or, left, right)?;
        }

        Ok(left)
    }

    /// Parse XOR expression
    fn parse_xor(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;

        while self.match_token(&Token::Xor) {
            let right = self.parse_and()?;
            left = self.binary(OperatorKind::Xor, left, right)?;
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;

        while self.match_token(&Token::And) {
            let right = self.parse_not()?;
            left = self.binary(OperatorKind::And, left, right)?;
        }

        Ok(left)
    }

    /// Parse NOT expression
    fn parse_not(&mut self) -> Result<Expr> {
        if self.match_token(&Token::Not) {
            let operand = self.parse_not()?;
            return self.registry.apply_unary(OperatorKind::Not, &operand);
        }

        self.parse_comparison()
    }

    /// Parse comparison expression; comparisons do not chain
    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;

        let kind = match self.current_token() {
            Token::Equal => OperatorKind::Eq,
            Token::NotEqual => OperatorKind::Ne,
            Token::Less => OperatorKind::Lt,
            Token::LessEqual => OperatorKind::Le,
            Token::Greater => OperatorKind::Gt,
            Token::GreaterEqual => OperatorKind::Ge,
            Token::Is => {
                self.advance();
                self.expect_token(Token::Not)?;
                self.expect_token(Token::Distinct)?;
                self.expect_token(Token::From)?;
                let right = self.parse_additive()?;
                return self.binary(OperatorKind::Identical, left, right);
            }
            _ => return Ok(left),
        };

        self.advance();
        let right = self.parse_additive()?;
        self.binary(kind, left, right)
    }

    /// Parse addition and subtraction
    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let kind = match self.current_token() {
                Token::Plus => OperatorKind::Add,
                Token::Minus => OperatorKind::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(kind, left, right)?;
        }

        Ok(left)
    }

    /// Parse multiplication, division and modulo
    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let kind = match self.current_token() {
                Token::Star => OperatorKind::Mul,
                Token::Slash => OperatorKind::TrueDiv,
                Token::DoubleSlash => OperatorKind::FloorDiv,
                Token::Percent => OperatorKind::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(kind, left, right)?;
        }

        Ok(left)
    }

    /// Parse unary minus; a negated number literal stays a literal
    fn parse_unary(&mut self) -> Result<Expr> {
        if self.current_token() == &Token::Minus {
            if let Token::Number(number) = self.peek_token() {
                if self.tokens.get(self.position + 2) != Some(&Token::DoubleStar) {
                    let negative = format!("-{}", number);
                    self.advance();
                    self.advance();
                    return parse_number(&negative);
                }
            }
            self.advance();
            let operand = self.parse_unary()?;
            return self.binary(OperatorKind::Sub, int64(0), operand);
        }

        self.parse_power()
    }

    /// Parse exponentiation, which binds tighter than unary minus on its
    /// left and associates to the right
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_primary()?;

        if self.match_token(&Token::DoubleStar) {
            let exponent = self.parse_unary()?;
            return self.binary(OperatorKind::Pow, base, exponent);
        }

        Ok(base)
    }

    /// Parse primary expression
    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current_token().clone();
        match token {
            Token::Number(number) => {
                self.advance();
                parse_number(&number)
            }
            Token::String(value) => {
                self.advance();
                Ok(string(value))
            }
            Token::True => {
                self.advance();
                Ok(boolean(true))
            }
            Token::False => {
                self.advance();
                Ok(boolean(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null))
            }
            Token::Identifier(name) => {
                self.advance();
                let source = self.source.ok_or_else(|| {
                    Error::Syntax(format!("column '{}' used without a source table", name))
                })?;
                source.column(&name)
            }
            Token::LeftParen => {
                self.advance();
                let expr = self.parse_or()?;
                self.expect_token(Token::RightParen)?;
                Ok(expr)
            }
            other => Err(Error::Syntax(format!("unexpected token {:?}", other))),
        }
    }
}

fn parse_number(text: &str) -> Result<Expr> {
    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>()
            .map(float64)
            .map_err(|_| Error::Syntax(format!("invalid number '{}'", text)))
    } else {
        text.parse::<i64>()
            .map(int64)
            .map_err(|_| Error::Syntax(format!("integer '{}' out of range", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{int32, BinaryOperator, UnaryOperator};
    use crate::schema::{Table, TableSchema};
    use crate::types::TypeName;

    fn orders() -> Expr {
        let schema = TableSchema::builder()
            .column("amount", TypeName::Int64, false)
            .column("price", TypeName::Float64, true)
            .column("paid", TypeName::Bool, false)
            .build()
            .unwrap();
        Expr::from(&Table::new("orders", schema))
    }

    fn parse(input: &str) -> Result<Expr> {
        let registry = OperatorRegistry::standard()?;
        let source = orders();
        Parser::new(input, &registry)?.with_source(&source).parse()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        let (left, right) = expr.as_binary(BinaryOperator::Add).unwrap();
        assert_eq!(left, &int64(1));
        assert!(right.as_binary(BinaryOperator::Multiply).is_some());
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse("2 ** 3 ** 2").unwrap();
        let (left, right) = expr.as_binary(BinaryOperator::Power).unwrap();
        assert_eq!(left, &int64(2));
        assert!(right.as_binary(BinaryOperator::Power).is_some());
    }

    #[test]
    fn test_negation() {
        assert_eq!(parse("-5").unwrap(), int64(-5));

        let expr = parse("-amount").unwrap();
        let (left, right) = expr.as_binary(BinaryOperator::Subtract).unwrap();
        assert_eq!(left, &int64(0));
        assert_eq!(right.column_name(), Some("amount"));

        // -2 ** 2 is -(2 ** 2)
        let expr = parse("-2 ** 2").unwrap();
        let (_, right) = expr.as_binary(BinaryOperator::Subtract).unwrap();
        assert!(right.as_binary(BinaryOperator::Power).is_some());
    }

    #[test]
    fn test_logical_and_comparison() {
        let expr = parse("amount >= 10 AND NOT paid").unwrap();
        let (left, right) = expr.as_binary(BinaryOperator::And).unwrap();
        assert!(left.as_binary(BinaryOperator::GreaterEqual).is_some());
        assert_eq!(right.unary_parts().map(|(op, _)| op), Some(UnaryOperator::Not));
    }

    #[test]
    fn test_is_not_distinct_from() {
        let expr = parse("price IS NOT DISTINCT FROM NULL").unwrap();
        assert!(expr.as_binary(BinaryOperator::IdenticalTo).is_some());
        assert!(matches!(parse("price IS NULL"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_columns_resolve_against_source() {
        let expr = parse("(amount + 1) * price").unwrap();
        assert!(expr.as_binary(BinaryOperator::Multiply).is_some());
        assert!(matches!(parse("missing + 1"), Err(Error::Schema { .. })));

        let registry = OperatorRegistry::standard().unwrap();
        let err = Parser::new("amount", &registry).unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn test_dispatch_errors_surface() {
        assert!(matches!(
            parse("'x' + 1"),
            Err(Error::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            parse("amount AND paid"),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(parse("1 +"), Err(Error::Syntax(_))));
        assert!(matches!(parse("(1 + 2"), Err(Error::Syntax(_))));
        assert!(matches!(parse("1 2"), Err(Error::Syntax(_))));
        assert!(matches!(
            parse("99999999999999999999"),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse("TRUE").unwrap(), boolean(true));
        assert_eq!(parse("'abc'").unwrap(), string("abc"));
        assert_eq!(parse("2.5").unwrap(), float64(2.5));
        assert_eq!(parse("1e20").unwrap(), float64(1e20));
        assert_eq!(parse("-2.5e-3").unwrap(), float64(-2.5e-3));
        assert_ne!(parse("7").unwrap(), int32(7));
    }
}
