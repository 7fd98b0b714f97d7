use super::lexer::{Spanned, Token};
use super::{Expr, Func};
use crate::error::ParseError;

// Binding powers (left, right). Unary minus sits between products and powers
// so `-x**2` is `-(x**2)` and `2*-x` still parses.
const SUM_BP: (u8, u8) = (1, 2);
const PRODUCT_BP: (u8, u8) = (3, 4);
const PREFIX_BP: u8 = 5;
const POWER_BP: (u8, u8) = (7, 6);

/// Nesting limit for parentheses, unary signs and `**` chains.
pub(crate) const MAX_DEPTH: usize = 256;
/// Longer inputs would build trees deep enough to exhaust the stack in the
/// recursive tree walks.
pub(crate) const MAX_TOKENS: usize = 1024;

/// Parse a token stream with Pratt precedence climbing. An optional
/// top-level `=` turns `lhs = rhs` into `lhs - rhs`.
pub(crate) fn parse_tokens(tokens: &[Spanned]) -> Result<Expr, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    if paren_depth(tokens) > MAX_DEPTH {
        return Err(ParseError::TooDeep);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ParseError::TooLong(tokens.len()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let lhs = parser.parse_expr(0)?;

    let expr = if let Some(Token::Equals) = parser.current() {
        parser.advance();
        let rhs = parser.parse_expr(0)?;
        Expr::sub(lhs, rhs)
    } else {
        lhs
    };

    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some((token, pos)) => Err(ParseError::UnexpectedToken {
            found: token.describe(),
            pos: *pos,
        }),
    }
}

/// Deepest parenthesis nesting in the stream.
fn paren_depth(tokens: &[Spanned]) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0;
    for (token, _) in tokens {
        match token {
            Token::LeftParen => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            Token::RightParen => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Token> {
        let tokens: &'a [Spanned] = self.tokens;
        tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect_right_paren(&mut self) -> Result<(), ParseError> {
        match self.tokens.get(self.pos) {
            Some((Token::RightParen, _)) => {
                self.advance();
                Ok(())
            }
            Some((token, pos)) => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                pos: *pos,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep);
        }
        self.depth += 1;
        let result = self.parse_binary(min_bp);
        self.depth -= 1;
        result
    }

    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;

        while let Some(token) = self.current() {
            let (lbp, rbp) = match token {
                Token::Plus | Token::Minus => SUM_BP,
                Token::Star | Token::Slash => PRODUCT_BP,
                Token::Caret => POWER_BP,
                _ => break,
            };
            if lbp < min_bp {
                break;
            }

            self.advance();
            let right = self.parse_expr(rbp)?;
            left = match token {
                Token::Plus => Expr::add(left, right),
                Token::Minus => Expr::sub(left, right),
                Token::Star => Expr::mul(left, right),
                Token::Slash => Expr::div(left, right),
                _ => Expr::pow(left, right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let tokens: &'a [Spanned] = self.tokens;
        let (token, pos) = tokens.get(self.pos).ok_or(ParseError::UnexpectedEnd)?;
        self.advance();

        match token {
            Token::Number(n) => Ok(Expr::num(*n)),
            Token::Ident(name) => {
                if let Some(Token::LeftParen) = self.current() {
                    let func = Func::from_name(name)
                        .ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
                    self.advance();
                    let arg = self.parse_expr(0)?;
                    self.expect_right_paren()?;
                    Ok(Expr::call(func, arg))
                } else {
                    Ok(Expr::Symbol(name.clone()))
                }
            }
            Token::LeftParen => {
                let inner = self.parse_expr(0)?;
                self.expect_right_paren()?;
                Ok(inner)
            }
            Token::Minus => Ok(Expr::neg(self.parse_expr(PREFIX_BP)?)),
            Token::Plus => self.parse_expr(PREFIX_BP),
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                pos: *pos,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    #[test]
    fn test_precedence() {
        let e = parse("1 + 2*3**2").unwrap();
        assert_eq!(e.eval(0.0).unwrap(), 19.0);
        let e = parse("2**3**2").unwrap();
        assert_eq!(e.eval(0.0).unwrap(), 512.0);
        let e = parse("8/2/2").unwrap();
        assert_eq!(e.eval(0.0).unwrap(), 2.0);
        let e = parse("x**-1").unwrap();
        assert_eq!(e.eval(4.0).unwrap(), 0.25);
    }

    #[test]
    fn test_equation_becomes_difference() {
        let e = parse("x**2 = 4").unwrap();
        assert_eq!(e, Expr::sub(Expr::pow(Expr::var(), Expr::num(2.0)), Expr::num(4.0)));
    }

    #[test]
    fn test_function_calls() {
        let e = parse("sqrt(x + 7)").unwrap();
        assert_eq!(e.eval(9.0).unwrap(), 4.0);
        assert_eq!(
            parse("foo(x)"),
            Err(ParseError::UnknownFunction("foo".into()))
        );
    }

    #[test]
    fn test_errors_carry_position() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("(x + 1"), Err(ParseError::UnexpectedEnd));
        // no implicit multiplication
        assert_eq!(
            parse("2x"),
            Err(ParseError::UnexpectedToken { found: "x".into(), pos: 1 })
        );
        assert_eq!(
            parse("x + * 2"),
            Err(ParseError::UnexpectedToken { found: "*".into(), pos: 4 })
        );
        assert!(parse("x = 1 = 2").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let nested = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse(&nested), Err(ParseError::TooDeep));

        let unclosed = "(".repeat(MAX_DEPTH + 1);
        assert_eq!(parse(&unclosed), Err(ParseError::TooDeep));

        let signs = format!("{}x", "-".repeat(MAX_DEPTH + 1));
        assert_eq!(parse(&signs), Err(ParseError::TooDeep));

        let tower = vec!["2"; MAX_DEPTH + 1].join("**");
        assert_eq!(parse(&tower), Err(ParseError::TooDeep));

        let ok = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&ok), Ok(Expr::var()));
    }

    #[test]
    fn test_long_input_is_rejected() {
        let chain = vec!["x"; 5_000].join(" + ");
        assert_eq!(parse(&chain), Err(ParseError::TooLong(9_999)));

        let fits = vec!["1"; 400].join(" + ");
        assert_eq!(parse(&fits).unwrap().eval(0.0).unwrap(), 400.0);
    }
}
