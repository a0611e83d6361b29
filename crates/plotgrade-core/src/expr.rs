//! Single-variable expression parsing and evaluation.
//!
//! Source text is tokenized against a fixed whitelist, parsed by recursive
//! descent into an [`Expr`] tree, and evaluated by walking the tree with a
//! value substituted for `x`. Nothing outside the whitelist is accepted, and
//! evaluation never touches state outside the tree.
//!
//! Precedence, lowest first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := primary ('^' unary)?
//! primary := number | 'x' | 'pi' | 'e' | func '(' expr ')' | '(' expr ')'
//! ```
//!
//! `^` is right associative and binds tighter than unary minus, so
//! `-x^2` is `-(x^2)` and `2^-1` is `0.5`.

use std::fmt;
use std::str::FromStr;

use crate::error::ExprError;

/// Maximum accepted source length in bytes.
pub const MAX_EXPRESSION_LEN: usize = 1024;

const MAX_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// A parsed expression in the variable `x`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    X,
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Whitelisted single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Abs,
    /// Natural logarithm, same as [`Func::Ln`].
    Log,
    Ln,
    Log10,
    Exp,
    Floor,
    Ceil,
    /// Rounds halves toward positive infinity.
    Round,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
            Func::Log => "log",
            Func::Ln => "ln",
            Func::Log10 => "log10",
            Func::Exp => "exp",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
        }
    }

    fn apply(self, arg: f64) -> Result<f64, ExprError> {
        let domain = |ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(ExprError::Domain {
                    func: self.name(),
                    arg,
                })
            }
        };

        let value = match self {
            Func::Sin => arg.sin(),
            Func::Cos => arg.cos(),
            Func::Tan => arg.tan(),
            Func::Asin => {
                domain((-1.0..=1.0).contains(&arg))?;
                arg.asin()
            }
            Func::Acos => {
                domain((-1.0..=1.0).contains(&arg))?;
                arg.acos()
            }
            Func::Atan => arg.atan(),
            Func::Sqrt => {
                domain(arg >= 0.0)?;
                arg.sqrt()
            }
            Func::Abs => arg.abs(),
            Func::Log | Func::Ln => {
                domain(arg > 0.0)?;
                arg.ln()
            }
            Func::Log10 => {
                domain(arg > 0.0)?;
                arg.log10()
            }
            Func::Exp => arg.exp(),
            Func::Floor => arg.floor(),
            Func::Ceil => arg.ceil(),
            Func::Round => (arg + 0.5).floor(),
        };
        Ok(value)
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Func {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sin" => Ok(Func::Sin),
            "cos" => Ok(Func::Cos),
            "tan" => Ok(Func::Tan),
            "asin" => Ok(Func::Asin),
            "acos" => Ok(Func::Acos),
            "atan" => Ok(Func::Atan),
            "sqrt" => Ok(Func::Sqrt),
            "abs" => Ok(Func::Abs),
            "log" => Ok(Func::Log),
            "ln" => Ok(Func::Ln),
            "log10" => Ok(Func::Log10),
            "exp" => Ok(Func::Exp),
            "floor" => Ok(Func::Floor),
            "ceil" => Ok(Func::Ceil),
            "round" => Ok(Func::Round),
            other => Err(ExprError::UnknownIdentifier(other.to_string())),
        }
    }
}

impl Expr {
    /// Parse source text into an expression tree.
    pub fn parse(src: &str) -> Result<Expr, ExprError> {
        if src.len() > MAX_EXPRESSION_LEN {
            return Err(ExprError::TooLong(MAX_EXPRESSION_LEN));
        }
        let tokens = tokenize(src)?;
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(ExprError::TrailingInput(token.pos)),
        }
    }

    /// Evaluate with `x` bound to the given value.
    ///
    /// Every intermediate result must be finite; the first NaN or infinity
    /// aborts evaluation.
    pub fn eval(&self, x: f64) -> Result<f64, ExprError> {
        let value = match self {
            Expr::Number(n) => *n,
            Expr::X => x,
            Expr::Neg(inner) => -inner.eval(x)?,
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(x)?;
                let b = rhs.eval(x)?;
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow => a.powf(b),
                }
            }
            Expr::Call(func, arg) => func.apply(arg.eval(x)?)?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ExprError::NonFinite)
        }
    }
}

/// Parse and evaluate in one step, collapsing every failure into `None`.
pub fn evaluate(src: &str, x: f64) -> Option<f64> {
    match Expr::parse(src).and_then(|expr| expr.eval(x)) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::trace!("no value for '{src}' at x={x}: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Ident(name) => write!(f, "'{name}'"),
            TokenKind::Plus => f.write_str("'+'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Star => f.write_str("'*'"),
            TokenKind::Slash => f.write_str("'/'"),
            TokenKind::Caret => f.write_str("'^'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < len {
        let start = pos;
        let kind = match bytes[pos] {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'0'..=b'9' | b'.' => {
                while pos < len && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                    pos += 1;
                }
                // Exponent only when digits follow, so `2e` stays `2` then `e`.
                if pos < len && (bytes[pos] == b'e' || bytes[pos] == b'E') {
                    let mut look = pos + 1;
                    if look < len && (bytes[look] == b'+' || bytes[look] == b'-') {
                        look += 1;
                    }
                    if look < len && bytes[look].is_ascii_digit() {
                        pos = look;
                        while pos < len && bytes[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    }
                }
                let text = &src[start..pos];
                let value = text.parse::<f64>().map_err(|_| ExprError::UnexpectedToken {
                    found: format!("'{text}'"),
                    pos: start,
                })?;
                TokenKind::Number(value)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while pos < len && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                    pos += 1;
                }
                TokenKind::Ident(src[start..pos].to_string())
            }
            b'+' => single(&mut pos, TokenKind::Plus),
            b'-' => single(&mut pos, TokenKind::Minus),
            b'*' => single(&mut pos, TokenKind::Star),
            b'/' => single(&mut pos, TokenKind::Slash),
            b'^' => single(&mut pos, TokenKind::Caret),
            b'(' => single(&mut pos, TokenKind::LParen),
            b')' => single(&mut pos, TokenKind::RParen),
            _ => {
                let ch = src[pos..].chars().next().unwrap_or('\u{FFFD}');
                return Err(ExprError::UnexpectedChar { ch, pos });
            }
        };
        tokens.push(Token { kind, pos: start });
    }

    Ok(tokens)
}

fn single(pos: &mut usize, kind: TokenKind) -> TokenKind {
    *pos += 1;
    kind
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Result<Token, ExprError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ExprError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(ExprError::UnexpectedToken {
                found: token.kind.to_string(),
                pos: token.pos,
            })
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }

        let expr = if self.peek_kind() == Some(&TokenKind::Minus) {
            self.pos += 1;
            Expr::Neg(Box::new(self.parse_unary()?))
        } else {
            self.parse_power()?
        };

        self.depth -= 1;
        Ok(expr)
    }

    fn parse_power(&mut self) -> Result<Expr, ExprError> {
        let base = self.parse_primary()?;
        if self.peek_kind() == Some(&TokenKind::Caret) {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => match name.as_str() {
                "x" => Ok(Expr::X),
                "pi" => Ok(Expr::Number(std::f64::consts::PI)),
                "e" => Ok(Expr::Number(std::f64::consts::E)),
                other => {
                    let func: Func = other.parse()?;
                    self.expect(TokenKind::LParen)?;
                    let arg = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::Call(func, Box::new(arg)))
                }
            },
            other => Err(ExprError::UnexpectedToken {
                found: other.to_string(),
                pos: token.pos,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, x: f64) -> f64 {
        Expr::parse(src)
            .and_then(|e| e.eval(x))
            .unwrap_or_else(|e| panic!("'{src}' failed: {e}"))
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn square_of_x() {
        assert_eq!(evaluate("x^2", 3.0), Some(9.0));
    }

    #[test]
    fn sin_of_zero_ignores_x() {
        for x in [-4.0, 0.0, 17.5] {
            assert_eq!(evaluate("sin(0)", x), Some(0.0));
        }
    }

    #[test]
    fn sqrt_of_negative_is_domain_failure() {
        assert_eq!(evaluate("sqrt(-1)", 0.0), None);
        let err = Expr::parse("sqrt(-1)").unwrap().eval(0.0).unwrap_err();
        assert!(matches!(err, ExprError::Domain { func: "sqrt", .. }));
        assert!(!err.is_parse_error());
    }

    #[test]
    fn injected_code_is_a_parse_failure() {
        for src in [
            "alert(1)",
            "x; process.exit()",
            "constructor.constructor('return 1')()",
            "Math.sin(x)",
            "x = 3",
            "x ** 2",
            "eval(x)",
        ] {
            let err = Expr::parse(src).unwrap_err();
            assert!(err.is_parse_error(), "{src} gave {err:?}");
            assert_eq!(evaluate(src, 0.0), None);
        }
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("2 + 3 * 4", 0.0), 14.0);
        assert_eq!(eval("(2 + 3) * 4", 0.0), 20.0);
        assert_eq!(eval("10 - 4 - 3", 0.0), 3.0);
        assert_eq!(eval("12 / 3 / 2", 0.0), 2.0);
        assert_eq!(eval("2^3^2", 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0), -9.0);
        assert_eq!(eval("2^-1", 0.0), 0.5);
        assert_eq!(eval("--x", 4.0), 4.0);
        assert_eq!(eval("3 * -x", 2.0), -6.0);
    }

    #[test]
    fn constants_and_functions() {
        assert!(close(eval("pi", 0.0), std::f64::consts::PI));
        assert!(close(eval("log(e)", 0.0), 1.0));
        assert!(close(eval("ln(e^2)", 0.0), 2.0));
        assert!(close(eval("log10(1000)", 0.0), 3.0));
        assert!(close(eval("cos(pi)", 0.0), -1.0));
        assert!(close(eval("atan(1) * 4", 0.0), std::f64::consts::PI));
        assert!(close(eval("asin(1)", 0.0), std::f64::consts::FRAC_PI_2));
        assert_eq!(eval("abs(x)", -2.5), 2.5);
        assert_eq!(eval("floor(x)", -1.5), -2.0);
        assert_eq!(eval("ceil(x)", -1.5), -1.0);
        assert!(close(eval("exp(0) + sqrt(16)", 0.0), 5.0));
    }

    #[test]
    fn round_half_goes_up() {
        assert_eq!(eval("round(x)", 2.5), 3.0);
        assert_eq!(eval("round(x)", -2.5), -2.0);
        assert_eq!(eval("round(x)", 2.4), 2.0);
    }

    #[test]
    fn numeric_literal_forms() {
        assert_eq!(eval(".5 + x", 1.0), 1.5);
        assert_eq!(eval("1e3", 0.0), 1000.0);
        assert_eq!(eval("2.5E-1", 0.0), 0.25);
        assert!(close(eval("2*e", 0.0), 2.0 * std::f64::consts::E));
    }

    #[test]
    fn malformed_numbers_and_implicit_products_fail() {
        assert!(matches!(Expr::parse("1.2.3"), Err(ExprError::UnexpectedToken { .. })));
        assert!(matches!(Expr::parse("2x"), Err(ExprError::TrailingInput(1))));
        assert!(matches!(Expr::parse("2e"), Err(ExprError::TrailingInput(1))));
        assert!(matches!(Expr::parse("sin x"), Err(ExprError::UnexpectedToken { .. })));
    }

    #[test]
    fn incomplete_input_fails() {
        assert_eq!(Expr::parse(""), Err(ExprError::UnexpectedEnd));
        assert_eq!(Expr::parse("x +"), Err(ExprError::UnexpectedEnd));
        assert_eq!(Expr::parse("(x"), Err(ExprError::UnexpectedEnd));
        assert!(matches!(Expr::parse(")"), Err(ExprError::UnexpectedToken { pos: 0, .. })));
    }

    #[test]
    fn unknown_identifiers_are_rejected() {
        assert_eq!(
            Expr::parse("y + 1"),
            Err(ExprError::UnknownIdentifier("y".into()))
        );
        assert_eq!(
            Expr::parse("Sin(x)"),
            Err(ExprError::UnknownIdentifier("Sin".into()))
        );
    }

    #[test]
    fn non_ascii_is_rejected_with_position() {
        assert_eq!(
            Expr::parse("2 × x"),
            Err(ExprError::UnexpectedChar { ch: '×', pos: 2 })
        );
    }

    #[test]
    fn non_finite_results_fail() {
        assert_eq!(Expr::parse("1/x").unwrap().eval(0.0), Err(ExprError::NonFinite));
        assert_eq!(evaluate("0/0", 0.0), None);
        assert_eq!(evaluate("exp(1000)", 0.0), None);
        assert_eq!(evaluate("(-8)^(1/3)", 0.0), None);
    }

    #[test]
    fn log_domains() {
        assert_eq!(evaluate("ln(x)", 0.0), None);
        assert_eq!(evaluate("log(x)", -1.0), None);
        assert_eq!(evaluate("log10(x)", 0.0), None);
        assert_eq!(evaluate("acos(x)", 1.5), None);
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let deep = format!("{}x{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(Expr::parse(&deep), Err(ExprError::TooDeep));

        let shallow = format!("{}x{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(eval(&shallow, 2.0), 2.0);
    }

    #[test]
    fn overlong_input_is_rejected() {
        let long = "x+".repeat(MAX_EXPRESSION_LEN);
        assert_eq!(Expr::parse(&long), Err(ExprError::TooLong(MAX_EXPRESSION_LEN)));
    }

    #[test]
    fn parsed_tree_is_reusable() {
        let expr = Expr::parse("x^2 - 2*x + 1").unwrap();
        assert_eq!(expr.eval(1.0), Ok(0.0));
        assert_eq!(expr.eval(3.0), Ok(4.0));
        assert_eq!(expr.eval(1.0), Ok(0.0));
    }
}
