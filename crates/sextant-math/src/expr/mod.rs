//! Symbolic expressions in a single variable `x`.
//!
//! Just enough of a computer-algebra core for the calculus, solving and
//! plotting operations: a Pratt parser, a rule-based simplifier, polynomial
//! extraction and numeric evaluation. Text renders in the `x**2 - 4` style.

mod lexer;
mod parser;
pub(crate) mod poly;
mod simplify;

use std::fmt;

use crate::error::{MathError, MathResult, ParseError};

/// The variable every operation works in.
pub const VAR: &str = "x";

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Symbol(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Ln,
    Sqrt,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "exp" => Some(Self::Exp),
            "ln" | "log" => Some(Self::Ln),
            "sqrt" => Some(Self::Sqrt),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Exp => "exp",
            Self::Ln => "log",
            Self::Sqrt => "sqrt",
        }
    }

    fn apply(&self, v: f64) -> f64 {
        match self {
            Self::Sin => v.sin(),
            Self::Cos => v.cos(),
            Self::Tan => v.tan(),
            Self::Exp => v.exp(),
            Self::Ln => v.ln(),
            Self::Sqrt => v.sqrt(),
        }
    }
}

impl std::str::FromStr for Expr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse `text` into an expression. A single `lhs = rhs` is read as
/// `lhs - rhs`, so equations can be handed straight to the solver.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let tokens = lexer::tokenize(text)?;
    parser::parse_tokens(&tokens)
}

// --- Construction helpers ---

impl Expr {
    pub fn num(n: f64) -> Self {
        Self::Number(n)
    }

    pub fn var() -> Self {
        Self::Symbol(VAR.into())
    }

    pub fn neg(e: Expr) -> Self {
        Self::Neg(Box::new(e))
    }

    pub fn add(a: Expr, b: Expr) -> Self {
        Self::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: Expr, b: Expr) -> Self {
        Self::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Expr, b: Expr) -> Self {
        Self::Mul(Box::new(a), Box::new(b))
    }

    pub fn div(a: Expr, b: Expr) -> Self {
        Self::Div(Box::new(a), Box::new(b))
    }

    pub fn pow(a: Expr, b: Expr) -> Self {
        Self::Pow(Box::new(a), Box::new(b))
    }

    pub fn call(f: Func, arg: Expr) -> Self {
        Self::Call(f, Box::new(arg))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// True if `x` occurs anywhere in the tree.
    pub fn depends_on_var(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Symbol(s) => s == VAR,
            Self::Neg(e) | Self::Call(_, e) => e.depends_on_var(),
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) | Self::Pow(a, b) => {
                a.depends_on_var() || b.depends_on_var()
            }
        }
    }

    /// Evaluate at `x`. `pi` and `E` are the usual constants; any other free
    /// symbol is an error.
    pub fn eval(&self, x: f64) -> MathResult<f64> {
        Ok(match self {
            Self::Number(n) => *n,
            Self::Symbol(s) => match s.as_str() {
                VAR => x,
                "pi" => std::f64::consts::PI,
                "E" | "e" => std::f64::consts::E,
                other => return Err(MathError::UnknownSymbol(other.to_string())),
            },
            Self::Neg(e) => -e.eval(x)?,
            Self::Add(a, b) => a.eval(x)? + b.eval(x)?,
            Self::Sub(a, b) => a.eval(x)? - b.eval(x)?,
            Self::Mul(a, b) => a.eval(x)? * b.eval(x)?,
            Self::Div(a, b) => a.eval(x)? / b.eval(x)?,
            Self::Pow(a, b) => a.eval(x)?.powf(b.eval(x)?),
            Self::Call(f, e) => f.apply(e.eval(x)?),
        })
    }

    /// Binding strength used when rendering; higher binds tighter.
    fn precedence(&self) -> u8 {
        match self {
            Self::Add(..) | Self::Sub(..) => 1,
            Self::Mul(..) | Self::Div(..) => 2,
            Self::Neg(_) => 3,
            Self::Number(n) if *n < 0.0 => 3,
            Self::Pow(..) => 4,
            Self::Number(_) | Self::Symbol(_) | Self::Call(..) => 5,
        }
    }
}

/// Render a float the way a person would write it: `4` rather than `4.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Symbol(s) => write!(f, "{s}"),
            Self::Neg(e) => {
                write!(f, "-")?;
                write_operand(f, e, e.precedence() <= 3)
            }
            Self::Add(a, b) => {
                write!(f, "{a} + ")?;
                write_operand(f, b, b.precedence() == 3)
            }
            Self::Sub(a, b) => {
                write!(f, "{a} - ")?;
                write_operand(f, b, b.precedence() <= 1 || b.precedence() == 3)
            }
            Self::Mul(a, b) => {
                write_operand(f, a, a.precedence() < 2)?;
                write!(f, "*")?;
                write_operand(f, b, b.precedence() < 2 || b.precedence() == 3)
            }
            Self::Div(a, b) => {
                write_operand(f, a, a.precedence() < 2)?;
                write!(f, "/")?;
                write_operand(f, b, b.precedence() <= 3)
            }
            Self::Pow(a, b) => {
                write_operand(f, a, a.precedence() <= 4)?;
                write!(f, "**")?;
                write_operand(f, b, b.precedence() < 4)
            }
            Self::Call(func, arg) => write!(f, "{}({arg})", func.name()),
        }
    }
}
