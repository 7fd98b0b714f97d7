use thiserror::Error;

/// Failure of a math operation or of the dispatcher feeding it.
#[derive(Debug, Error)]
pub enum MathError {
    #[error("Cannot divide by zero")]
    DivideByZero,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Negative numbers do not have a factorial.")]
    NegativeFactorial,

    #[error("Input must be a positive integer.")]
    NonPositiveLength,

    #[error("expected a whole number, got {0}")]
    NotAnInteger(f64),

    #[error("result does not fit in 128 bits for input {0}")]
    Overflow(i64),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Conversion not supported: {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    #[error("no data to analyse")]
    EmptyData,

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("no solution found for {0}")]
    NoSolution(String),

    #[error("no closed-form antiderivative for {0}")]
    NoClosedForm(String),

    #[error("could not find {0} in command")]
    MissingParameter(&'static str),

    #[error("plotting failed: {0}")]
    Plot(String),
}

/// Errors from the expression and matrix-literal parsers. Positions are byte
/// offsets into the parsed text, reported 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at position {}", .pos + 1)]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected '{found}' at position {}", .pos + 1)]
    UnexpectedToken { found: String, pos: usize },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("malformed matrix literal: {0}")]
    Matrix(String),

    #[error("expression nests too deeply")]
    TooDeep,

    #[error("expression too long ({0} tokens)")]
    TooLong(usize),
}

pub type MathResult<T> = Result<T, MathError>;
