//! Best-effort extraction of typed parameters from free-text commands.
//!
//! Every extractor returns `None` (or an empty list) when its pattern is
//! absent or malformed; none of them fail. Keyword checks are plain
//! substring tests applied in a fixed order, first match wins.

use std::fmt;

use ndarray::Array2;
use num_complex::Complex64;
use regex::Regex;
use tracing::debug;

use crate::error::ParseError;
use crate::expr::{self, format_number, Expr};
use crate::ops::{format_complex, format_matrix, BinaryOp, TrigFunction};

pub(crate) const DEFAULT_PLOT_RANGE: (f64, f64) = (-10.0, 10.0);

/// `convert <value> <from> to <to>`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitQuery {
    pub value: f64,
    pub from: String,
    pub to: String,
}

/// `plot <expr> [from <a> to <b>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub expr: Expr,
    pub range: (f64, f64),
}

fn first_capture<'a>(pattern: &str, cmd: &'a str) -> Option<&'a str> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(cmd)?;
    caps.iter().skip(1).flatten().next().map(|m| m.as_str())
}

fn parse_logged(text: &str) -> Option<Expr> {
    match expr::parse(text) {
        Ok(e) => Some(e),
        Err(e) => {
            debug!(text, error = %e, "expression did not parse");
            None
        }
    }
}

/// Every number in `cmd`, left to right.
pub fn extract_numbers(cmd: &str) -> Vec<f64> {
    let Ok(re) = Regex::new(r"-?\d+\.?\d*") else {
        return Vec::new();
    };
    re.find_iter(cmd)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Raw text after `solve `.
pub fn equation_text(cmd: &str) -> Option<&str> {
    first_capture(r"solve (.+)", cmd)
}

pub fn extract_equation(cmd: &str) -> Option<Expr> {
    parse_logged(equation_text(cmd)?)
}

/// Raw text after `differentiate ` or `integrate `.
pub fn expression_text(cmd: &str) -> Option<&str> {
    first_capture(r"differentiate (.+)|integrate (.+)", cmd)
}

pub fn extract_expression(cmd: &str) -> Option<Expr> {
    parse_logged(expression_text(cmd)?)
}

/// Arithmetic keyword, checked add → subtract → multiply → divide.
pub fn extract_operation(cmd: &str) -> Option<BinaryOp> {
    const KEYWORDS: [(BinaryOp, &[&str]); 4] = [
        (BinaryOp::Add, &["add", "plus", "sum"]),
        (BinaryOp::Subtract, &["subtract", "minus"]),
        (BinaryOp::Multiply, &["multiply", "times", "product"]),
        (BinaryOp::Divide, &["divide"]),
    ];
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| cmd.contains(w)))
        .map(|(op, _)| *op)
}

/// `sin`, then `cos`, then `tan`; the first one present wins.
pub fn extract_trig_function(cmd: &str) -> Option<TrigFunction> {
    [TrigFunction::Sin, TrigFunction::Cos, TrigFunction::Tan]
        .into_iter()
        .find(|f| cmd.contains(f.name()))
}

/// First run of digits, read as degrees.
pub fn extract_angle(cmd: &str) -> Option<f64> {
    first_capture(r"(\d+)", cmd)?.parse().ok()
}

pub fn extract_matrix_a(cmd: &str) -> Option<Array2<f64>> {
    extract_matrix(r"matrix A is (\[\[.*?\]\])", cmd)
}

pub fn extract_matrix_b(cmd: &str) -> Option<Array2<f64>> {
    extract_matrix(r"matrix B is (\[\[.*?\]\])", cmd)
}

fn extract_matrix(pattern: &str, cmd: &str) -> Option<Array2<f64>> {
    let literal = first_capture(pattern, cmd)?;
    match parse_matrix(literal) {
        Ok(m) => Some(m),
        Err(e) => {
            debug!(literal, error = %e, "rejected matrix literal");
            None
        }
    }
}

/// `add` → `subtract` → `multiply`.
pub fn extract_matrix_operation(cmd: &str) -> Option<BinaryOp> {
    BinaryOp::ALL[..3].iter().copied().find(|op| cmd.contains(op.name()))
}

/// `add` → `subtract` → `multiply` → `divide`.
pub fn extract_complex_operation(cmd: &str) -> Option<BinaryOp> {
    BinaryOp::ALL.into_iter().find(|op| cmd.contains(op.name()))
}

/// The first two complex literals such as `1+2j` or `-0.5-j`.
pub fn extract_complex_numbers(cmd: &str) -> [Option<Complex64>; 2] {
    let Ok(re) = Regex::new(r"[-+]?\d*\.?\d*[-+]\d*\.?\d*j") else {
        return [None, None];
    };
    let mut found = re.find_iter(cmd).map(|m| parse_complex(m.as_str()));
    [found.next().flatten(), found.next().flatten()]
}

pub fn extract_units(cmd: &str) -> Option<UnitQuery> {
    let re = Regex::new(r"convert (\d+) (\w+) to (\w+)").ok()?;
    let caps = re.captures(cmd)?;
    Some(UnitQuery {
        value: caps[1].parse().ok()?,
        from: caps[2].to_string(),
        to: caps[3].to_string(),
    })
}

/// Raw expression text after `plot `, without any trailing range.
pub fn plot_request_text(cmd: &str) -> Option<&str> {
    let re = Regex::new(r"plot (.+?)(?: from -?\d+\.?\d* to -?\d+\.?\d*)?\s*$").ok()?;
    Some(re.captures(cmd)?.get(1)?.as_str())
}

pub fn extract_plot_request(cmd: &str) -> Option<PlotRequest> {
    let expr = parse_logged(plot_request_text(cmd)?)?;
    let range = Regex::new(r"plot .+? from (-?\d+\.?\d*) to (-?\d+\.?\d*)\s*$")
        .ok()
        .and_then(|re| {
            let caps = re.captures(cmd)?;
            Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
        })
        .unwrap_or(DEFAULT_PLOT_RANGE);
    Some(PlotRequest { expr, range })
}

/// Parse `a±bj`. An empty real part is zero and a bare `j` is one.
pub fn parse_complex(text: &str) -> Option<Complex64> {
    let body = text.trim().strip_suffix('j')?;
    let split = body.rfind(['+', '-'])?;
    let (re_part, im_part) = body.split_at(split);

    let re = match re_part {
        "" | "+" => 0.0,
        s => s.parse().ok()?,
    };
    let im = match im_part {
        "+" => 1.0,
        "-" => -1.0,
        s => s.parse().ok()?,
    };
    Some(Complex64::new(re, im))
}

/// Parse a nested list literal like `[[1, 2], [3.5, -4]]` into a matrix.
/// Rows must be non-empty and equally long; nothing but numbers, brackets,
/// commas and whitespace is accepted.
pub fn parse_matrix(text: &str) -> Result<Array2<f64>, ParseError> {
    let mut cursor = MatrixCursor { text, pos: 0 };
    let rows = cursor.list(|c| c.list(MatrixCursor::number))?;
    cursor.skip_ws();
    if cursor.pos != text.len() {
        return Err(ParseError::Matrix(format!(
            "trailing text at position {}",
            cursor.pos + 1
        )));
    }

    let ncols = rows.first().map_or(0, Vec::len);
    if rows.is_empty() || ncols == 0 {
        return Err(ParseError::Matrix("matrix has no entries".into()));
    }
    if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
        return Err(ParseError::Matrix(format!(
            "row {} has {} entries, expected {ncols}",
            bad + 1,
            rows[bad].len()
        )));
    }

    let nrows = rows.len();
    Array2::from_shape_vec((nrows, ncols), rows.into_iter().flatten().collect())
        .map_err(|e| ParseError::Matrix(e.to_string()))
}

struct MatrixCursor<'a> {
    text: &'a str,
    pos: usize,
}

impl MatrixCursor<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), ParseError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(ParseError::UnexpectedChar { ch: c, pos: self.pos }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    /// `[item, item, ...]`
    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Vec<T>, ParseError> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(c) => return Err(ParseError::UnexpectedChar { ch: c, pos: self.pos }),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        self.skip_ws();
        let start = self.pos;
        let rest = &self.text[start..];
        let len = rest
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .unwrap_or(rest.len());
        self.pos += len;
        let token = &rest[..len];
        if token.is_empty() {
            return match self.peek() {
                Some(c) => Err(ParseError::UnexpectedChar { ch: c, pos: start }),
                None => Err(ParseError::UnexpectedEnd),
            };
        }
        token
            .parse()
            .map_err(|_| ParseError::InvalidNumber(token.to_string()))
    }
}

/// Everything the extractors can find in one command.
#[derive(Debug, Clone, Default)]
pub struct ExtractedParameters {
    pub numbers: Vec<f64>,
    pub operation: Option<BinaryOp>,
    pub equation: Option<Expr>,
    pub expression: Option<Expr>,
    pub trig_function: Option<TrigFunction>,
    pub angle: Option<f64>,
    pub matrix_a: Option<Array2<f64>>,
    pub matrix_b: Option<Array2<f64>>,
    pub complex_numbers: [Option<Complex64>; 2],
    pub units: Option<UnitQuery>,
    pub plot: Option<PlotRequest>,
}

impl ExtractedParameters {
    pub fn from_command(cmd: &str) -> Self {
        Self {
            numbers: extract_numbers(cmd),
            operation: extract_operation(cmd),
            equation: extract_equation(cmd),
            expression: extract_expression(cmd),
            trig_function: extract_trig_function(cmd),
            angle: extract_angle(cmd),
            matrix_a: extract_matrix_a(cmd),
            matrix_b: extract_matrix_b(cmd),
            complex_numbers: extract_complex_numbers(cmd),
            units: extract_units(cmd),
            plot: extract_plot_request(cmd),
        }
    }
}

fn show<T>(v: &Option<T>, f: impl Fn(&T) -> String) -> String {
    v.as_ref().map_or_else(|| "-".to_string(), f)
}

impl fmt::Display for ExtractedParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self.numbers.iter().map(|n| format_number(*n)).collect();
        writeln!(f, "numbers:        [{}]", numbers.join(", "))?;
        writeln!(f, "operation:      {}", show(&self.operation, |o| o.to_string()))?;
        writeln!(f, "equation:       {}", show(&self.equation, |e| e.to_string()))?;
        writeln!(f, "expression:     {}", show(&self.expression, |e| e.to_string()))?;
        writeln!(f, "trig function:  {}", show(&self.trig_function, |t| t.to_string()))?;
        writeln!(f, "angle:          {}", show(&self.angle, |a| format_number(*a)))?;
        writeln!(f, "matrix A:       {}", show(&self.matrix_a, format_matrix))?;
        writeln!(f, "matrix B:       {}", show(&self.matrix_b, format_matrix))?;
        let [c1, c2] = &self.complex_numbers;
        writeln!(
            f,
            "complex:        {}, {}",
            show(c1, |c| format_complex(*c)),
            show(c2, |c| format_complex(*c))
        )?;
        writeln!(
            f,
            "units:          {}",
            show(&self.units, |u| format!("{} {} -> {}", format_number(u.value), u.from, u.to))
        )?;
        write!(
            f,
            "plot:           {}",
            show(&self.plot, |p| format!(
                "{} on [{}, {}]",
                p.expr,
                format_number(p.range.0),
                format_number(p.range.1)
            ))
        )
    }
}
