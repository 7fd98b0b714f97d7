use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use ndarray::Array2;
use num_complex::Complex64;
use tracing::debug;

use crate::calculus::{differentiate, integrate};
use crate::error::{MathError, MathResult};
use crate::expr::{self, format_number, Expr};
use crate::extract::{self, UnitQuery, DEFAULT_PLOT_RANGE};
use crate::ops::{self, format_complex, format_matrix, Statistics};
use crate::plot::plot_function;
use crate::solve::solve_equation;

/// Operations the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOperation {
    Arithmetic,
    Solve,
    Trigonometry,
    Differentiate,
    Integrate,
    Factorial,
    Fibonacci,
    Matrix,
    Complex,
    Statistics,
    Convert,
    Plot,
}

impl MathOperation {
    pub const ALL: [MathOperation; 12] = [
        Self::Arithmetic,
        Self::Solve,
        Self::Trigonometry,
        Self::Differentiate,
        Self::Integrate,
        Self::Factorial,
        Self::Fibonacci,
        Self::Matrix,
        Self::Complex,
        Self::Statistics,
        Self::Convert,
        Self::Plot,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Arithmetic => "arithmetic",
            Self::Solve => "solve",
            Self::Trigonometry => "trigonometry",
            Self::Differentiate => "differentiate",
            Self::Integrate => "integrate",
            Self::Factorial => "factorial",
            Self::Fibonacci => "fibonacci",
            Self::Matrix => "matrix",
            Self::Complex => "complex",
            Self::Statistics => "statistics",
            Self::Convert => "convert",
            Self::Plot => "plot",
        }
    }

    /// Guess the operation from keywords in `cmd`. Checked in a fixed order
    /// so a command mentioning several keywords always routes the same way.
    pub fn infer(cmd: &str) -> Option<Self> {
        let has = |word: &str| cmd.contains(word);

        let op = if has("solve") {
            Self::Solve
        } else if has("differentiate") || has("derivative") {
            Self::Differentiate
        } else if has("integrate") {
            Self::Integrate
        } else if has("convert") {
            Self::Convert
        } else if has("matrix A is") {
            Self::Matrix
        } else if has("factorial") {
            Self::Factorial
        } else if has("fibonacci") {
            Self::Fibonacci
        } else if has("plot ") {
            Self::Plot
        } else if has("complex") {
            Self::Complex
        } else if ["mean", "median", "statistics", "stats"].iter().any(|w| has(w)) {
            Self::Statistics
        } else if extract::extract_trig_function(cmd).is_some() {
            Self::Trigonometry
        } else if extract::extract_operation(cmd).is_some() {
            Self::Arithmetic
        } else {
            return None;
        };
        Some(op)
    }
}

impl fmt::Display for MathOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MathOperation {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trig" => Ok(Self::Trigonometry),
            "stats" => Ok(Self::Statistics),
            _ => Self::ALL
                .into_iter()
                .find(|op| op.name() == s)
                .ok_or_else(|| MathError::InvalidOperation(s.to_string())),
        }
    }
}

/// Result of a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum MathOutput {
    Number(f64),
    Integer(u128),
    Sequence(Vec<u128>),
    Roots(Vec<Complex64>),
    Expression(Expr),
    Matrix(Array2<f64>),
    Complex(Complex64),
    Statistics(Statistics),
    Plot(PathBuf),
}

fn format_root(z: &Complex64) -> String {
    if z.im == 0.0 {
        format_number(z.re)
    } else {
        format_complex(*z)
    }
}

impl fmt::Display for MathOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Sequence(seq) => {
                let items: Vec<String> = seq.iter().map(u128::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Self::Roots(roots) => {
                let items: Vec<String> = roots.iter().map(format_root).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Self::Expression(e) => write!(f, "{e}"),
            Self::Matrix(m) => write!(f, "{}", format_matrix(m)),
            Self::Complex(z) => write!(f, "{}", format_complex(*z)),
            Self::Statistics(s) => write!(f, "{s}"),
            Self::Plot(path) => write!(f, "Plot saved to {}", path.display()),
        }
    }
}

/// Runs one operation against the parameters extracted from a command.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    plot_dir: PathBuf,
}

impl Dispatcher {
    /// `plot_dir` receives the SVG files written by [`MathOperation::Plot`].
    pub fn new(plot_dir: impl Into<PathBuf>) -> Self {
        Self {
            plot_dir: plot_dir.into(),
        }
    }

    pub fn dispatch(&self, op: MathOperation, cmd: &str) -> MathResult<MathOutput> {
        debug!(%op, cmd, "dispatching");
        match op {
            MathOperation::Arithmetic => {
                let (a, b) = two_numbers(cmd)?;
                let bin = extract::extract_operation(cmd)
                    .ok_or(MathError::MissingParameter("an arithmetic operation"))?;
                ops::basic_arithmetic(bin, a, b).map(MathOutput::Number)
            }
            MathOperation::Solve => {
                let text = extract::equation_text(cmd)
                    .ok_or(MathError::MissingParameter("an equation after 'solve'"))?;
                solve_equation(&expr::parse(text)?).map(MathOutput::Roots)
            }
            MathOperation::Trigonometry => {
                let func = extract::extract_trig_function(cmd)
                    .ok_or(MathError::MissingParameter("sin, cos or tan"))?;
                let angle = extract::extract_angle(cmd).ok_or(MathError::MissingParameter("an angle"))?;
                ops::trigonometric_function(func, angle).map(MathOutput::Number)
            }
            MathOperation::Differentiate => {
                let e = expression(cmd)?;
                Ok(MathOutput::Expression(differentiate(&e)))
            }
            MathOperation::Integrate => integrate(&expression(cmd)?).map(MathOutput::Expression),
            MathOperation::Factorial => {
                ops::factorial(whole_number(cmd)?).map(MathOutput::Integer)
            }
            MathOperation::Fibonacci => {
                ops::fibonacci(whole_number(cmd)?).map(MathOutput::Sequence)
            }
            MathOperation::Matrix => {
                let a = extract::extract_matrix_a(cmd).ok_or(MathError::MissingParameter("matrix A"))?;
                let b = extract::extract_matrix_b(cmd).ok_or(MathError::MissingParameter("matrix B"))?;
                let bin = extract::extract_matrix_operation(cmd)
                    .ok_or(MathError::MissingParameter("a matrix operation"))?;
                ops::matrix_operations(&a, &b, bin).map(MathOutput::Matrix)
            }
            MathOperation::Complex => {
                let [a, b] = extract::extract_complex_numbers(cmd);
                let (a, b) = a
                    .zip(b)
                    .ok_or(MathError::MissingParameter("two complex numbers"))?;
                let bin = extract::extract_complex_operation(cmd)
                    .ok_or(MathError::MissingParameter("a complex operation"))?;
                ops::complex_operations(bin, a, b).map(MathOutput::Complex)
            }
            MathOperation::Statistics => {
                ops::statistical_analysis(&extract::extract_numbers(cmd)).map(MathOutput::Statistics)
            }
            MathOperation::Convert => {
                let UnitQuery { value, from, to } =
                    extract::extract_units(cmd).ok_or(MathError::MissingParameter("a unit conversion"))?;
                ops::unit_conversion(value, &from, &to).map(MathOutput::Number)
            }
            MathOperation::Plot => {
                let text = extract::plot_request_text(cmd)
                    .ok_or(MathError::MissingParameter("an expression after 'plot'"))?;
                let e = expr::parse(text)?;
                let range = extract::extract_plot_request(cmd)
                    .map(|req| req.range)
                    .unwrap_or(DEFAULT_PLOT_RANGE);
                plot_function(&e, range, &self.plot_dir).map(MathOutput::Plot)
            }
        }
    }
}

fn two_numbers(cmd: &str) -> MathResult<(f64, f64)> {
    match extract::extract_numbers(cmd)[..] {
        [a, b, ..] => Ok((a, b)),
        _ => Err(MathError::MissingParameter("two numbers")),
    }
}

fn whole_number(cmd: &str) -> MathResult<i64> {
    let n = *extract::extract_numbers(cmd)
        .first()
        .ok_or(MathError::MissingParameter("a number"))?;
    if n.fract() != 0.0 || n.abs() > i64::MAX as f64 {
        return Err(MathError::NotAnInteger(n));
    }
    Ok(n as i64)
}

fn expression(cmd: &str) -> MathResult<Expr> {
    let text = extract::expression_text(cmd)
        .ok_or(MathError::MissingParameter("an expression to differentiate or integrate"))?;
    Ok(expr::parse(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    fn run(cmd: &str) -> MathResult<MathOutput> {
        let op = MathOperation::infer(cmd).expect("operation inferred");
        Dispatcher::new(std::env::temp_dir()).dispatch(op, cmd)
    }

    fn show(cmd: &str) -> String {
        run(cmd).unwrap().to_string()
    }

    #[test]
    fn test_infer_routes_by_keyword() {
        assert_eq!(MathOperation::infer("solve x**2 - 4"), Some(MathOperation::Solve));
        assert_eq!(MathOperation::infer("integrate x"), Some(MathOperation::Integrate));
        assert_eq!(MathOperation::infer("convert 10 meters to feet"), Some(MathOperation::Convert));
        assert_eq!(MathOperation::infer("sin of 30"), Some(MathOperation::Trigonometry));
        assert_eq!(MathOperation::infer("add 2 and 3"), Some(MathOperation::Arithmetic));
        assert_eq!(MathOperation::infer("mean of 1 2 3"), Some(MathOperation::Statistics));
        assert_eq!(MathOperation::infer("hello there"), None);
        // "solve" outranks the trig keyword inside the equation
        assert_eq!(MathOperation::infer("solve sin(x)"), Some(MathOperation::Solve));
    }

    #[test]
    fn test_operation_names() {
        for op in MathOperation::ALL {
            assert_eq!(op.name().parse::<MathOperation>().unwrap(), op);
        }
        assert_eq!("trig".parse::<MathOperation>().unwrap(), MathOperation::Trigonometry);
        assert!("teleport".parse::<MathOperation>().is_err());
    }

    #[test]
    fn test_dispatch_numeric_operations() {
        assert_eq!(show("add 2 and 3"), "5");
        assert_eq!(show("divide 7 by 2"), "3.5");
        assert_eq!(show("factorial of 5"), "120");
        assert_eq!(show("fibonacci 5"), "[0, 1, 1, 2, 3]");
        assert_eq!(show("convert 10 meters to feet"), "32.8084");
        assert_eq!(show("complex 1+2j and 3+4j, add them"), "(4+6j)");
    }

    #[test]
    fn test_dispatch_symbolic_operations() {
        assert_eq!(show("solve x**2 - 4"), "[-2, 2]");
        assert_eq!(show("solve x**2 + 1"), "[-1j, 1j]");
        assert_eq!(show("differentiate x**3 + 2*x"), "3*x**2 + 2");
        assert_eq!(show("integrate x**2"), "x**3/3");
    }

    #[test]
    fn test_dispatch_matrix() {
        let cmd = "matrix A is [[1, 2], [3, 4]] and matrix B is [[5, 6], [7, 8]], multiply them";
        assert_eq!(show(cmd), "[[19, 22], [43, 50]]");
    }

    #[test]
    fn test_dispatch_errors() {
        assert!(matches!(run("divide 5 by 0"), Err(MathError::DivideByZero)));
        assert!(matches!(run("factorial of -1"), Err(MathError::NegativeFactorial)));
        assert!(matches!(run("factorial of 2.5"), Err(MathError::NotAnInteger(_))));
        assert!(matches!(run("fibonacci 0"), Err(MathError::NonPositiveLength)));
        assert!(matches!(run("add 2"), Err(MathError::MissingParameter("two numbers"))));
        assert!(matches!(run("solve 2x"), Err(MathError::Parse(_))));
        assert!(matches!(
            run("convert 3 feet to parsecs"),
            Err(MathError::UnsupportedConversion { .. })
        ));

        let d = Dispatcher::new(std::env::temp_dir());
        assert!(matches!(
            d.dispatch(MathOperation::Complex, "complex add 1+2j"),
            Err(MathError::MissingParameter("two complex numbers"))
        ));
        assert!(matches!(
            d.dispatch(MathOperation::Matrix, "matrix A is [[1]] add"),
            Err(MathError::MissingParameter("matrix B"))
        ));
    }

    #[test]
    fn test_deeply_nested_input_is_a_parse_error() {
        let d = Dispatcher::new(std::env::temp_dir());
        let cmd = format!("solve {}x{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(
            d.dispatch(MathOperation::Solve, &cmd),
            Err(MathError::Parse(ParseError::TooDeep))
        ));

        let cmd = format!("differentiate {}", vec!["x"; 100_000].join(" + "));
        assert!(matches!(
            d.dispatch(MathOperation::Differentiate, &cmd),
            Err(MathError::Parse(ParseError::TooLong(_)))
        ));
    }

    #[test]
    fn test_dispatch_plot() {
        let dir = tempfile::tempdir().unwrap();
        let out = Dispatcher::new(dir.path())
            .dispatch(MathOperation::Plot, "plot sin(x) from -3 to 3")
            .unwrap();
        let MathOutput::Plot(path) = &out else {
            panic!("expected a plot, got {out:?}");
        };
        assert!(path.exists());
        assert!(out.to_string().starts_with("Plot saved to "));

        // no range given: the default window is used
        let out = Dispatcher::new(dir.path())
            .dispatch(MathOperation::Plot, "plot x**2")
            .unwrap();
        assert!(matches!(out, MathOutput::Plot(ref p) if p.exists()));
    }

    #[test]
    fn test_statistics_output() {
        let shown = show("mean of 1 2 3 4");
        assert!(shown.starts_with("mean: 2.5\nmedian: 2.5\n"));
    }
}
