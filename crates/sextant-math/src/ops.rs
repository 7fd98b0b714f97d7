//! Numeric operations: arithmetic, trigonometry, sequences, matrices,
//! complex numbers, descriptive statistics and unit conversion.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::error::{MathError, MathResult};
use crate::expr::format_number;

/// The four arithmetic operations shared by numbers, matrices and complex
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 4] = [Self::Add, Self::Subtract, Self::Multiply, Self::Divide];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BinaryOp {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| MathError::InvalidOperation(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrigFunction {
    Sin,
    Cos,
    Tan,
}

impl TrigFunction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
        }
    }
}

impl fmt::Display for TrigFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrigFunction {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sin" => Ok(Self::Sin),
            "cos" => Ok(Self::Cos),
            "tan" => Ok(Self::Tan),
            other => Err(MathError::InvalidOperation(format!(
                "unknown trigonometric function '{other}'"
            ))),
        }
    }
}

pub fn basic_arithmetic(op: BinaryOp, a: f64, b: f64) -> MathResult<f64> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Subtract => Ok(a - b),
        BinaryOp::Multiply => Ok(a * b),
        BinaryOp::Divide if b == 0.0 => Err(MathError::DivideByZero),
        BinaryOp::Divide => Ok(a / b),
    }
}

/// `func` of an angle given in degrees.
pub fn trigonometric_function(func: TrigFunction, degrees: f64) -> MathResult<f64> {
    let radians = degrees.to_radians();
    Ok(match func {
        TrigFunction::Sin => radians.sin(),
        TrigFunction::Cos => radians.cos(),
        TrigFunction::Tan => radians.tan(),
    })
}

pub fn factorial(n: i64) -> MathResult<u128> {
    if n < 0 {
        return Err(MathError::NegativeFactorial);
    }
    (1..=n as u128).try_fold(1u128, |acc, k| acc.checked_mul(k).ok_or(MathError::Overflow(n)))
}

/// The first `n` Fibonacci numbers, starting `0, 1`.
pub fn fibonacci(n: i64) -> MathResult<Vec<u128>> {
    if n <= 0 {
        return Err(MathError::NonPositiveLength);
    }
    let len = n as usize;
    let mut seq: Vec<u128> = vec![0, 1];
    while seq.len() < len {
        let next = seq[seq.len() - 1]
            .checked_add(seq[seq.len() - 2])
            .ok_or(MathError::Overflow(n))?;
        seq.push(next);
    }
    seq.truncate(len);
    Ok(seq)
}

/// Element-wise sum or difference, or the matrix product.
pub fn matrix_operations(a: &Array2<f64>, b: &Array2<f64>, op: BinaryOp) -> MathResult<Array2<f64>> {
    let same_shape = || {
        if a.shape() == b.shape() {
            Ok(())
        } else {
            Err(MathError::ShapeMismatch(format!(
                "cannot {op} a {}x{} matrix and a {}x{} matrix",
                a.nrows(),
                a.ncols(),
                b.nrows(),
                b.ncols()
            )))
        }
    };

    match op {
        BinaryOp::Add => same_shape().map(|_| a + b),
        BinaryOp::Subtract => same_shape().map(|_| a - b),
        BinaryOp::Multiply => {
            if a.ncols() != b.nrows() {
                return Err(MathError::ShapeMismatch(format!(
                    "cannot multiply a {}x{} matrix by a {}x{} matrix",
                    a.nrows(),
                    a.ncols(),
                    b.nrows(),
                    b.ncols()
                )));
            }
            Ok(a.dot(b))
        }
        BinaryOp::Divide => Err(MathError::InvalidOperation("divide is not a matrix operation".into())),
    }
}

pub fn complex_operations(op: BinaryOp, a: Complex64, b: Complex64) -> MathResult<Complex64> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Subtract => Ok(a - b),
        BinaryOp::Multiply => Ok(a * b),
        BinaryOp::Divide if b == Complex64::new(0.0, 0.0) => Err(MathError::DivideByZero),
        BinaryOp::Divide => Ok(a / b),
    }
}

/// `(4+6j)`, `-2j`, `(1.5-0.5j)`.
pub fn format_complex(z: Complex64) -> String {
    let im = format_number(z.im.abs());
    if z.re == 0.0 {
        let sign = if z.im.is_sign_negative() { "-" } else { "" };
        return format!("{sign}{im}j");
    }
    let sign = if z.im.is_sign_negative() { '-' } else { '+' };
    format!("({}{sign}{im}j)", format_number(z.re))
}

/// `[[1, 2], [3, 4]]`
pub fn format_matrix(m: &Array2<f64>) -> String {
    let rows: Vec<String> = m
        .rows()
        .into_iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| format_number(*v)).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", rows.join(", "))
}

/// Descriptive statistics of a sample plus a least-squares line through
/// `(index, value)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub correlation: Option<f64>,
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt(v: Option<f64>) -> String {
            v.map_or_else(|| "None".to_string(), |v| v.to_string())
        }
        writeln!(f, "mean: {}", self.mean)?;
        writeln!(f, "median: {}", self.median)?;
        writeln!(f, "std_dev: {}", self.std_dev)?;
        writeln!(f, "variance: {}", self.variance)?;
        writeln!(f, "correlation: {}", opt(self.correlation))?;
        writeln!(f, "slope: {}", opt(self.slope))?;
        write!(f, "intercept: {}", opt(self.intercept))
    }
}

/// Mean, median and population spread of `data`. The regression and the
/// correlation need at least two points; correlation is also undefined for
/// constant data.
pub fn statistical_analysis(data: &[f64]) -> MathResult<Statistics> {
    let values = Array1::from(data.to_vec());
    let mean = values.mean().ok_or(MathError::EmptyData)?;
    let variance = values.var(0.0);

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let (mut correlation, mut slope, mut intercept) = (None, None, None);
    if data.len() > 1 {
        let index = Array1::from_iter((0..data.len()).map(|i| i as f64));
        let index_mean = (data.len() - 1) as f64 / 2.0;
        let cov = (&index - index_mean).dot(&(&values - mean)) / data.len() as f64;
        let index_var = index.var(0.0);

        let m = cov / index_var;
        slope = Some(m);
        intercept = Some(mean - m * index_mean);
        if variance > 0.0 {
            correlation = Some(cov / (index_var * variance).sqrt());
        }
    }

    Ok(Statistics {
        mean,
        median,
        std_dev: variance.sqrt(),
        variance,
        correlation,
        slope,
        intercept,
    })
}

const METERS_TO_FEET: f64 = 3.28084;
const KILOGRAMS_TO_POUNDS: f64 = 2.20462;
const KILOMETERS_TO_MILES: f64 = 0.621371;
const CENTIMETERS_TO_INCHES: f64 = 0.393701;
const LITERS_TO_GALLONS: f64 = 0.264172;

const CONVERSIONS: &[(&str, f64)] = &[
    ("meters_to_feet", METERS_TO_FEET),
    ("feet_to_meters", 1.0 / METERS_TO_FEET),
    ("kilograms_to_pounds", KILOGRAMS_TO_POUNDS),
    ("pounds_to_kilograms", 1.0 / KILOGRAMS_TO_POUNDS),
    ("kilometers_to_miles", KILOMETERS_TO_MILES),
    ("miles_to_kilometers", 1.0 / KILOMETERS_TO_MILES),
    ("centimeters_to_inches", CENTIMETERS_TO_INCHES),
    ("inches_to_centimeters", 1.0 / CENTIMETERS_TO_INCHES),
    ("liters_to_gallons", LITERS_TO_GALLONS),
    ("gallons_to_liters", 1.0 / LITERS_TO_GALLONS),
];

/// Multiply `value` by the factor for `{from}_to_{to}`. Unit names match
/// exactly as written in the table.
pub fn unit_conversion(value: f64, from: &str, to: &str) -> MathResult<f64> {
    let key = format!("{from}_to_{to}");
    CONVERSIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, factor)| value * factor)
        .ok_or_else(|| MathError::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_basic_arithmetic() {
        assert_eq!(basic_arithmetic(BinaryOp::Add, 2.0, 3.0).unwrap(), 5.0);
        assert_eq!(basic_arithmetic(BinaryOp::Subtract, 2.0, 3.0).unwrap(), -1.0);
        assert_eq!(basic_arithmetic(BinaryOp::Multiply, 2.0, 3.0).unwrap(), 6.0);
        assert_eq!(basic_arithmetic(BinaryOp::Divide, 3.0, 2.0).unwrap(), 1.5);
    }

    #[test]
    fn test_divide_by_zero_is_error_not_infinity() {
        let err = basic_arithmetic(BinaryOp::Divide, 5.0, 0.0).unwrap_err();
        assert!(matches!(err, MathError::DivideByZero));
        assert_eq!(err.to_string(), "Cannot divide by zero");
    }

    #[test]
    fn test_binary_op_names() {
        assert_eq!("multiply".parse::<BinaryOp>().unwrap(), BinaryOp::Multiply);
        assert!("modulo".parse::<BinaryOp>().is_err());
        assert_eq!(BinaryOp::Divide.to_string(), "divide");
    }

    #[test]
    fn test_trigonometry_in_degrees() {
        assert!((trigonometric_function(TrigFunction::Sin, 30.0).unwrap() - 0.5).abs() < 1e-12);
        assert!((trigonometric_function(TrigFunction::Cos, 60.0).unwrap() - 0.5).abs() < 1e-12);
        assert!((trigonometric_function(TrigFunction::Tan, 45.0).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0).unwrap(), 1);
        assert_eq!(factorial(5).unwrap(), 120);
        assert_eq!(factorial(34).unwrap(), 295_232_799_039_604_140_847_618_609_643_520_000_000);
        assert!(matches!(factorial(35), Err(MathError::Overflow(35))));
    }

    #[test]
    fn test_negative_factorial_has_its_own_error() {
        let err = factorial(-1).unwrap_err();
        assert!(matches!(err, MathError::NegativeFactorial));
        assert_eq!(err.to_string(), "Negative numbers do not have a factorial.");
    }

    #[test]
    fn test_fibonacci() {
        assert_eq!(fibonacci(5).unwrap(), vec![0, 1, 1, 2, 3]);
        assert_eq!(fibonacci(1).unwrap(), vec![0]);
        assert_eq!(fibonacci(2).unwrap(), vec![0, 1]);
        assert!(matches!(fibonacci(0), Err(MathError::NonPositiveLength)));
        assert!(matches!(fibonacci(-3), Err(MathError::NonPositiveLength)));
        assert!(matches!(fibonacci(500), Err(MathError::Overflow(500))));
    }

    #[test]
    fn test_matrix_operations() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[5.0, 6.0], [7.0, 8.0]];
        assert_eq!(
            matrix_operations(&a, &b, BinaryOp::Add).unwrap(),
            array![[6.0, 8.0], [10.0, 12.0]]
        );
        assert_eq!(
            matrix_operations(&a, &b, BinaryOp::Subtract).unwrap(),
            array![[-4.0, -4.0], [-4.0, -4.0]]
        );
        assert_eq!(
            matrix_operations(&a, &b, BinaryOp::Multiply).unwrap(),
            array![[19.0, 22.0], [43.0, 50.0]]
        );
    }

    #[test]
    fn test_matrix_shape_errors() {
        let a = array![[1.0, 2.0, 3.0]];
        let b = array![[1.0], [2.0], [3.0]];
        assert!(matches!(
            matrix_operations(&a, &b, BinaryOp::Add),
            Err(MathError::ShapeMismatch(_))
        ));
        assert_eq!(matrix_operations(&a, &b, BinaryOp::Multiply).unwrap(), array![[14.0]]);
        assert!(matches!(
            matrix_operations(&a, &a, BinaryOp::Multiply),
            Err(MathError::ShapeMismatch(_))
        ));
        assert!(matches!(
            matrix_operations(&a, &a, BinaryOp::Divide),
            Err(MathError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_complex_operations() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, 4.0);
        assert_eq!(complex_operations(BinaryOp::Add, a, b).unwrap(), Complex64::new(4.0, 6.0));
        assert_eq!(complex_operations(BinaryOp::Multiply, a, b).unwrap(), Complex64::new(-5.0, 10.0));
        assert!(matches!(
            complex_operations(BinaryOp::Divide, a, Complex64::new(0.0, 0.0)),
            Err(MathError::DivideByZero)
        ));
    }

    #[test]
    fn test_format_complex() {
        assert_eq!(format_complex(Complex64::new(4.0, 6.0)), "(4+6j)");
        assert_eq!(format_complex(Complex64::new(-2.0, -2.0)), "(-2-2j)");
        assert_eq!(format_complex(Complex64::new(0.0, 2.0)), "2j");
        assert_eq!(format_complex(Complex64::new(1.5, 0.0)), "(1.5+0j)");
    }

    #[test]
    fn test_format_matrix() {
        assert_eq!(format_matrix(&array![[1.0, 2.5], [-3.0, 4.0]]), "[[1, 2.5], [-3, 4]]");
        assert_eq!(format_matrix(&array![[7.0]]), "[[7]]");
    }

    #[test]
    fn test_statistics() {
        let stats = statistical_analysis(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.variance, 1.25);
        assert!((stats.correlation.unwrap() - 1.0).abs() < 1e-12);
        assert!((stats.slope.unwrap() - 1.0).abs() < 1e-12);
        assert!((stats.intercept.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_degenerate_inputs() {
        let single = statistical_analysis(&[7.0]).unwrap();
        assert_eq!(single.median, 7.0);
        assert_eq!(single.std_dev, 0.0);
        assert_eq!(single.correlation, None);
        assert_eq!(single.slope, None);

        let flat = statistical_analysis(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(flat.correlation, None);
        assert_eq!(flat.slope, Some(0.0));

        assert!(matches!(statistical_analysis(&[]), Err(MathError::EmptyData)));
    }

    #[test]
    fn test_unit_conversion() {
        let feet = unit_conversion(10.0, "meters", "feet").unwrap();
        assert!((feet - 32.8084).abs() < 1e-9);
        let meters = unit_conversion(feet, "feet", "meters").unwrap();
        assert!((meters - 10.0).abs() < 1e-9);
        assert!((unit_conversion(5.0, "kilometers", "miles").unwrap() - 3.106855).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_conversion() {
        let err = unit_conversion(1.0, "feet", "parsecs").unwrap_err();
        assert_eq!(err.to_string(), "Conversion not supported: feet to parsecs");
    }
}
