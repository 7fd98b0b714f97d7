use super::{Expr, VAR};

const MAX_DEGREE: usize = 64;
const ZERO_TOL: f64 = 1e-12;

/// Dense polynomial in `x`, lowest power first.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Polynomial {
    pub coeffs: Vec<f64>,
}

impl Polynomial {
    fn constant(c: f64) -> Self {
        Self { coeffs: vec![c] }
    }

    /// Degree after dropping negligible leading terms; the zero polynomial
    /// reports 0.
    pub fn degree(&self) -> usize {
        self.trimmed().len().saturating_sub(1)
    }

    /// Coefficients without (near-)zero leading terms.
    pub fn trimmed(&self) -> &[f64] {
        let mut end = self.coeffs.len();
        while end > 1 && self.coeffs[end - 1].abs() < ZERO_TOL {
            end -= 1;
        }
        &self.coeffs[..end]
    }

    fn as_constant(&self) -> Option<f64> {
        (self.degree() == 0).then(|| self.coeffs.first().copied().unwrap_or(0.0))
    }

    fn add(&self, other: &Self) -> Self {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|i| {
                self.coeffs.get(i).copied().unwrap_or(0.0) + other.coeffs.get(i).copied().unwrap_or(0.0)
            })
            .collect();
        Self { coeffs }
    }

    fn scale(&self, k: f64) -> Self {
        Self {
            coeffs: self.coeffs.iter().map(|c| c * k).collect(),
        }
    }

    fn mul(&self, other: &Self) -> Option<Self> {
        let len = self.coeffs.len() + other.coeffs.len() - 1;
        if len > MAX_DEGREE + 1 {
            return None;
        }
        let mut coeffs = vec![0.0; len];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Some(Self { coeffs })
    }

    /// Expand `expr` into a polynomial in `x`. `None` when the expression is
    /// not polynomial (a function of `x`, division by `x`, a non-integer
    /// power) or mentions a free symbol other than `x`.
    pub fn from_expr(expr: &Expr) -> Option<Self> {
        if !expr.depends_on_var() {
            return expr.eval(0.0).ok().filter(|c| c.is_finite()).map(Self::constant);
        }

        match expr {
            Expr::Symbol(s) if s == VAR => Some(Self {
                coeffs: vec![0.0, 1.0],
            }),
            Expr::Neg(e) => Some(Self::from_expr(e)?.scale(-1.0)),
            Expr::Add(a, b) => Some(Self::from_expr(a)?.add(&Self::from_expr(b)?)),
            Expr::Sub(a, b) => Some(Self::from_expr(a)?.add(&Self::from_expr(b)?.scale(-1.0))),
            Expr::Mul(a, b) => Self::from_expr(a)?.mul(&Self::from_expr(b)?),
            Expr::Div(a, b) => {
                let divisor = Self::from_expr(b)?.as_constant()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(Self::from_expr(a)?.scale(1.0 / divisor))
            }
            Expr::Pow(base, exp) => {
                let n = Self::from_expr(exp)?.as_constant()?;
                if n < 0.0 || n.fract() != 0.0 || n as usize > MAX_DEGREE {
                    return None;
                }
                let base = Self::from_expr(base)?;
                let mut acc = Self::constant(1.0);
                for _ in 0..n as usize {
                    acc = acc.mul(&base)?;
                }
                Some(acc)
            }
            _ => None,
        }
    }
}
