//! Root finding for `f(x) = 0`.
//!
//! Polynomials are solved in closed form up to degree two and through the
//! eigenvalues of the companion matrix above that. Anything else falls back
//! to scanning a fixed interval for sign changes and bisecting each one.

use nalgebra::DMatrix;
use num_complex::Complex64;
use tracing::debug;

use crate::error::{MathError, MathResult};
use crate::expr::poly::Polynomial;
use crate::expr::Expr;

const ROOT_TOL: f64 = 1e-9;
const SCAN_RANGE: (f64, f64) = (-100.0, 100.0);
const SCAN_STEPS: usize = 20_000;
const BISECT_ITERS: usize = 100;
/// A bisected "root" whose residual is larger than this was a pole.
const RESIDUAL_TOL: f64 = 1e-6;

/// Distinct roots of `expr` in `x`, real roots first in ascending order.
/// An equation `lhs = rhs` arrives here already rewritten as `lhs - rhs`.
pub fn solve_equation(expr: &Expr) -> MathResult<Vec<Complex64>> {
    let expr = expr.simplify();
    if !expr.depends_on_var() {
        return Ok(Vec::new());
    }

    let mut roots = match Polynomial::from_expr(&expr) {
        Some(poly) => polynomial_roots(poly.trimmed())?,
        None => {
            debug!(%expr, "not a polynomial, scanning numerically");
            scan_roots(&expr)?
        }
    };

    roots = roots.into_iter().map(canonicalize_root).collect();
    roots.sort_by(|a, b| {
        let real_first = (a.im != 0.0).cmp(&(b.im != 0.0));
        real_first
            .then(a.re.total_cmp(&b.re))
            .then(a.im.total_cmp(&b.im))
    });
    roots.dedup_by(|a, b| (*a - *b).norm() <= ROOT_TOL * (1.0 + b.norm()));
    Ok(roots)
}

/// Roots of the polynomial with ascending coefficients `coeffs` (leading
/// coefficient non-zero).
fn polynomial_roots(coeffs: &[f64]) -> MathResult<Vec<Complex64>> {
    match *coeffs {
        [] | [_] => Ok(Vec::new()),
        [b, a] => Ok(vec![Complex64::new(-b / a, 0.0)]),
        [c, b, a] => {
            let disc = Complex64::new(b * b - 4.0 * a * c, 0.0).sqrt();
            let two_a = 2.0 * a;
            Ok(vec![(-b + disc) / two_a, (-b - disc) / two_a])
        }
        _ => companion_roots(coeffs),
    }
}

fn companion_roots(coeffs: &[f64]) -> MathResult<Vec<Complex64>> {
    let degree = coeffs.len() - 1;
    let leading = coeffs[degree];

    let mut companion = DMatrix::<Complex64>::zeros(degree, degree);
    for row in 1..degree {
        companion[(row, row - 1)] = Complex64::new(1.0, 0.0);
    }
    // first row: -c[n-1]/c[n], -c[n-2]/c[n], ..., -c[0]/c[n]
    for column in 0..degree {
        companion[(0, column)] = Complex64::new(-coeffs[degree - 1 - column] / leading, 0.0);
    }

    let eigenvalues = companion.eigenvalues().ok_or_else(|| {
        MathError::NoSolution("eigenvalues of the companion matrix did not converge".into())
    })?;
    Ok(eigenvalues.iter().copied().collect())
}

fn scan_roots(expr: &Expr) -> MathResult<Vec<Complex64>> {
    let (lo, hi) = SCAN_RANGE;
    let step = (hi - lo) / SCAN_STEPS as f64;
    let mut roots = Vec::new();

    let mut prev_x = lo;
    let mut prev_y = expr.eval(lo)?;
    for i in 1..=SCAN_STEPS {
        let x = lo + step * i as f64;
        let y = expr.eval(x)?;
        if prev_y == 0.0 {
            roots.push(prev_x);
        } else if prev_y.is_finite() && y.is_finite() && prev_y.signum() != y.signum() && y != 0.0 {
            if let Some(root) = bisect(expr, prev_x, x)? {
                roots.push(root);
            }
        }
        prev_x = x;
        prev_y = y;
    }
    if prev_y == 0.0 {
        roots.push(prev_x);
    }

    if roots.is_empty() {
        return Err(MathError::NoSolution(format!(
            "no real root of {expr} in [{lo}, {hi}]"
        )));
    }
    Ok(roots.into_iter().map(|r| Complex64::new(r, 0.0)).collect())
}

/// Bisect a bracketed sign change. `None` when the bracket straddles a
/// pole rather than a zero.
fn bisect(expr: &Expr, mut lo: f64, mut hi: f64) -> MathResult<Option<f64>> {
    let mut f_lo = expr.eval(lo)?;
    for _ in 0..BISECT_ITERS {
        let mid = 0.5 * (lo + hi);
        let f_mid = expr.eval(mid)?;
        if f_mid == 0.0 {
            return Ok(Some(mid));
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    let root = 0.5 * (lo + hi);
    let residual = expr.eval(root)?.abs();
    Ok((residual < RESIDUAL_TOL).then_some(root))
}

/// Snap rounding noise: drop tiny imaginary parts, round values that are
/// within tolerance of an integer.
fn canonicalize_root(z: Complex64) -> Complex64 {
    if !z.re.is_finite() || !z.im.is_finite() {
        return z;
    }
    let snap = |v: f64| {
        let r = v.round();
        if (v - r).abs() <= ROOT_TOL * (1.0 + v.abs()) {
            r + 0.0
        } else {
            v
        }
    };
    let mut imag = z.im;
    if imag.abs() <= ROOT_TOL * (1.0 + z.re.abs()) {
        imag = 0.0;
    }
    Complex64::new(snap(z.re), snap(imag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse;

    fn solve(text: &str) -> Vec<Complex64> {
        solve_equation(&parse(text).unwrap()).unwrap()
    }

    fn real(v: f64) -> Complex64 {
        Complex64::new(v, 0.0)
    }

    #[test]
    fn test_quadratic() {
        assert_eq!(solve("x**2 - 4"), vec![real(-2.0), real(2.0)]);
        assert_eq!(solve("x**2 = 9"), vec![real(-3.0), real(3.0)]);
    }

    #[test]
    fn test_linear_and_constant() {
        assert_eq!(solve("2*x + 6"), vec![real(-3.0)]);
        assert!(solve("x - x + 5").is_empty());
    }

    #[test]
    fn test_complex_roots() {
        assert_eq!(
            solve("x**2 + 1"),
            vec![Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0)]
        );
    }

    #[test]
    fn test_repeated_root_reported_once() {
        assert_eq!(solve("(x - 1)**2"), vec![real(1.0)]);
    }

    #[test]
    fn test_cubic_via_companion_matrix() {
        let roots = solve("x**3 - 6*x**2 + 11*x - 6");
        assert_eq!(roots.len(), 3);
        for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0]) {
            assert!((root.re - expected).abs() < 1e-6, "{roots:?}");
            assert!(root.im.abs() < 1e-6);
        }
    }

    #[test]
    fn test_quartic_with_complex_pair() {
        // (x**2 - 1)(x**2 + 4)
        let roots = solve("x**4 + 3*x**2 - 4");
        assert_eq!(roots.len(), 4);
        assert!((roots[0].re + 1.0).abs() < 1e-6 && roots[0].im == 0.0);
        assert!((roots[1].re - 1.0).abs() < 1e-6 && roots[1].im == 0.0);
        assert!((roots[2].im.abs() - 2.0).abs() < 1e-6);
        assert!((roots[3].im.abs() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_numeric_scan() {
        let roots = solve("exp(x) - 2");
        assert_eq!(roots.len(), 1);
        assert!((roots[0].re - 2f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_scan_skips_poles() {
        // 1/x changes sign at 0 without a root
        let err = solve_equation(&parse("1/x").unwrap()).unwrap_err();
        assert!(matches!(err, MathError::NoSolution(_)));
    }
}
